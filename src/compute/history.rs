//! Recorded trajectory of a replication dynamics run.

use serde::{Deserialize, Serialize};

use crate::schema::{PayoffVector, ProbabilityVector, Strategy};

use super::PairwisePayoffs;

/// State recorded for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Period index; 0 is the initial state.
    pub period: usize,
    /// Shares after this period's normalization.
    pub probabilities: ProbabilityVector,
    /// Average payoffs that drove this period's reweighting. For period 0,
    /// the payoffs earned against the initial mixture.
    pub payoffs: PayoffVector,
    /// Per-opponent breakdown of `payoffs`, when recording is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairwise: Option<PairwisePayoffs>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Ran every requested period.
    Completed,
    /// Successive shares moved less than the convergence tolerance.
    Converged,
    /// Cancelled through the propagator's cancel handle.
    Cancelled,
}

/// Full trajectory: period 0 followed by one record per simulated period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationHistory {
    records: Vec<PeriodRecord>,
    stop_reason: StopReason,
    /// Constant adjustment used, or `None` for a per-period shift.
    adjustment: Option<f64>,
}

impl SimulationHistory {
    pub(crate) fn new(initial: PeriodRecord, capacity: usize, adjustment: Option<f64>) -> Self {
        let mut records = Vec::with_capacity(capacity);
        records.push(initial);
        Self {
            records,
            stop_reason: StopReason::Completed,
            adjustment,
        }
    }

    pub(crate) fn push(&mut self, record: PeriodRecord) {
        self.records.push(record);
    }

    pub(crate) fn finish(&mut self, reason: StopReason) {
        self.stop_reason = reason;
    }

    /// Number of recorded states, initial state included.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: the initial state is recorded on construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of simulated periods (initial state excluded).
    #[inline]
    pub fn periods(&self) -> usize {
        self.records.len() - 1
    }

    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    pub fn initial(&self) -> &PeriodRecord {
        &self.records[0]
    }

    pub fn last(&self) -> &PeriodRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn final_probabilities(&self) -> &ProbabilityVector {
        &self.last().probabilities
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn adjustment(&self) -> Option<f64> {
        self.adjustment
    }

    /// Share of `strategy` at every recorded period.
    pub fn probability_series(&self, strategy: Strategy) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.probabilities[strategy])
            .collect()
    }

    /// Average payoff of `strategy` at every recorded period.
    pub fn payoff_series(&self, strategy: Strategy) -> Vec<f64> {
        self.records.iter().map(|r| r.payoffs[strategy]).collect()
    }

    /// Herfindahl index at every recorded period.
    pub fn concentration_series(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.probabilities.herfindahl())
            .collect()
    }

    /// Consume the history, returning its records.
    pub fn into_records(self) -> Vec<PeriodRecord> {
        self.records
    }
}
