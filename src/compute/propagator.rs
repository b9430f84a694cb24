//! Replicator propagator - Main simulation driver for replication dynamics.
//!
//! Each period evaluates average payoffs against the current mixture, scales
//! every share by its shifted payoff and renormalizes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace, warn};

use crate::schema::{
    Adjustment, ConfigError, PayoffMatrix, PayoffVector, ProbabilityVector, STRATEGY_COUNT,
    SimulationConfig, Strategy,
};

use super::{PairwisePayoffs, PeriodRecord, SimulationHistory, StopReason, average_payoffs};

/// Mutable state of a single run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Current population shares.
    pub probabilities: ProbabilityVector,
    /// Periods simulated so far.
    pub period: usize,
}

impl SimulationState {
    pub fn new(initial: ProbabilityVector) -> Self {
        Self {
            probabilities: initial,
            period: 0,
        }
    }

    /// Create the period-0 state described by a configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.initial.generate()?))
    }
}

/// Failure inside a period. The failing period produces no state.
#[derive(Debug, thiserror::Error)]
pub enum ComputationError {
    #[error("Normalization sum at period {period} is zero or not finite ({sum})")]
    DegenerateNormalization { period: usize, sum: f64 },
    #[error("Weight for {strategy} at period {period} is negative ({weight})")]
    NegativeWeight {
        period: usize,
        strategy: Strategy,
        weight: f64,
    },
}

/// Any failure of a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Computation failed: {0}")]
    Computation(#[from] ComputationError),
}

/// Run replication dynamics with a constant payoff adjustment.
///
/// Returns `periods + 1` records, the first being `initial`.
pub fn simulate(
    payoffs: &PayoffMatrix,
    initial: &ProbabilityVector,
    periods: usize,
    adjustment: f64,
) -> Result<SimulationHistory, SimulationError> {
    ReplicatorPropagator::with_adjustment(payoffs.clone(), Adjustment::Fixed { value: adjustment })?
        .run(initial, periods)
}

/// Validate a configuration and run it to completion.
pub fn simulate_config(config: &SimulationConfig) -> Result<SimulationHistory, SimulationError> {
    let propagator = ReplicatorPropagator::new(config)?;
    let state = SimulationState::from_config(config)?;
    propagator.run(&state.probabilities, config.periods)
}

/// Replicator dynamics propagator.
///
/// Holds only read-only inputs, so one propagator can serve any number of
/// runs; each run owns its state and history.
pub struct ReplicatorPropagator {
    payoffs: PayoffMatrix,
    adjustment: Adjustment,
    /// Resolved constant for fixed policies.
    constant: Option<f64>,
    convergence_tolerance: Option<f64>,
    record_pairwise: bool,
    cancelled: Arc<AtomicBool>,
}

impl ReplicatorPropagator {
    /// Create new propagator from configuration.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut propagator =
            Self::with_adjustment(config.payoffs.clone(), config.adjustment)?
                .with_pairwise(config.record_pairwise);
        propagator.convergence_tolerance = config.convergence_tolerance;
        Ok(propagator)
    }

    /// Create a propagator from a matrix and an adjustment policy.
    pub fn with_adjustment(
        payoffs: PayoffMatrix,
        adjustment: Adjustment,
    ) -> Result<Self, ConfigError> {
        adjustment.validate(&payoffs)?;
        let constant = adjustment.constant(&payoffs);

        Ok(Self {
            payoffs,
            adjustment,
            constant,
            convergence_tolerance: None,
            record_pairwise: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Enable or disable the pairwise payoff breakdown.
    pub fn with_pairwise(mut self, record: bool) -> Self {
        self.record_pairwise = record;
        self
    }

    /// Stop early once successive shares differ by less than `tolerance` (L1).
    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        self.convergence_tolerance = Some(tolerance);
        Ok(self)
    }

    pub fn payoffs(&self) -> &PayoffMatrix {
        &self.payoffs
    }

    pub fn adjustment(&self) -> Adjustment {
        self.adjustment
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Shift applied to this period's payoffs.
    fn shift_for(&self, payoffs: &PayoffVector) -> f64 {
        match self.constant {
            Some(c) => c,
            None => {
                let lowest = payoffs.min();
                if lowest < 0.0 { 1.0 - lowest } else { 1.0 }
            }
        }
    }

    fn pairwise(&self, shares: &ProbabilityVector) -> Option<PairwisePayoffs> {
        self.record_pairwise
            .then(|| PairwisePayoffs::compute(&self.payoffs, shares))
    }

    /// Perform one period: payoffs, reweight, normalize.
    ///
    /// On error `state` is left untouched.
    pub fn step(&self, state: &mut SimulationState) -> Result<PeriodRecord, ComputationError> {
        let period = state.period + 1;
        let shares = state.probabilities.as_array();

        // 1. Average payoff against the current mixture
        let payoffs = average_payoffs(&self.payoffs, &state.probabilities);
        let shift = self.shift_for(&payoffs);

        // 2. Reweight
        let mut weights = [0.0f64; STRATEGY_COUNT];
        for (i, w) in weights.iter_mut().enumerate() {
            *w = shares[i] * (payoffs.as_array()[i] + shift);
            if *w < 0.0 {
                return Err(ComputationError::NegativeWeight {
                    period,
                    strategy: Strategy::ALL[i],
                    weight: *w,
                });
            }
        }

        // 3. Normalize
        let sum: f64 = weights.iter().sum();
        if !sum.is_finite() || sum < f64::MIN_POSITIVE {
            return Err(ComputationError::DegenerateNormalization { period, sum });
        }
        let next = ProbabilityVector::from_normalized(weights.map(|w| w / sum));

        let pairwise = self.pairwise(&state.probabilities);
        state.probabilities = next;
        state.period = period;

        Ok(PeriodRecord {
            period,
            probabilities: next,
            payoffs,
            pairwise,
        })
    }

    /// Run `periods` periods from `initial`.
    pub fn run(
        &self,
        initial: &ProbabilityVector,
        periods: usize,
    ) -> Result<SimulationHistory, SimulationError> {
        self.run_with_callback(initial, periods, |_| {})
    }

    /// Run with a callback invoked for every recorded state, period 0 included.
    pub fn run_with_callback<F>(
        &self,
        initial: &ProbabilityVector,
        periods: usize,
        mut callback: F,
    ) -> Result<SimulationHistory, SimulationError>
    where
        F: FnMut(&PeriodRecord),
    {
        if periods == 0 {
            return Err(ConfigError::InvalidPeriods.into());
        }

        let mut state = SimulationState::new(*initial);
        let initial_record = PeriodRecord {
            period: 0,
            probabilities: *initial,
            payoffs: average_payoffs(&self.payoffs, initial),
            pairwise: self.pairwise(initial),
        };
        callback(&initial_record);

        let mut history = SimulationHistory::new(initial_record, periods + 1, self.constant);
        debug!(
            "Starting replication run: {} periods, adjustment {:?}",
            periods, self.adjustment
        );

        let stop_reason = loop {
            if state.period >= periods {
                break StopReason::Completed;
            }
            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }

            let previous = state.probabilities;
            let record = match self.step(&mut state) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Replication run halted: {}", e);
                    return Err(e.into());
                }
            };
            trace!(
                "Period {}: leader {} at {:.6}",
                record.period,
                record.probabilities.argmax(),
                record.probabilities[record.probabilities.argmax()]
            );
            callback(&record);
            history.push(record);

            if let Some(tolerance) = self.convergence_tolerance
                && state.period < periods
                && previous.l1_distance(&state.probabilities) < tolerance
            {
                break StopReason::Converged;
            }
        };

        history.finish(stop_reason);
        debug!(
            "Replication run finished after {} periods ({:?})",
            history.periods(),
            stop_reason
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::prop;
    use proptest::{prop_assert, prop_assert_eq, proptest};

    const TOLERANCE: f64 = 1e-9;

    /// Matrix where `winner` earns 3 against everyone and the rest earn 1.
    fn dominating_row(winner: Strategy) -> PayoffMatrix {
        let mut entries = [[1.0; STRATEGY_COUNT]; STRATEGY_COUNT];
        entries[winner.index()] = [3.0; STRATEGY_COUNT];
        PayoffMatrix::new(entries).unwrap()
    }

    /// Canonical table with HAWK's row raised above every other entry.
    fn strictly_dominant_hawk() -> PayoffMatrix {
        let mut entries = *PayoffMatrix::canonical().entries();
        entries[Strategy::Hawk.index()] = [4.0; STRATEGY_COUNT];
        PayoffMatrix::new(entries).unwrap()
    }

    fn assert_on_simplex(history: &SimulationHistory) {
        for record in history.records() {
            let total = record.probabilities.total();
            assert!(
                (total - 1.0).abs() < TOLERANCE,
                "Period {} sums to {}",
                record.period,
                total
            );
            assert!(
                record.probabilities.as_array().iter().all(|&p| p >= 0.0),
                "Period {} has a negative share",
                record.period
            );
        }
    }

    #[test]
    fn test_canonical_run_stays_on_simplex() {
        let history = simulate(
            &PayoffMatrix::canonical(),
            &ProbabilityVector::uniform(),
            200,
            2.0,
        )
        .unwrap();

        assert_eq!(history.len(), 201);
        assert_eq!(history.stop_reason(), StopReason::Completed);
        assert_on_simplex(&history);
    }

    #[test]
    fn test_deterministic() {
        let config = SimulationConfig {
            periods: 150,
            record_pairwise: true,
            ..Default::default()
        };
        let a = simulate_config(&config).unwrap();
        let b = simulate_config(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shift_invariance() {
        let base = PayoffMatrix::canonical();
        let shifted = base.shifted(5.0).unwrap();
        let initial = ProbabilityVector::uniform();

        let a = simulate(&base, &initial, 100, 2.0).unwrap();
        let b = simulate(&shifted, &initial, 100, -3.0).unwrap();

        for (ra, rb) in a.records().iter().zip(b.records()) {
            for s in Strategy::ALL {
                assert!(
                    (ra.probabilities[s] - rb.probabilities[s]).abs() < TOLERANCE,
                    "{} diverged at period {}",
                    s,
                    ra.period
                );
                assert!((rb.payoffs[s] - ra.payoffs[s] - 5.0).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn test_single_period_is_one_step() {
        let m = PayoffMatrix::canonical();
        let initial = ProbabilityVector::from_weights([1.0, 2.0, 1.0, 3.0, 1.0, 2.0, 1.0, 1.0])
            .unwrap();
        let adjustment = 2.5;

        let history = simulate(&m, &initial, 1, adjustment).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.initial().probabilities, initial);

        let p = initial.as_array();
        let mut weights = [0.0; STRATEGY_COUNT];
        for i in 0..STRATEGY_COUNT {
            let avg: f64 = (0..STRATEGY_COUNT)
                .map(|j| m.entries()[i][j] * p[j])
                .sum();
            weights[i] = p[i] * (avg + adjustment);
        }
        let total: f64 = weights.iter().sum();

        let record = history.last();
        assert_eq!(record.period, 1);
        for i in 0..STRATEGY_COUNT {
            assert!((record.probabilities.as_array()[i] - weights[i] / total).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dominating_row_grows_monotonically() {
        let winner = Strategy::Grim;
        let history = simulate(
            &dominating_row(winner),
            &ProbabilityVector::uniform(),
            80,
            1.0,
        )
        .unwrap();

        let series = history.probability_series(winner);
        for pair in series.windows(2) {
            if pair[0] < 1.0 - 1e-12 {
                assert!(pair[1] > pair[0], "share fell from {} to {}", pair[0], pair[1]);
            } else {
                assert!(pair[1] >= pair[0] - 1e-15);
            }
        }
        assert!(series[series.len() - 1] > 1.0 - 1e-12);
    }

    #[test]
    fn test_identical_rows_stay_identical() {
        let history = simulate(
            &PayoffMatrix::canonical(),
            &ProbabilityVector::uniform(),
            200,
            2.0,
        )
        .unwrap();

        assert_eq!(
            history.probability_series(Strategy::Tweedledum),
            history.probability_series(Strategy::Tweedledee)
        );
        assert_eq!(
            history.payoff_series(Strategy::Tweedledum),
            history.payoff_series(Strategy::Tweedledee)
        );
    }

    #[test]
    fn test_zero_periods_rejected() {
        let result = simulate(
            &PayoffMatrix::canonical(),
            &ProbabilityVector::uniform(),
            0,
            2.0,
        );
        assert!(matches!(
            result,
            Err(SimulationError::Config(ConfigError::InvalidPeriods))
        ));
    }

    #[test]
    fn test_strict_dominance_saturates() {
        let history = simulate(
            &strictly_dominant_hawk(),
            &ProbabilityVector::uniform(),
            200,
            2.0,
        )
        .unwrap();

        let last = history.final_probabilities();
        assert_eq!(last.argmax(), Strategy::Hawk);
        assert!(last[Strategy::Hawk] > 1.0 - 1e-9);
        assert!(last.herfindahl() > 1.0 - 1e-9);
    }

    #[test]
    fn test_unsafe_adjustment_rejected() {
        let result = simulate(
            &PayoffMatrix::canonical(),
            &ProbabilityVector::uniform(),
            10,
            1.0,
        );
        assert!(matches!(
            result,
            Err(SimulationError::Config(ConfigError::UnsafeAdjustment { .. }))
        ));
    }

    #[test]
    fn test_overflow_halts_with_computation_error() {
        let m = PayoffMatrix::new([[f64::MAX; STRATEGY_COUNT]; STRATEGY_COUNT]).unwrap();
        let result = simulate(&m, &ProbabilityVector::uniform(), 5, f64::MAX);
        assert!(matches!(
            result,
            Err(SimulationError::Computation(
                ComputationError::DegenerateNormalization { period: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_step_leaves_state_on_error() {
        let m = PayoffMatrix::new([[f64::MAX; STRATEGY_COUNT]; STRATEGY_COUNT]).unwrap();
        let propagator =
            ReplicatorPropagator::with_adjustment(m, Adjustment::Fixed { value: f64::MAX })
                .unwrap();
        let mut state = SimulationState::new(ProbabilityVector::uniform());

        assert!(propagator.step(&mut state).is_err());
        assert_eq!(state.period, 0);
        assert_eq!(state.probabilities, ProbabilityVector::uniform());
    }

    #[test]
    fn test_minimum_shift_matches_unit_shift_for_non_negative_payoffs() {
        let m = PayoffMatrix::canonical().shifted(1.0).unwrap();
        let initial = ProbabilityVector::uniform();

        let legacy = ReplicatorPropagator::with_adjustment(m.clone(), Adjustment::MinimumShift)
            .unwrap()
            .run(&initial, 50)
            .unwrap();
        let fixed = simulate(&m, &initial, 50, 1.0).unwrap();

        assert_eq!(legacy.records(), fixed.records());
        assert_eq!(legacy.adjustment(), None);
        assert_eq!(fixed.adjustment(), Some(1.0));
    }

    #[test]
    fn test_minimum_shift_handles_negative_payoffs() {
        let config = SimulationConfig {
            periods: 200,
            adjustment: Adjustment::MinimumShift,
            ..Default::default()
        };
        let history = simulate_config(&config).unwrap();
        assert_eq!(history.len(), 201);
        assert_on_simplex(&history);
    }

    #[test]
    fn test_pairwise_recording() {
        let config = SimulationConfig {
            periods: 5,
            record_pairwise: true,
            ..Default::default()
        };
        let history = simulate_config(&config).unwrap();

        for record in history.records() {
            let pairwise = record.pairwise.as_ref().unwrap();
            for s in Strategy::ALL {
                assert!((pairwise.row_total(s) - record.payoffs[s]).abs() < 1e-12);
            }
        }

        let plain = simulate_config(&SimulationConfig {
            periods: 5,
            ..Default::default()
        })
        .unwrap();
        assert!(plain.records().iter().all(|r| r.pairwise.is_none()));
    }

    #[test]
    fn test_callback_sees_every_period() {
        let propagator = ReplicatorPropagator::new(&SimulationConfig::default()).unwrap();
        let mut seen = Vec::new();
        let history = propagator
            .run_with_callback(&ProbabilityVector::uniform(), 30, |r| seen.push(r.period))
            .unwrap();

        assert_eq!(seen, (0..=30).collect::<Vec<_>>());
        assert_eq!(history.periods(), 30);
    }

    #[test]
    fn test_cancellation() {
        let propagator = ReplicatorPropagator::new(&SimulationConfig::default()).unwrap();
        let cancel = propagator.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let history = propagator
            .run(&ProbabilityVector::uniform(), 100)
            .unwrap();
        assert_eq!(history.stop_reason(), StopReason::Cancelled);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_cancel_mid_run() {
        let propagator = ReplicatorPropagator::new(&SimulationConfig::default()).unwrap();
        let cancel = propagator.cancel_handle();

        let history = propagator
            .run_with_callback(&ProbabilityVector::uniform(), 100, |r| {
                if r.period == 10 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert_eq!(history.stop_reason(), StopReason::Cancelled);
        assert_eq!(history.periods(), 10);
        assert_on_simplex(&history);
    }

    #[test]
    fn test_convergence_stop() {
        let propagator =
            ReplicatorPropagator::with_adjustment(strictly_dominant_hawk(), Adjustment::Auto)
                .unwrap()
                .with_convergence_tolerance(1e-10)
                .unwrap();

        let history = propagator
            .run(&ProbabilityVector::uniform(), 10_000)
            .unwrap();
        assert_eq!(history.stop_reason(), StopReason::Converged);
        assert!(history.periods() < 10_000);
        assert!(history.final_probabilities()[Strategy::Hawk] > 1.0 - 1e-8);
    }

    #[test]
    fn test_convergence_on_last_period_reports_completed() {
        let propagator =
            ReplicatorPropagator::with_adjustment(PayoffMatrix::canonical(), Adjustment::Auto)
                .unwrap()
                .with_convergence_tolerance(10.0)
                .unwrap();

        let history = propagator.run(&ProbabilityVector::uniform(), 1).unwrap();
        assert_eq!(history.stop_reason(), StopReason::Completed);
        assert_eq!(history.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_shares_stay_on_simplex(
            rows in prop::array::uniform8(prop::array::uniform8(-5.0f64..5.0)),
            weights in prop::array::uniform8(0.001f64..1.0),
            periods in 1usize..60,
            extra in 0.0f64..3.0,
        ) {
            let m = PayoffMatrix::new(rows).unwrap();
            let initial = ProbabilityVector::from_weights(weights).unwrap();
            let adjustment = m.floor_adjustment() + extra;

            let history = simulate(&m, &initial, periods, adjustment).unwrap();
            prop_assert_eq!(history.len(), periods + 1);
            for record in history.records() {
                prop_assert!((record.probabilities.total() - 1.0).abs() < TOLERANCE);
                prop_assert!(record.probabilities.as_array().iter().all(|&p| p >= 0.0));
            }
        }

        #[test]
        fn prop_shift_invariance(
            rows in prop::array::uniform8(prop::array::uniform8(-2.0f64..2.0)),
            offset in -3.0f64..3.0,
        ) {
            let m = PayoffMatrix::new(rows).unwrap();
            let shifted = m.shifted(offset).unwrap();
            let adjustment = m.floor_adjustment();
            let initial = ProbabilityVector::uniform();

            let a = simulate(&m, &initial, 20, adjustment).unwrap();
            let b = simulate(&shifted, &initial, 20, adjustment - offset).unwrap();
            for (ra, rb) in a.records().iter().zip(b.records()) {
                prop_assert!(ra.probabilities.l1_distance(&rb.probabilities) < 1e-9);
            }
        }
    }
}
