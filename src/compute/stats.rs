//! Summary statistics over a finished run.

use serde::{Deserialize, Serialize};

use crate::schema::Strategy;

use super::{SimulationHistory, StopReason};

/// One row of the final ranking table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedShare {
    /// 1-based rank, highest share first.
    pub rank: usize,
    pub strategy: Strategy,
    pub probability: f64,
    pub percentage: f64,
}

/// Simulation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Final shares, highest first. Ties keep canonical order.
    pub ranking: Vec<RankedShare>,
    /// Strategy with the largest final share.
    pub dominant: RankedShare,
    /// Strategy with the smallest final share.
    pub least_common: RankedShare,
    /// Herfindahl index of the final shares.
    pub concentration: f64,
    /// Population-weighted mean payoff in the last period.
    pub mean_payoff: f64,
    /// Periods actually simulated.
    pub periods: usize,
    pub stop_reason: StopReason,
}

impl SimulationStats {
    /// Compute statistics from history.
    pub fn from_history(history: &SimulationHistory) -> Self {
        let last = history.last();
        let shares = &last.probabilities;

        let mut order: Vec<(Strategy, f64)> = shares.iter().collect();
        // Stable sort keeps canonical order among equal shares
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        let ranking: Vec<RankedShare> = order
            .into_iter()
            .enumerate()
            .map(|(i, (strategy, probability))| RankedShare {
                rank: i + 1,
                strategy,
                probability,
                percentage: probability * 100.0,
            })
            .collect();

        Self {
            dominant: ranking[0],
            least_common: ranking[ranking.len() - 1],
            ranking,
            concentration: shares.herfindahl(),
            mean_payoff: last.payoffs.mean_under(shares),
            periods: history.periods(),
            stop_reason: history.stop_reason(),
        }
    }
}
