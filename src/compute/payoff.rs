//! Payoff evaluation against the current population mixture.

use serde::{Deserialize, Serialize};

use crate::schema::{PayoffMatrix, PayoffVector, ProbabilityVector, STRATEGY_COUNT, Strategy};

/// Expected payoff of every strategy against the mixture `shares`.
///
/// `avg[i] = Σ_j payoffs[i][j] * shares[j]`, self-play included.
pub fn average_payoffs(payoffs: &PayoffMatrix, shares: &ProbabilityVector) -> PayoffVector {
    let p = shares.as_array();
    let avg = payoffs
        .entries()
        .map(|row| row.iter().zip(p.iter()).map(|(u, q)| u * q).sum::<f64>());
    PayoffVector::new(avg)
}

/// Per-opponent contributions `payoffs[i][j] * shares[j]`.
///
/// Row sums equal [`average_payoffs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwisePayoffs([[f64; STRATEGY_COUNT]; STRATEGY_COUNT]);

impl PairwisePayoffs {
    pub fn compute(payoffs: &PayoffMatrix, shares: &ProbabilityVector) -> Self {
        let p = shares.as_array();
        Self(payoffs.entries().map(|row| {
            let mut out = row;
            for (value, q) in out.iter_mut().zip(p.iter()) {
                *value *= q;
            }
            out
        }))
    }

    /// Contribution earned by `player` from meetings with `opponent`.
    #[inline]
    pub fn get(&self, player: Strategy, opponent: Strategy) -> f64 {
        self.0[player.index()][opponent.index()]
    }

    /// Total for `player` (its average payoff).
    pub fn row_total(&self, player: Strategy) -> f64 {
        self.0[player.index()].iter().sum()
    }

    pub fn entries(&self) -> &[[f64; STRATEGY_COUNT]; STRATEGY_COUNT] {
        &self.0
    }
}

/// For each strategy, the opponent it scores highest against.
///
/// Depends only on the matrix; the earliest opponent wins ties.
pub fn best_responses(payoffs: &PayoffMatrix) -> [Strategy; STRATEGY_COUNT] {
    payoffs.entries().map(|row| {
        let mut best = 0;
        for j in 1..STRATEGY_COUNT {
            if row[j] > row[best] {
                best = j;
            }
        }
        Strategy::ALL[best]
    })
}
