//! Per-strategy vectors and initial population distributions.

use std::ops::Index;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ConfigError, STRATEGY_COUNT, Strategy};

/// Tolerance used when checking that caller-supplied shares sum to one.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Population shares, one per strategy in canonical order.
///
/// Components are finite and non-negative and sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 8]", into = "[f64; 8]")]
pub struct ProbabilityVector([f64; STRATEGY_COUNT]);

impl ProbabilityVector {
    /// Validate shares that should already sum to one, then renormalize.
    pub fn new(shares: [f64; STRATEGY_COUNT]) -> Result<Self, ConfigError> {
        let total = checked_total(&shares)?;
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(ConfigError::ProbabilitySum(total));
        }
        Ok(Self(shares.map(|p| p / total)))
    }

    /// Normalize arbitrary non-negative weights into shares.
    pub fn from_weights(weights: [f64; STRATEGY_COUNT]) -> Result<Self, ConfigError> {
        let total = checked_total(&weights)?;
        if total <= 0.0 {
            return Err(ConfigError::ZeroTotalWeight);
        }
        Ok(Self(weights.map(|w| w / total)))
    }

    /// Equal share for every strategy.
    pub fn uniform() -> Self {
        Self([1.0 / STRATEGY_COUNT as f64; STRATEGY_COUNT])
    }

    /// Wrap shares produced by the engine's own normalization.
    pub(crate) fn from_normalized(shares: [f64; STRATEGY_COUNT]) -> Self {
        Self(shares)
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; STRATEGY_COUNT] {
        &self.0
    }

    /// Sum of components (one, up to rounding).
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Herfindahl concentration index: sum of squared shares.
    pub fn herfindahl(&self) -> f64 {
        self.0.iter().map(|p| p * p).sum()
    }

    /// Strategy with the largest share; the earliest one wins ties.
    pub fn argmax(&self) -> Strategy {
        let mut best = 0;
        for i in 1..STRATEGY_COUNT {
            if self.0[i] > self.0[best] {
                best = i;
            }
        }
        Strategy::ALL[best]
    }

    /// Strategy with the smallest share; the latest one wins ties.
    pub fn argmin(&self) -> Strategy {
        let mut worst = 0;
        for i in 1..STRATEGY_COUNT {
            if self.0[i] <= self.0[worst] {
                worst = i;
            }
        }
        Strategy::ALL[worst]
    }

    /// L1 distance to another vector.
    pub fn l1_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }

    /// `(strategy, share)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Strategy, f64)> + '_ {
        Strategy::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl Default for ProbabilityVector {
    fn default() -> Self {
        Self::uniform()
    }
}

impl Index<Strategy> for ProbabilityVector {
    type Output = f64;

    fn index(&self, strategy: Strategy) -> &f64 {
        &self.0[strategy.index()]
    }
}

impl TryFrom<[f64; STRATEGY_COUNT]> for ProbabilityVector {
    type Error = ConfigError;

    fn try_from(shares: [f64; STRATEGY_COUNT]) -> Result<Self, Self::Error> {
        Self::new(shares)
    }
}

impl From<ProbabilityVector> for [f64; STRATEGY_COUNT] {
    fn from(v: ProbabilityVector) -> Self {
        v.0
    }
}

fn checked_total(values: &[f64; STRATEGY_COUNT]) -> Result<f64, ConfigError> {
    for (strategy, &value) in Strategy::ALL.iter().zip(values.iter()) {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteProbability(*strategy));
        }
        if value < 0.0 {
            return Err(ConfigError::NegativeProbability {
                strategy: *strategy,
                value,
            });
        }
    }
    Ok(values.iter().sum())
}

/// Average payoff earned by each strategy in one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffVector([f64; STRATEGY_COUNT]);

impl PayoffVector {
    pub fn new(payoffs: [f64; STRATEGY_COUNT]) -> Self {
        Self(payoffs)
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; STRATEGY_COUNT] {
        &self.0
    }

    pub fn min(&self) -> f64 {
        self.0.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Population-weighted mean payoff under `shares`.
    pub fn mean_under(&self, shares: &ProbabilityVector) -> f64 {
        self.0
            .iter()
            .zip(shares.as_array().iter())
            .map(|(u, p)| u * p)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Strategy, f64)> + '_ {
        Strategy::ALL.into_iter().zip(self.0.iter().copied())
    }
}

impl Index<Strategy> for PayoffVector {
    type Output = f64;

    fn index(&self, strategy: Strategy) -> &f64 {
        &self.0[strategy.index()]
    }
}

/// How the period-0 population is laid out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InitialDistribution {
    /// 1/8 each.
    #[default]
    Uniform,
    /// Arbitrary non-negative weights, normalized.
    Weights {
        weights: [f64; STRATEGY_COUNT],
    },
    /// One strategy holds `share`, the remainder is split evenly.
    Concentrated {
        strategy: Strategy,
        share: f64,
    },
    /// Uniformly random weights from a seeded generator.
    Random {
        seed: u64,
    },
}

impl InitialDistribution {
    /// Produce the period-0 shares.
    pub fn generate(&self) -> Result<ProbabilityVector, ConfigError> {
        match self {
            InitialDistribution::Uniform => Ok(ProbabilityVector::uniform()),
            InitialDistribution::Weights { weights } => ProbabilityVector::from_weights(*weights),
            InitialDistribution::Concentrated { strategy, share } => {
                if !share.is_finite() || !(0.0..=1.0).contains(share) {
                    return Err(ConfigError::InvalidShare(*share));
                }
                let rest = (1.0 - share) / (STRATEGY_COUNT - 1) as f64;
                let mut shares = [rest; STRATEGY_COUNT];
                shares[strategy.index()] = *share;
                ProbabilityVector::new(shares)
            }
            InitialDistribution::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                // Keep every weight strictly positive so no strategy starts extinct.
                let weights: [f64; STRATEGY_COUNT] =
                    std::array::from_fn(|_| rng.gen_range(f64::EPSILON..1.0));
                ProbabilityVector::from_weights(weights)
            }
        }
    }
}
