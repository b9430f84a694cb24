//! Configuration types for replication dynamics runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{InitialDistribution, PayoffMatrix, Strategy};

/// Default period count (the middle of the usual 10-200 range).
fn default_periods() -> usize {
    100
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of periods to simulate. Must be at least 1.
    #[serde(default = "default_periods")]
    pub periods: usize,
    /// Payoff table. Defaults to the canonical eight-automaton table.
    #[serde(default)]
    pub payoffs: PayoffMatrix,
    /// Period-0 population.
    #[serde(default)]
    pub initial: InitialDistribution,
    /// Constant added to payoffs before reweighting.
    #[serde(default)]
    pub adjustment: Adjustment,
    /// Stop early once successive shares move less than this (L1 distance).
    #[serde(default)]
    pub convergence_tolerance: Option<f64>,
    /// Record the `payoff[i][j] * p[j]` breakdown for every period.
    #[serde(default)]
    pub record_pairwise: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            payoffs: PayoffMatrix::default(),
            initial: InitialDistribution::default(),
            adjustment: Adjustment::default(),
            convergence_tolerance: None,
            record_pairwise: false,
        }
    }
}

/// Payoff shift applied before reweighting.
///
/// Reweighting multiplies each share by `payoff + adjustment`, so the shifted
/// payoff must stay positive for every achievable opponent mixture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Adjustment {
    /// `1 - min(0, smallest matrix entry)`: every shifted payoff is at least 1.
    #[default]
    Auto,
    /// Caller-chosen constant. Must satisfy `min entry + value > 0`.
    Fixed { value: f64 },
    /// Per-period shift: `1 - m` when the period's lowest average payoff `m`
    /// is negative, otherwise `1`.
    MinimumShift,
}

impl Adjustment {
    /// Check the policy against a matrix.
    pub fn validate(&self, payoffs: &PayoffMatrix) -> Result<(), ConfigError> {
        match *self {
            Adjustment::Fixed { value } if !payoffs.admits_adjustment(value) => {
                Err(ConfigError::UnsafeAdjustment {
                    adjustment: value,
                    min_payoff: payoffs.min_entry(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Constant for the fixed policies, `None` for [`Adjustment::MinimumShift`].
    pub fn constant(&self, payoffs: &PayoffMatrix) -> Option<f64> {
        match *self {
            Adjustment::Auto => Some(payoffs.floor_adjustment()),
            Adjustment::Fixed { value } => Some(value),
            Adjustment::MinimumShift => None,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods == 0 {
            return Err(ConfigError::InvalidPeriods);
        }
        if let Some(tolerance) = self.convergence_tolerance
            && (!tolerance.is_finite() || tolerance < 0.0)
        {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        self.adjustment.validate(&self.payoffs)?;
        self.initial.generate()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Period count must be at least 1")]
    InvalidPeriods,
    #[error("Payoff matrix must have 8 rows, got {0}")]
    InvalidMatrixRows(usize),
    #[error("Payoff matrix row {row} must have 8 entries, got {len}")]
    InvalidMatrixRow { row: usize, len: usize },
    #[error("Payoff matrix entry ({row}, {column}) is not finite")]
    NonFinitePayoff { row: usize, column: usize },
    #[error("Probability for {0} is not finite")]
    NonFiniteProbability(Strategy),
    #[error("Probability for {strategy} is negative ({value})")]
    NegativeProbability { strategy: Strategy, value: f64 },
    #[error("Probabilities must sum to 1, got {0}")]
    ProbabilitySum(f64),
    #[error("Initial weights must have a positive total")]
    ZeroTotalWeight,
    #[error("Concentrated share must lie in [0, 1], got {0}")]
    InvalidShare(f64),
    #[error("Convergence tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
    #[error(
        "Adjustment {adjustment} does not keep payoffs positive (smallest payoff {min_payoff})"
    )]
    UnsafeAdjustment { adjustment: f64, min_payoff: f64 },
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
