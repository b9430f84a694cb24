//! Payoff matrix for the eight-strategy game.

use serde::{Deserialize, Serialize};

use super::{ConfigError, STRATEGY_COUNT, Strategy};

/// Square payoff table indexed by canonical strategy order.
///
/// Entry `(i, j)` is the payoff strategy `i` receives when matched against
/// strategy `j`. The table need not be symmetric.
///
/// Serialized as a list of rows. Deserialization goes through
/// [`PayoffMatrix::from_rows`], so a malformed table never becomes a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct PayoffMatrix {
    entries: [[f64; STRATEGY_COUNT]; STRATEGY_COUNT],
}

impl PayoffMatrix {
    /// Build from a fixed-size table, rejecting non-finite entries.
    pub fn new(entries: [[f64; STRATEGY_COUNT]; STRATEGY_COUNT]) -> Result<Self, ConfigError> {
        for (row, values) in entries.iter().enumerate() {
            for (column, &value) in values.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ConfigError::NonFinitePayoff { row, column });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Build from dynamically sized rows (e.g. parsed JSON).
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ConfigError> {
        if rows.len() != STRATEGY_COUNT {
            return Err(ConfigError::InvalidMatrixRows(rows.len()));
        }
        let mut entries = [[0.0; STRATEGY_COUNT]; STRATEGY_COUNT];
        for (row, values) in rows.iter().enumerate() {
            if values.len() != STRATEGY_COUNT {
                return Err(ConfigError::InvalidMatrixRow {
                    row,
                    len: values.len(),
                });
            }
            entries[row].copy_from_slice(values);
        }
        Self::new(entries)
    }

    /// The built-in table for DOVE, HAWK, GRIM, TIT-FOR-TAT, TAT-FOR-TIT,
    /// TWEEDLEDUM, TWEEDLEDEE and TWEETYPIE.
    pub fn canonical() -> Self {
        const T: f64 = 2.0 / 3.0;
        Self {
            entries: [
                [1.0, -0.5, 1.0, 1.0, 1.0, 1.0, 1.0, -0.5],
                [3.0, 0.0, 0.0, 0.0, 1.5, 1.5, 1.5, 3.0],
                [2.0, 0.0, 2.0, 2.0, 0.0, 2.0, 2.0, -1.0],
                [2.0, 0.0, 2.0, 2.0, T, 2.0, 2.0, 2.0],
                [-0.5, 0.75, 0.0, T, 2.0, 2.0, 2.0, 2.0],
                [2.0, 0.75, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
                [2.0, 0.75, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
                [-0.5, 3.0, -1.0, 2.0, 2.0, 2.0, 2.0, 2.0],
            ],
        }
    }

    /// Payoff to `player` when matched against `opponent`.
    #[inline]
    pub fn get(&self, player: Strategy, opponent: Strategy) -> f64 {
        self.entries[player.index()][opponent.index()]
    }

    /// Row of payoffs for `player` against every opponent.
    #[inline]
    pub fn row(&self, player: Strategy) -> &[f64; STRATEGY_COUNT] {
        &self.entries[player.index()]
    }

    /// Raw table.
    #[inline]
    pub fn entries(&self) -> &[[f64; STRATEGY_COUNT]; STRATEGY_COUNT] {
        &self.entries
    }

    /// Smallest entry in the table.
    pub fn min_entry(&self) -> f64 {
        self.entries
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest entry in the table.
    pub fn max_entry(&self) -> f64 {
        self.entries
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Copy of this matrix with `offset` added to every entry.
    pub fn shifted(&self, offset: f64) -> Result<Self, ConfigError> {
        let mut entries = self.entries;
        for value in entries.iter_mut().flatten() {
            *value += offset;
        }
        Self::new(entries)
    }

    /// Smallest adjustment keeping every shifted payoff at or above 1.
    ///
    /// Average payoffs are convex combinations of row entries, so they can
    /// never fall below [`min_entry`](Self::min_entry).
    pub fn floor_adjustment(&self) -> f64 {
        1.0 - self.min_entry().min(0.0)
    }

    /// True if `payoff + adjustment > 0` holds for every achievable payoff.
    pub fn admits_adjustment(&self, adjustment: f64) -> bool {
        adjustment.is_finite() && self.min_entry() + adjustment > 0.0
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::canonical()
    }
}

impl TryFrom<Vec<Vec<f64>>> for PayoffMatrix {
    type Error = ConfigError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<PayoffMatrix> for Vec<Vec<f64>> {
    fn from(matrix: PayoffMatrix) -> Self {
        matrix.entries.iter().map(|row| row.to_vec()).collect()
    }
}
