//! The closed set of automatons competing in the replication game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of strategies. Every matrix and vector in the crate is sized by this.
pub const STRATEGY_COUNT: usize = 8;

/// One of the eight fixed automatons.
///
/// Declaration order is the canonical order: it is the row/column index into
/// [`PayoffMatrix`](super::PayoffMatrix) and the position in every
/// probability or payoff vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Strategy {
    /// Always cooperates.
    Dove,
    /// Always defects.
    Hawk,
    /// Cooperates until the first defection, then defects forever.
    Grim,
    /// Opens with cooperation, then copies the opponent's last move.
    TitForTat,
    /// Opens with defection, then switches whenever the round went badly.
    TatForTit,
    Tweedledum,
    Tweedledee,
    Tweetypie,
}

impl Strategy {
    /// All strategies in canonical order.
    pub const ALL: [Strategy; STRATEGY_COUNT] = [
        Strategy::Dove,
        Strategy::Hawk,
        Strategy::Grim,
        Strategy::TitForTat,
        Strategy::TatForTit,
        Strategy::Tweedledum,
        Strategy::Tweedledee,
        Strategy::Tweetypie,
    ];

    /// Canonical index of this strategy.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Strategy at canonical index `i`, if any.
    #[inline]
    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Display label, e.g. `TIT-FOR-TAT`.
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Dove => "DOVE",
            Strategy::Hawk => "HAWK",
            Strategy::Grim => "GRIM",
            Strategy::TitForTat => "TIT-FOR-TAT",
            Strategy::TatForTit => "TAT-FOR-TIT",
            Strategy::Tweedledum => "TWEEDLEDUM",
            Strategy::Tweedledee => "TWEEDLEDEE",
            Strategy::Tweetypie => "TWEETYPIE",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Error returned when parsing an unknown strategy label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown strategy: {0}")]
pub struct ParseStrategyError(pub String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}
