//! Compute module - Numerical engine for replication dynamics.

mod history;
mod payoff;
mod propagator;
mod stats;
mod sweep;

pub use history::*;
pub use payoff::*;
pub use propagator::*;
pub use stats::*;
pub use sweep::*;
