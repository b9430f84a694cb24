//! Replication dynamics among eight repeated-game automatons.
//!
//! Each period every strategy meets the current population mixture, earns
//! its expected payoff, and has its share scaled by that (shifted) payoff
//! before the shares are renormalized. Strategies that out-earn the
//! population grow; the rest shrink.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Strategies, payoff matrix, distributions and configuration
//! - `compute`: Numerical computation (payoffs, propagator, history, statistics)
//!
//! # Example
//!
//! ```rust,no_run
//! use replication_dynamics::{
//!     compute::{SimulationStats, simulate},
//!     schema::{PayoffMatrix, ProbabilityVector},
//! };
//!
//! let payoffs = PayoffMatrix::canonical();
//! let history = simulate(&payoffs, &ProbabilityVector::uniform(), 100, 2.0)?;
//!
//! let stats = SimulationStats::from_history(&history);
//! println!(
//!     "{} leads with {:.2}% (concentration {:.3})",
//!     stats.dominant.strategy, stats.dominant.percentage, stats.concentration
//! );
//! # Ok::<(), replication_dynamics::compute::SimulationError>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    ReplicatorPropagator, SimulationError, SimulationHistory, SimulationStats, simulate,
};
pub use schema::{PayoffMatrix, ProbabilityVector, SimulationConfig, Strategy};
