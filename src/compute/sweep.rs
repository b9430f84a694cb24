//! Parallel parameter sweeps over independent configurations.

use log::debug;
use rayon::prelude::*;

use crate::schema::SimulationConfig;

use super::{SimulationError, SimulationHistory, simulate_config};

/// Run every configuration on the rayon pool.
///
/// Runs share nothing; results come back in input order.
pub fn sweep(configs: &[SimulationConfig]) -> Vec<Result<SimulationHistory, SimulationError>> {
    debug!("Sweeping {} configurations", configs.len());
    configs.par_iter().map(simulate_config).collect()
}
