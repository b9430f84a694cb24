//! Schema module - Strategy, matrix, distribution and configuration types.

mod config;
mod distribution;
mod matrix;
mod strategy;

pub use config::*;
pub use distribution::*;
pub use matrix::*;
pub use strategy::*;
