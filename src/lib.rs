//! Monte Carlo estimates for dice-driven attrition battles.
//!
//! [combat] resolves single rounds and whole conflicts, [sweep] runs many conflicts for every
//! starting force size on a worker pool and aggregates the outcomes.

pub mod cli;
pub mod combat;
pub mod config;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod sweep;

pub use error::{Result, RisikoError};
