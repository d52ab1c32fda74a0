//! ngspice integration module.
//!
//! This module provides functionality to run netlists through ngspice
//! and parse the printed tables.

pub mod output;
pub mod runner;
pub mod types;

pub use output::parse_output;
pub use runner::{
    NgspiceConfig, NgspiceExecutor, ProcessExecutor, ProcessOutput, SimulationRunner, Verbosity,
    is_ngspice_available, ngspice_version, run_ngspice,
};
pub use types::{INDEX_COLUMN, NoisyResult, SimulationResult};
