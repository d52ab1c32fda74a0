//! Error types for netlist simulation and post-processing.

use std::time::Duration;

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running or post-processing a simulation.
///
/// Every variant is terminal for the operation that produced it. Variants
/// raised after the simulator ran carry its captured stderr in `diagnostics`.
#[derive(Debug, Error)]
pub enum Error {
    /// The simulator could not be probed for its version.
    #[error("ngspice not found: {0}")]
    SimulatorNotFound(String),

    /// The simulator did not finish within the allotted time.
    ///
    /// The child process has been killed and reaped by the time this is
    /// returned.
    #[error("ngspice timed out after {timeout:?}")]
    Timeout {
        timeout: Duration,
        diagnostics: String,
    },

    /// The simulator could not be started or waited on, or exited with a
    /// non-zero status.
    #[error("ngspice execution failed ({status}): {diagnostics}")]
    ProcessFailure { status: String, diagnostics: String },

    /// The simulator output could not be parsed into a table.
    #[error("failed to parse ngspice output: {reason}")]
    Parse { reason: String, diagnostics: String },

    /// The requested column does not exist in the result table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Noise standard deviation must be finite and non-negative.
    #[error("invalid noise level: {0}")]
    InvalidNoiseLevel(f64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Captured simulator diagnostics for process and parse failures.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Error::Timeout { diagnostics, .. }
            | Error::ProcessFailure { diagnostics, .. }
            | Error::Parse { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}
