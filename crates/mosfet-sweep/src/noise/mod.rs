//! Synthetic measurement noise for simulated tables.

pub mod rng;

pub use rng::{RandomSource, SplitMix64};

use crate::error::{Error, Result};
use crate::ngspice::{NoisyResult, SimulationResult};

/// Column perturbed when no other is requested: the drain current.
pub const DEFAULT_NOISE_COLUMN: &str = "i(vds)";

/// Apply relative Gaussian noise to one column.
///
/// Each row's value `x` becomes `x * (1 + e)` with an independent
/// `e ~ Normal(0, noise_level)`. All other columns are copied unchanged and
/// `result` is left untouched. Sign and magnitude are preserved except near
/// zero crossings.
pub fn add_noise<R>(
    result: &SimulationResult,
    column: &str,
    noise_level: f64,
    rng: &mut R,
) -> Result<NoisyResult>
where
    R: RandomSource + ?Sized,
{
    if !noise_level.is_finite() || noise_level < 0.0 {
        return Err(Error::InvalidNoiseLevel(noise_level));
    }

    let idx = result
        .column_index(column)
        .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;

    let mut noisy = result.clone();
    for row in noisy.rows_mut() {
        let e = rng.normal(0.0, noise_level);
        row[idx] *= 1.0 + e;
    }

    log::debug!(
        "applied {} relative noise to '{}' over {} rows",
        noise_level,
        column,
        noisy.len()
    );

    Ok(noisy)
}
