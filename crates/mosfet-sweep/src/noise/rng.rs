//! Seedable random sources for noise injection.
//!
//! Noise draws come from an explicitly passed [`RandomSource`] rather than a
//! process-wide generator, so a fixed seed reproduces a noisy dataset exactly.
//!
//! [`SplitMix64`] is the default source. Gaussian samples use the Box-Muller
//! transform over two uniform draws.

use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

/// A stream of random numbers.
pub trait RandomSource {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform value in [0, 1).
    fn uniform(&mut self) -> f64 {
        // Upper 53 bits fill the f64 mantissa.
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Gaussian value with mean 0 and sigma 1.
    fn standard_normal(&mut self) -> f64 {
        // Avoid ln(0).
        let u1 = self.uniform().max(1e-300);
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Gaussian value with the given mean and standard deviation.
    fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        mean + self.standard_normal() * sigma
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }

    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }

    fn standard_normal(&mut self) -> f64 {
        (**self).standard_normal()
    }

    fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        (**self).normal(mean, sigma)
    }
}

/// SplitMix64 mixing function.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(GOLDEN_GAMMA);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

/// Sequential SplitMix64 generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the system clock, for runs that need not be reproducible.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(GOLDEN_GAMMA);
        Self::new(splitmix64(nanos ^ u64::from(std::process::id())))
    }
}

impl RandomSource for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        let out = splitmix64(self.state);
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        out
    }
}
