//! Characterization jobs: a device, its sweeps and optional noise settings.
//!
//! A job is usually loaded from JSON:
//!
//! ```json
//! {
//!   "model_name": "my_nmos",
//!   "model_type": "nmos",
//!   "temperature": 27.0,
//!   "length": 10.0,
//!   "width": 10.0,
//!   "model_params": { "vth0": 0.7, "u0": 400 },
//!   "noise": { "level": 0.01, "seed": 42 }
//! }
//! ```
//!
//! When neither `control` nor `body_setup` is given, the default
//! output/transfer characterization is used.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::netlist::{ControlBlock, ModelParams, Netlist, NetlistParameters, generate};
use crate::ngspice::{NgspiceConfig, ProcessExecutor, SimulationResult, SimulationRunner, Verbosity};
use crate::noise::{DEFAULT_NOISE_COLUMN, RandomSource, add_noise};

/// Relative noise applied to one result column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_noise_column")]
    pub column: String,
    /// Standard deviation of the relative perturbation.
    pub level: f64,
    /// Seed for reproducible noise. A clock-derived seed is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_noise_column() -> String {
    DEFAULT_NOISE_COLUMN.to_string()
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            column: default_noise_column(),
            level: 0.01,
            seed: None,
        }
    }
}

/// Everything needed to characterize one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterizationJob {
    pub model_name: String,
    pub model_type: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_dimension")]
    pub length: f64,
    #[serde(default = "default_dimension")]
    pub width: f64,
    /// Parameter overrides rendered under the model card.
    #[serde(default)]
    pub model_params: ModelParams,
    /// Extra raw lines appended after `model_params`.
    #[serde(default)]
    pub pre_setup: String,
    /// Structured sweeps. Ignored when `body_setup` is non-empty.
    #[serde(default)]
    pub control: Option<ControlBlock>,
    /// Raw control text used verbatim instead of `control`.
    #[serde(default)]
    pub body_setup: String,
    #[serde(default)]
    pub ngspice: NgspiceConfig,
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default)]
    pub noise: Option<NoiseConfig>,
}

fn default_temperature() -> f64 {
    27.0
}

fn default_dimension() -> f64 {
    10.0
}

impl CharacterizationJob {
    pub fn new(model_name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_type: model_type.into(),
            temperature: default_temperature(),
            length: default_dimension(),
            width: default_dimension(),
            model_params: ModelParams::default(),
            pre_setup: String::new(),
            control: None,
            body_setup: String::new(),
            ngspice: NgspiceConfig::default(),
            verbosity: Verbosity::default(),
            noise: None,
        }
    }

    /// Load a job from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Resolve text blocks into template parameters.
    pub fn netlist_parameters(&self) -> NetlistParameters {
        let mut pre_setup = self.model_params.to_spice();
        if !self.pre_setup.is_empty() {
            if !pre_setup.is_empty() {
                pre_setup.push('\n');
            }
            pre_setup.push_str(&self.pre_setup);
        }

        let body_setup = if self.body_setup.is_empty() {
            self.control
                .clone()
                .unwrap_or_else(ControlBlock::default_characterization)
                .to_spice()
        } else {
            self.body_setup.clone()
        };

        NetlistParameters {
            model_name: self.model_name.clone(),
            model_type: self.model_type.clone(),
            pre_setup,
            temperature: self.temperature,
            length: self.length,
            width: self.width,
            body_setup,
        }
    }

    pub fn netlist(&self) -> Netlist {
        generate(&self.netlist_parameters())
    }
}

/// Output of [`characterize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Characterization {
    /// Table as produced by the simulator.
    pub reference: SimulationResult,
    /// Noisy copy, present when the job requests noise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noisy: Option<SimulationResult>,
}

/// Generate, simulate and optionally perturb one job.
///
/// `rng` is only drawn from when the job has a noise configuration.
pub fn characterize<E, R>(
    job: &CharacterizationJob,
    runner: &SimulationRunner<E>,
    rng: &mut R,
) -> Result<Characterization>
where
    E: ProcessExecutor,
    R: RandomSource + ?Sized,
{
    let netlist = job.netlist();
    log::debug!("characterizing {} ({})", job.model_name, job.model_type);

    let reference = runner.run(&netlist, job.ngspice.timeout(), job.verbosity)?;

    let noisy = match &job.noise {
        Some(noise) => Some(add_noise(&reference, &noise.column, noise.level, rng)?),
        None => None,
    };

    Ok(Characterization { reference, noisy })
}
