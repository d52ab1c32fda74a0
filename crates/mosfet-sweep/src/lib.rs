//! MOSFET characterization sweeps through ngspice.
//!
//! This crate provides infrastructure for:
//! - Generating a single-transistor characterization netlist
//! - Running it through ngspice and parsing the printed table
//! - Adding reproducible relative noise to current measurements
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mosfet_sweep::{
//!     ControlBlock, NetlistParameters, NgspiceConfig, SimulationRunner, SplitMix64, Verbosity,
//!     add_noise, generate,
//! };
//!
//! let params = NetlistParameters::new("my_nmos", "nmos")
//!     .with_pre_setup("+vth0=0.7\n+u0=400")
//!     .with_body_setup(ControlBlock::default_characterization().to_spice());
//!
//! let runner = SimulationRunner::ngspice(NgspiceConfig::default());
//! let reference = runner.run(&generate(&params), Duration::from_secs(2), Verbosity::Normal)?;
//! let noisy = add_noise(&reference, "i(vds)", 0.01, &mut SplitMix64::new(42))?;
//! # Ok::<(), mosfet_sweep::Error>(())
//! ```

pub mod error;
pub mod job;
pub mod netlist;
pub mod ngspice;
pub mod noise;

pub use error::{Error, Result};
pub use job::{Characterization, CharacterizationJob, NoiseConfig, characterize};
pub use netlist::{
    ControlBlock, DcSweep, ModelParams, Netlist, NetlistParameters, SweepSource, SweepStep,
    generate,
};
pub use ngspice::{
    NgspiceConfig, NgspiceExecutor, NoisyResult, ProcessExecutor, ProcessOutput,
    SimulationResult, SimulationRunner, Verbosity, is_ngspice_available, ngspice_version,
    parse_output, run_ngspice,
};
pub use noise::{DEFAULT_NOISE_COLUMN, RandomSource, SplitMix64, add_noise};
