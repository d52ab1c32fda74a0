//! mosfet-sweep CLI tool.
//!
//! This is the command-line interface for the mosfet-sweep crate.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mosfet_sweep::{
    CharacterizationJob, NgspiceConfig, NoiseConfig, SimulationRunner, SplitMix64, Verbosity,
    characterize, is_ngspice_available, ngspice_version,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "mosfet-sweep")]
#[command(about = "MOSFET characterization sweeps through ngspice")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v shows simulator stderr, -vv also raw output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the netlist generated for a job
    Netlist {
        /// Path to the job file (JSON)
        job: PathBuf,
    },

    /// Simulate a job and print the reference (and noisy) tables
    Run {
        /// Path to the job file (JSON)
        job: PathBuf,

        /// Relative noise level applied to the current column
        #[arg(long)]
        noise: Option<f64>,

        /// Seed for the noise generator
        #[arg(long)]
        seed: Option<u64>,

        /// Simulator timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check ngspice availability
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Netlist { job } => cmd_netlist(job),
        Commands::Run {
            job,
            noise,
            seed,
            timeout_ms,
            json,
        } => cmd_run(job, noise, seed, timeout_ms, json, cli.verbose),
        Commands::Check => cmd_check(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` directives when set, otherwise a level from the `-v` count.
fn log_filter(verbose: u8, directives: Option<&str>) -> EnvFilter {
    match directives.filter(|d| !d.trim().is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => {
            let level = match verbose {
                0 => LevelFilter::WARN,
                1 => LevelFilter::INFO,
                _ => LevelFilter::DEBUG,
            };
            EnvFilter::default().add_directive(level.into())
        }
    }
}

fn load_job(path: &Path) -> Result<CharacterizationJob> {
    CharacterizationJob::from_json_file(path)
        .with_context(|| format!("loading job {}", path.display()))
}

fn cmd_netlist(job_path: PathBuf) -> Result<ExitCode> {
    let job = load_job(&job_path)?;
    print!("{}", job.netlist());
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(
    job_path: PathBuf,
    noise: Option<f64>,
    seed: Option<u64>,
    timeout_ms: Option<u64>,
    json: bool,
    verbose: u8,
) -> Result<ExitCode> {
    let mut job = load_job(&job_path)?;

    job.verbosity = job.verbosity.max(Verbosity::from(verbose));
    if let Some(timeout_ms) = timeout_ms {
        job.ngspice.timeout_ms = timeout_ms;
    }
    if let Some(level) = noise {
        job.noise.get_or_insert_with(NoiseConfig::default).level = level;
    }
    if let Some(seed) = seed {
        job.noise.get_or_insert_with(NoiseConfig::default).seed = Some(seed);
    }

    let mut rng = match job.noise.as_ref().and_then(|n| n.seed) {
        Some(seed) => SplitMix64::new(seed),
        None => SplitMix64::from_time(),
    };

    let runner = SimulationRunner::ngspice(job.ngspice.clone());
    let result = characterize(&job, &runner, &mut rng)
        .with_context(|| format!("simulating {}", job.model_name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Reference ({} rows):", result.reference.len());
        print!("{}", result.reference.to_text());
        if let Some(noisy) = &result.noisy {
            println!("\nNoisy ({} rows):", noisy.len());
            print!("{}", noisy.to_text());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_check() -> Result<ExitCode> {
    let config = NgspiceConfig::default();

    if is_ngspice_available(&config) {
        match ngspice_version(&config) {
            Ok(version) => println!("ngspice is available: {}", version),
            Err(e) => println!("ngspice found but version check failed: {}", e),
        }
        Ok(ExitCode::SUCCESS)
    } else {
        println!("ngspice not found in PATH");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_from_verbosity() {
        assert_eq!(log_filter(0, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(1, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(3, Some("  ")).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        assert_eq!(
            log_filter(0, Some("trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
