//! ngspice process runner.
//!
//! This module handles invoking ngspice as a subprocess, feeding it a netlist
//! on standard input and turning its printed table into a [`SimulationResult`].
//!
//! The process boundary is the [`ProcessExecutor`] trait so that timeout and
//! parsing behavior can be exercised against canned output.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::netlist::Netlist;
use crate::ngspice::output::parse_output;
use crate::ngspice::types::SimulationResult;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long pipe helpers may linger after the child is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Configuration for the ngspice runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NgspiceConfig {
    /// Path to ngspice executable (default: "ngspice" in PATH).
    pub executable: String,
    /// Arguments passed before the netlist is streamed on stdin.
    pub args: Vec<String>,
    /// Timeout for ngspice execution in milliseconds.
    pub timeout_ms: u64,
}

impl Default for NgspiceConfig {
    fn default() -> Self {
        Self {
            executable: "ngspice".to_string(),
            // -b: batch mode, -D ngbehavior=hs: HSPICE compatibility
            args: vec!["-b".into(), "-D".into(), "ngbehavior=hs".into()],
            timeout_ms: 2_000,
        }
    }
}

impl NgspiceConfig {
    /// Configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How much simulator diagnostic output is surfaced through the logger.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Diagnostics are kept on the result but never logged.
    #[default]
    Quiet,
    /// Simulator stderr is logged as a warning.
    Normal,
    /// Also log the raw simulator stdout.
    Debug,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Debug,
        }
    }
}

/// Captured result of one finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Capability to run the external simulator once.
///
/// Implementations feed `input` to the process, wait at most `timeout`, and
/// return its captured streams. On expiry they must kill and reap the process
/// before returning [`Error::Timeout`].
pub trait ProcessExecutor {
    fn execute(&self, input: &str, timeout: Duration) -> Result<ProcessOutput>;
}

impl<F> ProcessExecutor for F
where
    F: Fn(&str, Duration) -> Result<ProcessOutput>,
{
    fn execute(&self, input: &str, timeout: Duration) -> Result<ProcessOutput> {
        self(input, timeout)
    }
}

/// Executes the configured ngspice binary as a child process.
#[derive(Debug, Clone, Default)]
pub struct NgspiceExecutor {
    config: NgspiceConfig,
}

impl NgspiceExecutor {
    pub fn new(config: NgspiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NgspiceConfig {
        &self.config
    }
}

impl ProcessExecutor for NgspiceExecutor {
    fn execute(&self, input: &str, timeout: Duration) -> Result<ProcessOutput> {
        let mut command = Command::new(&self.config.executable);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group so a timeout also reaches anything the simulator forks.
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|e| Error::ProcessFailure {
            status: "failed to start".to_string(),
            diagnostics: format!("{}: {}", self.config.executable, e),
        })?;

        log::debug!(
            "spawned {} (pid {}), timeout {:?}",
            self.config.executable,
            child.id(),
            timeout
        );

        // stdin is fed and both output pipes drained on helper threads so a
        // chatty simulator cannot block on a full pipe.
        let writer = spawn_writer(child.stdin.take(), input.to_owned());
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        match wait_with_timeout(&mut child, timeout) {
            Ok(Some(status)) => {
                let _ = writer.join();
                Ok(ProcessOutput {
                    exit_code: status.code(),
                    stdout: collect(stdout),
                    stderr: collect(stderr),
                })
            }
            Ok(None) => Err(Error::Timeout {
                timeout,
                diagnostics: stderr_after_kill(writer, stdout, stderr),
            }),
            Err(e) => Err(Error::ProcessFailure {
                status: format!("failed to wait: {}", e),
                diagnostics: stderr_after_kill(writer, stdout, stderr),
            }),
        }
    }
}

/// Wait for a child process, killing and reaping it if `timeout` expires.
///
/// Returns `Ok(None)` on timeout. A timeout too large to express as a
/// deadline waits without limit. The child has always exited when this
/// returns.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let Some(deadline) = Instant::now().checked_add(timeout) else {
        return match child.wait() {
            Ok(status) => Ok(Some(status)),
            Err(e) => {
                kill_and_reap(child);
                Err(e)
            }
        };
    };

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    log::debug!("killing pid {} after {:?}", child.id(), timeout);
                    kill_and_reap(child);
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
            Err(e) => {
                kill_and_reap(child);
                return Err(e);
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child.id());
    // kill fails only if the process already exited; wait still reaps it.
    let _ = child.kill();
    let _ = child.wait();
}

/// SIGKILL every process in the group led by `pgid`.
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pgid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        log::debug!("failed to kill process group {}: {}", pgid, e);
    }
}

fn spawn_writer<W>(sink: Option<W>, input: String) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    thread::spawn(move || {
        let Some(mut sink) = sink else { return };
        if let Err(e) = sink.write_all(input.as_bytes()) {
            // The simulator may exit before reading everything.
            if e.kind() != ErrorKind::BrokenPipe {
                log::debug!("failed to write netlist to ngspice stdin: {}", e);
            }
        }
    })
}

fn spawn_reader<R>(source: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    lossy(handle.join().unwrap_or_default())
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Collect whatever stderr arrived before the child was killed.
///
/// A surviving descendant may still hold the pipes open, so each helper gets
/// at most [`KILL_GRACE`] before it is detached.
fn stderr_after_kill(
    writer: JoinHandle<()>,
    stdout: JoinHandle<Vec<u8>>,
    stderr: JoinHandle<Vec<u8>>,
) -> String {
    let grace = Instant::now() + KILL_GRACE;
    let _ = join_by(writer, grace);
    let _ = join_by(stdout, grace);
    join_by(stderr, grace).map(lossy).unwrap_or_default()
}

/// Join a helper thread if it finishes before `deadline`, else detach it.
fn join_by<T>(handle: JoinHandle<T>, deadline: Instant) -> Option<T> {
    while !handle.is_finished() {
        let now = Instant::now();
        if now >= deadline {
            log::debug!("detaching helper thread still blocked on a pipe");
            return None;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
    handle.join().ok()
}

/// Runs netlists through a [`ProcessExecutor`] and parses the output table.
#[derive(Debug, Clone, Default)]
pub struct SimulationRunner<E = NgspiceExecutor> {
    executor: E,
}

impl SimulationRunner<NgspiceExecutor> {
    /// Runner backed by the ngspice binary described by `config`.
    pub fn ngspice(config: NgspiceConfig) -> Self {
        Self::new(NgspiceExecutor::new(config))
    }
}

impl<E: ProcessExecutor> SimulationRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Run one simulation and parse the first data block of its output.
    ///
    /// Simulator stderr is attached to the returned table (or to the error)
    /// and is logged only when `verbosity` is above [`Verbosity::Quiet`].
    pub fn run(
        &self,
        netlist: &Netlist,
        timeout: Duration,
        verbosity: Verbosity,
    ) -> Result<SimulationResult> {
        let output = match self.executor.execute(netlist.as_str(), timeout) {
            Ok(output) => output,
            Err(e) => {
                if let Some(diagnostics) = e.diagnostics() {
                    report_diagnostics(diagnostics, verbosity);
                }
                return Err(e);
            }
        };

        report_diagnostics(&output.stderr, verbosity);
        if verbosity >= Verbosity::Debug {
            log::debug!("ngspice stdout:\n{}", output.stdout);
        }

        if !output.success() {
            return Err(Error::ProcessFailure {
                status: output.status_text(),
                diagnostics: output.stderr,
            });
        }

        match parse_output(&output.stdout) {
            Ok(table) => {
                log::info!(
                    "ngspice produced {} rows x {} columns",
                    table.len(),
                    table.columns().len()
                );
                Ok(table.with_diagnostics(output.stderr))
            }
            Err(Error::Parse { reason, .. }) => Err(Error::Parse {
                reason,
                diagnostics: output.stderr,
            }),
            Err(e) => Err(e),
        }
    }
}

fn report_diagnostics(stderr: &str, verbosity: Verbosity) {
    if verbosity > Verbosity::Quiet && !stderr.trim().is_empty() {
        log::warn!("ngspice stderr:\n{}", stderr.trim_end());
    }
}

/// Run a netlist through ngspice with the given configuration.
pub fn run_ngspice(
    netlist: &Netlist,
    config: &NgspiceConfig,
    verbosity: Verbosity,
) -> Result<SimulationResult> {
    SimulationRunner::ngspice(config.clone()).run(netlist, config.timeout(), verbosity)
}

/// Check if ngspice is available.
pub fn is_ngspice_available(config: &NgspiceConfig) -> bool {
    Command::new(&config.executable)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Get ngspice version string.
pub fn ngspice_version(config: &NgspiceConfig) -> Result<String> {
    let output = Command::new(&config.executable)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::SimulatorNotFound(e.to_string()))?;

    if !output.status.success() {
        return Err(Error::SimulatorNotFound("--version failed".to_string()));
    }

    // ngspice prints a banner; the version is on the first non-empty line.
    let version = String::from_utf8_lossy(&output.stdout);
    Ok(version
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '*' || c.is_whitespace()))
        .find(|line| !line.is_empty())
        .unwrap_or("unknown")
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::{NetlistParameters, generate};

    const TABLE: &str = "Index v(d) i(vds)\n---\n0 0.0 0.0\n1 0.05 1e-6\n";

    fn netlist() -> Netlist {
        generate(&NetlistParameters::new("nch", "nmos"))
    }

    fn canned(exit_code: i32, stdout: &'static str, stderr: &'static str) -> impl ProcessExecutor {
        move |_: &str, _: Duration| -> Result<ProcessOutput> {
            Ok(ProcessOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            })
        }
    }

    #[test]
    fn test_default_config() {
        let config = NgspiceConfig::default();
        assert_eq!(config.executable, "ngspice");
        assert_eq!(config.args, ["-b", "-D", "ngbehavior=hs"]);
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(Verbosity::from(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from(1), Verbosity::Normal);
        assert_eq!(Verbosity::from(7), Verbosity::Debug);
        assert!(Verbosity::Quiet < Verbosity::Normal);
    }

    #[test]
    fn test_executor_receives_netlist() {
        let expected = netlist();
        let expected_text = expected.as_str().to_string();
        let runner = SimulationRunner::new(move |input: &str, timeout: Duration| -> Result<ProcessOutput> {
            assert_eq!(input, expected_text);
            assert_eq!(timeout, Duration::from_millis(250));
            Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: TABLE.to_string(),
                stderr: String::new(),
            })
        });

        let table = runner
            .run(&expected, Duration::from_millis(250), Verbosity::Quiet)
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_success_keeps_diagnostics() {
        let runner = SimulationRunner::new(canned(0, TABLE, "Warning: GMIN stepping\n"));
        let table = runner
            .run(&netlist(), Duration::from_secs(1), Verbosity::Quiet)
            .unwrap();
        assert_eq!(table.diagnostics(), "Warning: GMIN stepping\n");
    }

    #[test]
    fn test_nonzero_exit_is_process_failure() {
        // Even with a parseable table on stdout.
        let runner = SimulationRunner::new(canned(1, TABLE, "Error: unknown model\n"));
        let err = runner
            .run(&netlist(), Duration::from_secs(1), Verbosity::Normal)
            .unwrap_err();
        match err {
            Error::ProcessFailure {
                status,
                diagnostics,
            } => {
                assert_eq!(status, "exit code 1");
                assert!(diagnostics.contains("unknown model"));
            }
            other => panic!("expected process failure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure_carries_diagnostics() {
        let runner = SimulationRunner::new(canned(0, "no table\n", "note: nothing printed\n"));
        let err = runner
            .run(&netlist(), Duration::from_secs(1), Verbosity::Quiet)
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.diagnostics(), Some("note: nothing printed\n"));
    }

    #[test]
    fn test_executor_timeout_propagates() {
        let runner = SimulationRunner::new(|_: &str, timeout: Duration| -> Result<ProcessOutput> {
            Err(Error::Timeout {
                timeout,
                diagnostics: "partial".to_string(),
            })
        });
        let err = runner
            .run(&netlist(), Duration::from_millis(5), Verbosity::Debug)
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_millis(5)));
    }

    #[test]
    fn test_missing_executable() {
        let executor = NgspiceExecutor::new(NgspiceConfig {
            executable: "definitely-not-a-simulator-binary".to_string(),
            ..NgspiceConfig::default()
        });
        let err = executor.execute("* empty\n.end\n", Duration::from_secs(1)).unwrap_err();
        match err {
            Error::ProcessFailure {
                status,
                diagnostics,
            } => {
                assert_eq!(status, "failed to start");
                assert!(diagnostics.starts_with("definitely-not-a-simulator-binary: "));
            }
            other => panic!("expected process failure, got {other:?}"),
        }
    }

    #[test]
    #[ignore = "requires ngspice"]
    fn test_ngspice_available() {
        let config = NgspiceConfig::default();
        if is_ngspice_available(&config) {
            let version = ngspice_version(&config).unwrap();
            assert!(!version.is_empty());
        }
    }
}
