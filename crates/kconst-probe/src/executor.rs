//! Probe executors: the seam between the resolve algorithm and a real
//! toolchain.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::ProbeError;
use crate::unit::{ProbeUnit, PROBE_ASM, PROBE_SOURCE};

/// Result of compiling one probe unit.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Whether the toolchain exited successfully.
    pub success: bool,
    /// Generated assembly (empty on failure).
    pub assembly: String,
    /// Toolchain diagnostics (stderr).
    pub diagnostics: String,
    /// Human-readable command line, for error messages.
    pub command: String,
}

/// Something that can compile a probe unit to assembly.
///
/// Implementations must be usable from several worker threads at once.
pub trait ProbeExecutor: Send + Sync {
    /// Compile `unit`. A compile failure is reported through
    /// [`CompileOutput::success`]; `Err` is reserved for not being able to
    /// run the toolchain at all.
    fn compile(&self, unit: &ProbeUnit) -> Result<CompileOutput, ProbeError>;
}

/// Runs a host C compiler (GCC or Clang command line) on each unit.
#[derive(Debug, Clone)]
pub struct ToolchainExecutor {
    cc: PathBuf,
    timeout: Duration,
}

impl ToolchainExecutor {
    pub fn new(cc: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cc: cc.into(),
            timeout,
        }
    }

    pub fn cc(&self) -> &Path {
        &self.cc
    }

    fn command_line(&self, unit: &ProbeUnit) -> String {
        let mut parts = vec![self.cc.display().to_string()];
        parts.extend(unit.args.iter().cloned());
        parts.extend(["-S", "-o", PROBE_ASM, PROBE_SOURCE].map(String::from));
        parts.join(" ")
    }
}

impl ProbeExecutor for ToolchainExecutor {
    fn compile(&self, unit: &ProbeUnit) -> Result<CompileOutput, ProbeError> {
        let command = self.command_line(unit);
        let failed = |reason: String| ProbeError::ToolchainInvocationFailed {
            command: command.clone(),
            reason,
        };

        // Removed on drop, whichever way this function returns.
        let work_dir = tempfile::Builder::new()
            .prefix("kconst-probe-")
            .tempdir()
            .map_err(|e| failed(format!("failed to create work directory: {}", e)))?;
        std::fs::write(work_dir.path().join(PROBE_SOURCE), &unit.source)
            .map_err(|e| failed(format!("failed to write probe source: {}", e)))?;

        debug!(
            symbols = unit.symbol_lines.len(),
            dir = %work_dir.path().display(),
            "running toolchain"
        );
        trace!("{}", command);

        let mut cmd = Command::new(&self.cc);
        cmd.args(&unit.args)
            .args(["-S", "-o", PROBE_ASM, PROBE_SOURCE])
            .current_dir(work_dir.path());
        let (status, stderr) = run_with_timeout(&mut cmd, self.timeout).map_err(failed)?;

        let assembly = if status.success() {
            std::fs::read_to_string(work_dir.path().join(PROBE_ASM))
                .map_err(|e| failed(format!("failed to read generated assembly: {}", e)))?
        } else {
            String::new()
        };

        Ok(CompileOutput {
            success: status.success(),
            assembly,
            diagnostics: stderr,
            command,
        })
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses. Returns the
/// exit status and captured stderr; stdout is discarded.
///
/// On Unix the toolchain gets its own process group so a timeout also takes
/// down the driver's children (`cc1`, `as`), which hold the stderr pipe open.
fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<(ExitStatus, String), String> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn: {}", e))?;

    // Drain stderr on a separate thread so a chatty compiler cannot block on
    // a full pipe while we poll for exit.
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| "stderr was not captured".to_string())?;
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                // The reader is left detached: it finishes once the last
                // holder of the pipe is gone.
                kill_toolchain(&mut child);
                return Err(format!("timed out after {:?}", timeout));
            }
            Ok(None) => thread::sleep(Duration::from_millis(10)),
            Err(e) => {
                kill_toolchain(&mut child);
                return Err(format!("failed to wait for toolchain: {}", e));
            }
        }
    };

    let stderr = reader
        .join()
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default();
    Ok((status, stderr))
}

/// Kill the toolchain and everything it started, then reap the driver.
fn kill_toolchain(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: killpg only sends a signal. The group was created for
            // this child by `process_group(0)`, so its id is the child's pid.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
