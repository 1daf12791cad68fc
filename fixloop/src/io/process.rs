//! Shell command execution with merged output capture.
//!
//! The fix loop treats command output as one opaque text stream, so stdout
//! and stderr share a single pipe and interleave the way a terminal would
//! show them. The pipe is drained to EOF before waiting on the child to
//! avoid pipe-full deadlocks. No timeout is imposed; a hung command blocks
//! the loop until it exits.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

/// Captured result of one shell invocation.
#[derive(Debug)]
pub struct ShellOutput {
    pub status: ExitStatus,
    /// Merged stdout/stderr, decoded lossily as UTF-8.
    pub output: String,
}

/// Run `command` through the host shell, capturing merged stdout/stderr.
///
/// Returns an error only when the shell itself cannot be spawned; a failing
/// command is reported through the nonzero [`ShellOutput::status`].
#[instrument(skip_all, fields(command))]
pub fn run_shell_command(command: &str) -> Result<ShellOutput> {
    let (mut reader, stdout_writer) = std::io::pipe().context("create output pipe")?;
    let stderr_writer = stdout_writer.try_clone().context("clone output pipe")?;

    debug!("spawning shell command");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_writer))
        .stderr(Stdio::from(stderr_writer))
        .spawn()
        .context("spawn shell command")?;
    // The builder temporary is gone here, so the parent holds no write end
    // and the read below terminates when the child closes its pipes.

    let mut merged = Vec::new();
    reader
        .read_to_end(&mut merged)
        .context("read command output")?;
    let status = child.wait().context("wait for command")?;

    debug!(exit_code = ?status.code(), bytes = merged.len(), "command finished");
    Ok(ShellOutput {
        status,
        output: String::from_utf8_lossy(&merged).into_owned(),
    })
}
