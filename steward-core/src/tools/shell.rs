// steward-core/src/tools/shell.rs

//! Core implementation for executing shell commands.

use super::CommandOutput;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes an arbitrary shell command and captures its output.
///
/// Uses `sh -c` (`cmd /C` on Windows). The child is killed if it outlives
/// `timeout`, in which case an error reading `Command timed out` is returned.
///
/// **Warning:** No validation or confirmation happens here.
pub async fn execute_shell_command(
    command: &str,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput> {
    debug!(command = %command, working_dir = ?working_dir, timeout = ?timeout, "Executing shell command");

    let (shell_executable, shell_arg) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let mut cmd = Command::new(shell_executable);
    cmd.arg(shell_arg)
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn shell process for command: {}", command))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.with_context(|| format!("Failed to wait for command: {}", command))?,
        Err(_) => {
            warn!(command = %command, timeout = ?timeout, "Shell command timed out");
            return Err(anyhow!("Command timed out"));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let status = output.status.code().unwrap_or(-1);

    debug!(
        "Shell command exit status: {}\nStdout preview (first 3 lines):\n{}\nStderr preview (first 3 lines):\n{}",
        status,
        stdout.lines().take(3).collect::<Vec<_>>().join("\n"),
        stderr.lines().take(3).collect::<Vec<_>>().join("\n")
    );

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

/// Runs `command` and renders its output as text for the model.
///
/// Stderr, when present, follows stdout after a `STDERR:` marker. A command
/// that prints nothing yields `Command executed (no output)`.
pub async fn run_bash_command(
    command: &str,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<String> {
    let output = execute_shell_command(command, working_dir, timeout).await?;
    Ok(format_command_output(&output))
}

pub fn format_command_output(output: &CommandOutput) -> String {
    let mut text = output.stdout.clone();
    if !output.stderr.is_empty() {
        text.push_str("\nSTDERR: ");
        text.push_str(&output.stderr);
    }
    if text.is_empty() {
        "Command executed (no output)".to_string()
    } else {
        text
    }
}
