//! Shell command execution and the platform "open" launcher.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::{parse_args, Tool, ToolResult};

use crate::constants::{SHELL_MAX_OUTPUT_SIZE, SHELL_STRIPPED_ENV_VARS};

/// Tool that runs a command line through the platform shell.
///
/// Commands run with a wall-clock timeout and an output size cap, with API
/// keys stripped from the child environment. A non-zero exit status is not
/// a tool error: the model gets the output and the exit code and decides.
pub struct ShellTool {
    timeout_secs: u64,
}

impl ShellTool {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[derive(Deserialize)]
struct ShellInput {
    command: String,
    timeout_secs: Option<u64>,
}

/// Truncate `output` to at most `SHELL_MAX_OUTPUT_SIZE` bytes, appending a
/// notice when truncation occurs.
fn cap_output(output: &str) -> String {
    if output.len() <= SHELL_MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut end = SHELL_MAX_OUTPUT_SIZE;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... output truncated at {} bytes",
        &output[..end],
        SHELL_MAX_OUTPUT_SIZE
    )
}

/// Lays out captured streams as `STDOUT:` / `STDERR:` sections.
pub fn format_output(stdout: &str, stderr: &str, code: i32) -> String {
    let mut text = String::new();
    if !stdout.is_empty() {
        text.push_str("STDOUT:\n");
        text.push_str(stdout);
        text.push('\n');
    }
    if !stderr.is_empty() {
        text.push_str("STDERR:\n");
        text.push_str(stderr);
        text.push('\n');
    }
    if text.is_empty() && code == 0 {
        text.push_str("Command executed successfully with no output.");
    }
    if code != 0 {
        text.push_str(&format!("\nExit code: {}", code));
    }
    cap_output(text.trim())
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[async_trait::async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "execute_shell_command"
    }

    fn description(&self) -> &str {
        "Run a command in the system shell and return its standard output and standard error. Use it for scripts, process listings, developer tools or network information."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command line to execute"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": format!("Timeout in seconds (default {})", self.timeout_secs)
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ShellInput = parse_args(self.name(), input)?;
        let timeout_secs = input.timeout_secs.unwrap_or(self.timeout_secs);

        let mut cmd = shell_command(&input.command);
        for var in SHELL_STRIPPED_ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "Failed to execute command: {}",
                    e
                )));
            }
        };

        tracing::debug!(command = %input.command, timeout_secs, "running shell command");
        let result =
            tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let code = output.status.code().unwrap_or(-1);
                Ok(ToolResult::success(format_output(&stdout, &stderr, code)))
            }
            Ok(Err(e)) => Ok(ToolResult::error(format!(
                "Failed to execute command: {}",
                e
            ))),
            Err(_) => Ok(ToolResult::error(format!(
                "Command timed out after {} seconds.",
                timeout_secs
            ))),
        }
    }
}

// --- open_file_or_app ---

#[derive(Deserialize)]
struct OpenInput {
    path: String,
}

pub struct OpenFileTool;

fn opener(path: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // The empty argument is the window title `start` expects first.
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Starts `cmd` without waiting for it and reaps it in a background task.
fn spawn_reaped(mut cmd: Command) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => {
                tracing::debug!(%status, "opener exited");
                Some(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to wait on opener");
                None
            }
        }
    }))
}

#[async_trait::async_trait]
impl Tool for OpenFileTool {
    fn name(&self) -> &str {
        "open_file_or_app"
    }

    fn description(&self) -> &str {
        "Open a file, folder or application with the system's default handler (documents, images, videos, executables, folders in the file manager)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Full path of the file, folder or application"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: OpenInput = parse_args(self.name(), input)?;
        if !Path::new(&input.path).exists() {
            return Ok(ToolResult::error(format!(
                "The path '{}' does not exist.",
                input.path
            )));
        }

        // The opener detaches from the launched program; the turn does not wait on it.
        match spawn_reaped(opener(&input.path)) {
            Ok(_) => Ok(ToolResult::success(format!(
                "Successfully opened or launched '{}'.",
                input.path
            ))),
            Err(e) => Ok(ToolResult::error(format!(
                "Error opening file or application: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launched_opener_is_reaped() {
        let handle = spawn_reaped(Command::new("true")).unwrap();
        let status = handle.await.unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[tokio::test]
    async fn test_missing_launcher_is_an_error() {
        let result = spawn_reaped(Command::new("perch-no-such-opener"));
        assert!(result.is_err());
    }
}
