//! Command Execution
//!
//! Runs a vetted suggestion as a plain argument vector - there is no shell
//! involved at any point. Command failure is data, not an error: non-zero
//! exits and launch failures both come back as an `ExecutionResult` the rest
//! of the cycle can report.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The process ran to completion with this exit code.
    Completed { exit_code: i32 },
    /// Dry-run mode: the command was vetted but not executed.
    DryRun,
    /// The safety validator or execution mode refused the command.
    Blocked,
    /// The process did not finish within the timeout.
    TimedOut,
    /// The process could not be started at all.
    LaunchFailed,
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub stdout: String,
    pub stderr: String,
    detail: String,
}

impl ExecutionResult {
    pub fn completed(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            status: ExecutionStatus::Completed { exit_code },
            stdout,
            stderr,
            detail: String::new(),
        }
    }

    pub fn dry_run(command: &str) -> Self {
        Self {
            status: ExecutionStatus::DryRun,
            stdout: String::new(),
            stderr: String::new(),
            detail: format!("dry-run: '{}' was not executed", command),
        }
    }

    pub fn blocked(reason: String) -> Self {
        Self {
            status: ExecutionStatus::Blocked,
            stdout: String::new(),
            stderr: String::new(),
            detail: reason,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
            detail: format!("command timed out after {}s", timeout.as_secs()),
        }
    }

    pub fn launch_failed(error: String) -> Self {
        Self {
            status: ExecutionStatus::LaunchFailed,
            stdout: String::new(),
            stderr: String::new(),
            detail: error,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed { exit_code: 0 })
    }

    /// The text reported to operators: stdout on success, stderr on a failed
    /// exit, the explanation otherwise.
    pub fn result_text(&self) -> &str {
        match self.status {
            ExecutionStatus::Completed { exit_code: 0 } => &self.stdout,
            ExecutionStatus::Completed { .. } => &self.stderr,
            _ => &self.detail,
        }
    }
}

/// Seam between the cycle and the operating system, so tests can stub the
/// process launch.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, tool: &str, args: &[String]) -> ExecutionResult;
}

/// Executes commands as real processes via argv.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, tool: &str, args: &[String]) -> ExecutionResult {
        info!(tool = %tool, args = ?args, "Executing command");

        let output = Command::new(tool).args(args).kill_on_drop(true).output();

        match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                if exit_code != 0 {
                    warn!(tool = %tool, exit_code, "Command exited non-zero");
                }
                ExecutionResult::completed(
                    exit_code,
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                )
            }
            Ok(Err(e)) => {
                warn!(tool = %tool, error = %e, "Failed to launch command");
                ExecutionResult::launch_failed(format!("failed to launch '{}': {}", tool, e))
            }
            Err(_) => {
                warn!(tool = %tool, timeout_secs = self.timeout.as_secs(), "Command timed out");
                ExecutionResult::timed_out(self.timeout)
            }
        }
    }
}
