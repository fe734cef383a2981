//! Command execution with security controls for probe helpers.
//!
//! External tools are only ever run from a whitelist, with a cleared
//! environment, a restricted PATH and a bounded wait.

use std::collections::HashSet;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Default bound on any external tool invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command '{program}' not in whitelist")]
    NotAllowed { program: String },

    #[error("program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("permission denied running '{program}'")]
    PermissionDenied { program: String },

    #[error("failed to run '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    #[error("'{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Captured output of a completed command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

/// Executes whitelisted system commands with timeout enforcement.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    default_timeout: Duration,
    allowed_commands: HashSet<String>,
}

impl CommandExecutor {
    /// Executor with an empty whitelist; must be configured before use.
    pub fn new() -> Self {
        Self {
            default_timeout: DEFAULT_COMMAND_TIMEOUT,
            allowed_commands: HashSet::new(),
        }
    }

    /// Executor pre-allowing the tools the built-in probe functions invoke.
    pub fn with_defaults() -> Self {
        let mut executor = Self::new();
        executor.allow_commands(&["ectool", "nmcli"]);
        executor
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn allow_command(&mut self, command: impl Into<String>) {
        self.allowed_commands.insert(command.into());
    }

    pub fn allow_commands(&mut self, commands: &[&str]) {
        for cmd in commands {
            self.allowed_commands.insert(cmd.to_string());
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Run `program` with `args`, bounded by `timeout` (default bound when
    /// `None`). The child is killed if the bound is hit.
    pub fn execute(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.allowed_commands.contains(program) {
            return Err(CommandError::NotAllowed {
                program: program.to_string(),
            });
        }

        let timeout_duration = timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .env("PATH", "/usr/bin:/bin:/usr/sbin:/sbin")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::ProgramNotFound {
                    program: program.to_string(),
                }
            } else if e.kind() == std::io::ErrorKind::PermissionDenied {
                CommandError::PermissionDenied {
                    program: program.to_string(),
                }
            } else {
                CommandError::ExecutionFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = wait_timeout::ChildExt::wait_timeout(&mut child, timeout_duration)
            .map_err(|e| CommandError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        match status {
            Some(_) => {
                let output =
                    child
                        .wait_with_output()
                        .map_err(|e| CommandError::ExecutionFailed {
                            program: program.to_string(),
                            reason: e.to_string(),
                        })?;

                Ok(CommandOutput {
                    status_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    duration: start.elapsed(),
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(CommandError::Timeout {
                    program: program.to_string(),
                    timeout: timeout_duration,
                })
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::with_defaults()
    }
}
