use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Command timed out after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Process spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process termination failed: {0}")]
    TerminationFailed(String),
}

/// Configuration for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// Working directory for command execution
    pub working_directory: Option<PathBuf>,

    /// Environment variables to set for the process
    pub environment_variables: HashMap<String, String>,

    /// Timeout for command execution in seconds
    pub timeout_seconds: Option<u64>,
}

impl ExecutionConfig {
    /// Create a new execution config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set working directory
    pub fn with_working_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add environment variable
    pub fn with_environment_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code of the process (-1 when killed by a signal)
    pub exit_code: i32,

    /// Standard output
    pub stdout: String,

    /// Standard error output
    pub stderr: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Whether the command was successful (exit code 0)
    pub success: bool,
}

impl ExecutionResult {
    /// Create a new execution result
    pub fn new(exit_code: i32, stdout: String, stderr: String, execution_time_ms: u64) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            execution_time_ms,
            success: exit_code == 0,
        }
    }
}

/// Command executor for running external processes
///
/// Arguments are passed to the program as-is; nothing goes through a shell.
/// stdin is closed, stdout/stderr are captured, and a timed-out child is
/// killed.
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute a program with arguments
    pub async fn execute<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        config: &ExecutionConfig,
    ) -> Result<ExecutionResult, CommandExecutorError> {
        if program.trim().is_empty() {
            return Err(CommandExecutorError::InvalidCommand("Command is empty".to_string()));
        }

        let start_time = Instant::now();

        let mut cmd = TokioCommand::new(program);
        cmd.args(args);

        if let Some(working_dir) = &config.working_directory {
            cmd.current_dir(working_dir);
        }
        for (key, value) in &config.environment_variables {
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| CommandExecutorError::SpawnFailed(format!("Failed to spawn '{}': {}", program, e)))?;

        debug!(program = %program, timeout_secs = ?config.timeout_seconds, "Spawned process");

        let output = match config.timeout_seconds {
            Some(timeout_secs) => match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    return Err(CommandExecutorError::Timeout {
                        timeout_seconds: timeout_secs,
                    })
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| CommandExecutorError::TerminationFailed(format!("Failed to wait for process: {}", e)))?;

        let execution_time = start_time.elapsed().as_millis() as u64;

        Ok(ExecutionResult::new(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            execution_time,
        ))
    }
}
