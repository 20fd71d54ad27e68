use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::common::error::MigratorError;
use crate::domain::entities::{MigrationStage, PushStage};
use crate::domain::value_objects::redact_url_credentials;
use crate::infrastructure::process::{CommandExecutor, CommandExecutorError, ExecutionConfig};

/// Credential helper applied to push invocations
pub const PUSH_CREDENTIAL_HELPER: &str = "credential.helper=cache --timeout=300";

/// Mirror transfer errors
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("'{command}' exited with code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("'{command}' timed out after {timeout_secs} seconds")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("Failed to run '{command}': {message}")]
    Spawn { command: String, message: String },
}

impl MirrorError {
    /// Convert into the crate error for the stage that failed
    ///
    /// `url` is the source URL for the clone stage and the target URL for the
    /// later stages.
    pub fn into_stage_error(self, stage: MigrationStage, url: &str) -> MigratorError {
        if let MirrorError::Timeout { command, timeout_secs } = self {
            return MigratorError::upstream_timeout_during(stage, command, timeout_secs);
        }

        let message = self.to_string();
        match stage {
            MigrationStage::MirrorClone => MigratorError::source_clone_error(redact_url_credentials(url), message),
            MigrationStage::RetargetRemote => MigratorError::retarget_error(redact_url_credentials(url), message),
            MigrationStage::Push(push) => MigratorError::push_error(push, message),
            MigrationStage::CreateTarget | MigrationStage::Cleanup => MigratorError::internal_error(message),
        }
    }
}

/// Mirror transfer of a repository between two remotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MirrorOperations: Send + Sync {
    /// `git clone --mirror <source_url> <dest>`
    async fn clone_mirror(&self, source_url: &str, dest: &Path) -> Result<(), MirrorError>;

    /// `git remote set-url origin <target_url>` inside the mirror
    ///
    /// Also turns off `remote.origin.mirror` so that the branch and tag
    /// pushes are accepted as two separate invocations.
    async fn set_origin_url(&self, repo: &Path, target_url: &str) -> Result<(), MirrorError>;

    /// `git push --all origin`
    async fn push_branches(&self, repo: &Path) -> Result<(), MirrorError>;

    /// `git push --tags origin`
    async fn push_tags(&self, repo: &Path) -> Result<(), MirrorError>;
}

/// `MirrorOperations` backed by the git command line
pub struct GitMirror {
    git_executable: String,
    timeout_secs: u64,
}

impl GitMirror {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_executable("git", timeout_secs)
    }

    pub fn with_executable(git_executable: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            git_executable: git_executable.into(),
            timeout_secs,
        }
    }

    /// Run git and turn a non-zero exit into an error
    ///
    /// `command_line` is what logs and errors show; it never contains URLs
    /// with credentials.
    async fn run_git(
        &self,
        args: Vec<OsString>,
        working_dir: Option<&Path>,
        command_line: String,
    ) -> Result<(), MirrorError> {
        let mut config = ExecutionConfig::new()
            .with_timeout(self.timeout_secs)
            .with_environment_variable("GIT_TERMINAL_PROMPT", "0");
        if let Some(dir) = working_dir {
            config = config.with_working_directory(dir);
        }

        debug!(command = %command_line, "Running git");

        let result = CommandExecutor::execute(&self.git_executable, &args, &config)
            .await
            .map_err(|e| match e {
                CommandExecutorError::Timeout { timeout_seconds } => MirrorError::Timeout {
                    command: command_line.clone(),
                    timeout_secs: timeout_seconds,
                },
                other => MirrorError::Spawn {
                    command: command_line.clone(),
                    message: other.to_string(),
                },
            })?;

        if !result.success {
            return Err(MirrorError::CommandFailed {
                command: command_line,
                exit_code: result.exit_code,
                stderr: redact_url_credentials(result.stderr.trim()),
            });
        }

        debug!(command = %command_line, elapsed_ms = result.execution_time_ms, "git finished");
        Ok(())
    }

    async fn push(&self, repo: &Path, stage: PushStage) -> Result<(), MirrorError> {
        let flag = match stage {
            PushStage::Branches => "--all",
            PushStage::Tags => "--tags",
        };
        let args: Vec<OsString> = vec![
            "-c".into(),
            PUSH_CREDENTIAL_HELPER.into(),
            "push".into(),
            flag.into(),
            "origin".into(),
        ];
        self.run_git(args, Some(repo), format!("git push {} origin", flag)).await?;
        info!(stage = %stage, "Pushed to target");
        Ok(())
    }
}

#[async_trait]
impl MirrorOperations for GitMirror {
    async fn clone_mirror(&self, source_url: &str, dest: &Path) -> Result<(), MirrorError> {
        let args: Vec<OsString> = vec![
            "clone".into(),
            "--mirror".into(),
            source_url.into(),
            dest.as_os_str().to_os_string(),
        ];
        let command_line = format!(
            "git clone --mirror {} {}",
            redact_url_credentials(source_url),
            dest.display()
        );
        self.run_git(args, None, command_line).await?;
        info!(source = %redact_url_credentials(source_url), "Mirror clone finished");
        Ok(())
    }

    async fn set_origin_url(&self, repo: &Path, target_url: &str) -> Result<(), MirrorError> {
        let args: Vec<OsString> = vec![
            "remote".into(),
            "set-url".into(),
            "origin".into(),
            target_url.into(),
        ];
        let command_line = format!("git remote set-url origin {}", redact_url_credentials(target_url));
        self.run_git(args, Some(repo), command_line).await?;

        let args: Vec<OsString> = vec![
            "config".into(),
            "remote.origin.mirror".into(),
            "false".into(),
        ];
        self.run_git(args, Some(repo), "git config remote.origin.mirror false".to_string())
            .await
    }

    async fn push_branches(&self, repo: &Path) -> Result<(), MirrorError> {
        self.push(repo, PushStage::Branches).await
    }

    async fn push_tags(&self, repo: &Path) -> Result<(), MirrorError> {
        self.push(repo, PushStage::Tags).await
    }
}
