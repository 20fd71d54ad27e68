use crate::domain::entities::{MigrationStage, MigrationState, PushStage};
use crate::domain::value_objects::PlatformType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("{platform} API returned HTTP {status}: {body}")]
    PlatformApiError {
        platform: PlatformType,
        status: u16,
        body: String,
    },

    #[error("Unsupported platform: '{name}'. Supported platforms are: gitlab, github, azure")]
    UnsupportedPlatform { name: String },

    #[error("Failed to create repository '{repo_name}' on {platform}: {message}")]
    TargetCreationError {
        platform: PlatformType,
        repo_name: String,
        message: String,
        /// Upstream HTTP status, when the platform answered
        status: Option<u16>,
    },

    #[error("Failed to mirror-clone {source_url}: {message}")]
    SourceCloneError { source_url: String, message: String },

    #[error("Failed to point origin at {target_url}: {message}")]
    RetargetError { target_url: String, message: String },

    #[error("Failed to push {stage} to the target repository: {message}")]
    PushError { stage: PushStage, message: String },

    #[error("Upstream call timed out after {timeout_secs} seconds: {operation}")]
    UpstreamTimeout {
        operation: String,
        timeout_secs: u64,
        /// Migration step that was running, if any
        stage: Option<MigrationStage>,
    },

    #[error("Failed to resolve scopes under '{scope}': {message}")]
    ScopeResolutionError { scope: String, message: String },

    #[error("Platform '{platform}' is not configured: {message}")]
    PlatformNotConfigured {
        platform: PlatformType,
        message: String,
    },

    #[error("Network operation failed: {message}")]
    NetworkError {
        message: String,
        url: Option<String>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MigratorError {
    pub fn platform_api_error(platform: PlatformType, status: u16, body: impl Into<String>) -> Self {
        Self::PlatformApiError {
            platform,
            status,
            body: body.into(),
        }
    }

    pub fn unsupported_platform(name: impl Into<String>) -> Self {
        Self::UnsupportedPlatform { name: name.into() }
    }

    pub fn target_creation_error(
        platform: PlatformType,
        repo_name: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::TargetCreationError {
            platform,
            repo_name: repo_name.into(),
            message: message.into(),
            status,
        }
    }

    pub fn source_clone_error(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceCloneError {
            source_url: source_url.into(),
            message: message.into(),
        }
    }

    pub fn retarget_error(target_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RetargetError {
            target_url: target_url.into(),
            message: message.into(),
        }
    }

    pub fn push_error(stage: PushStage, message: impl Into<String>) -> Self {
        Self::PushError {
            stage,
            message: message.into(),
        }
    }

    pub fn upstream_timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::UpstreamTimeout {
            operation: operation.into(),
            timeout_secs,
            stage: None,
        }
    }

    pub fn upstream_timeout_during(
        stage: MigrationStage,
        operation: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self::UpstreamTimeout {
            operation: operation.into(),
            timeout_secs,
            stage: Some(stage),
        }
    }

    pub fn scope_resolution_error(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScopeResolutionError {
            scope: scope.into(),
            message: message.into(),
        }
    }

    pub fn platform_not_configured(platform: PlatformType, message: impl Into<String>) -> Self {
        Self::PlatformNotConfigured {
            platform,
            message: message.into(),
        }
    }

    pub fn network_error(message: impl Into<String>, url: Option<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            url,
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformApiError { .. } => "platform_api_error",
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::TargetCreationError { .. } => "target_creation_error",
            Self::SourceCloneError { .. } => "source_clone_error",
            Self::RetargetError { .. } => "retarget_error",
            Self::PushError { .. } => "push_error",
            Self::UpstreamTimeout { .. } => "upstream_timeout",
            Self::ScopeResolutionError { .. } => "scope_resolution_error",
            Self::PlatformNotConfigured { .. } => "platform_not_configured",
            Self::NetworkError { .. } => "network_error",
            Self::FileSystemError { .. } => "filesystem_error",
            Self::ConfigError { .. } => "config_error",
            Self::ValidationError { .. } => "validation_error",
            Self::SerializationError { .. } => "serialization_error",
            Self::InternalError { .. } => "internal_error",
        }
    }

    /// Whether retrying the same request could succeed.
    ///
    /// Timeouts, transport failures, rate limiting and 5xx answers are
    /// transient; everything else (bad input, 4xx such as a name collision)
    /// is fatal.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::UpstreamTimeout { .. } | Self::NetworkError { .. } => true,
            Self::PlatformApiError { status, .. } => is_transient_status(*status),
            Self::TargetCreationError { status, .. } => match status {
                Some(status) => is_transient_status(*status),
                None => true,
            },
            Self::SourceCloneError { .. } | Self::PushError { .. } => true,
            _ => false,
        }
    }

    /// Terminal state of a migration job that ended with this error
    pub fn migration_state(&self) -> Option<MigrationState> {
        match self {
            Self::TargetCreationError { .. } => Some(MigrationState::FailedAtCreate),
            Self::SourceCloneError { .. } => Some(MigrationState::FailedAtClone),
            Self::RetargetError { .. } => Some(MigrationState::FailedAtRetarget),
            Self::PushError { .. } => Some(MigrationState::FailedAtPush),
            Self::UpstreamTimeout {
                stage: Some(stage), ..
            } => Some(stage.failed_state()),
            _ => None,
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || status >= 500
}

impl From<std::io::Error> for MigratorError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for MigratorError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization_error_with_source("YAML serialization failed", error)
    }
}

impl From<serde_json::Error> for MigratorError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON serialization failed", error)
    }
}

impl From<crate::domain::value_objects::PlatformTypeError> for MigratorError {
    fn from(error: crate::domain::value_objects::PlatformTypeError) -> Self {
        match error {
            crate::domain::value_objects::PlatformTypeError::UnsupportedPlatform(name) => {
                Self::unsupported_platform(name)
            }
        }
    }
}

impl From<crate::domain::value_objects::RepoNameError> for MigratorError {
    fn from(error: crate::domain::value_objects::RepoNameError) -> Self {
        Self::validation_error("repo_name", error.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_api_error_display() {
        let error = MigratorError::platform_api_error(PlatformType::Github, 404, "Not Found");
        assert_eq!(error.to_string(), "github API returned HTTP 404: Not Found");
        assert_eq!(error.code(), "platform_api_error");
    }

    #[test]
    fn test_unsupported_platform_from_parse_error() {
        let err: MigratorError = "bitbucket"
            .parse::<PlatformType>()
            .unwrap_err()
            .into();
        assert!(matches!(err, MigratorError::UnsupportedPlatform { ref name } if name == "bitbucket"));
        assert_eq!(err.code(), "unsupported_platform");
    }

    #[test]
    fn test_retriable_classification() {
        assert!(MigratorError::upstream_timeout("GET /groups", 30).is_retriable());
        assert!(MigratorError::platform_api_error(PlatformType::Gitlab, 503, "").is_retriable());
        assert!(MigratorError::platform_api_error(PlatformType::Gitlab, 429, "").is_retriable());
        assert!(!MigratorError::platform_api_error(PlatformType::Gitlab, 401, "").is_retriable());

        let collision = MigratorError::target_creation_error(
            PlatformType::Github,
            "api",
            "name already exists on this account",
            Some(422),
        );
        assert!(!collision.is_retriable());
        assert!(!MigratorError::unsupported_platform("svn").is_retriable());
    }

    #[test]
    fn test_migration_state_mapping() {
        assert_eq!(
            MigratorError::push_error(PushStage::Branches, "rejected").migration_state(),
            Some(MigrationState::FailedAtPush)
        );
        assert_eq!(
            MigratorError::source_clone_error("https://x/y.git", "not found").migration_state(),
            Some(MigrationState::FailedAtClone)
        );
        assert_eq!(
            MigratorError::upstream_timeout_during(MigrationStage::MirrorClone, "git clone", 120)
                .migration_state(),
            Some(MigrationState::FailedAtClone)
        );
        assert_eq!(MigratorError::upstream_timeout("GET", 30).migration_state(), None);
    }

    #[test]
    fn test_push_error_names_stage() {
        let error = MigratorError::push_error(PushStage::Tags, "remote rejected");
        assert_eq!(
            error.to_string(),
            "Failed to push tags to the target repository: remote rejected"
        );
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MigratorError = io_error.into();
        assert!(matches!(error, MigratorError::FileSystemError { .. }));
    }
}
