use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::common::error::MigratorError;
use crate::domain::value_objects::{PlatformType, Secret};

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "repomigrator.yaml";

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Configuration file read failed: {0}")]
    ReadFailed(String),

    #[error("YAML parsing failed: {0}")]
    YamlParsingFailed(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnvValue { name: String, value: String },
}

impl From<ConfigStoreError> for MigratorError {
    fn from(error: ConfigStoreError) -> Self {
        let message = error.to_string();
        MigratorError::config_error_with_source(message, error)
    }
}

/// GitLab connection settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct GitlabSettings {
    pub token: Secret,

    /// Root group for enumeration
    #[validate(length(min = 1, max = 255))]
    pub group_id: Option<String>,

    #[validate(url)]
    pub api_base: String,
}

impl Default for GitlabSettings {
    fn default() -> Self {
        Self {
            token: Secret::default(),
            group_id: None,
            api_base: "https://gitlab.com/api/v4".to_string(),
        }
    }
}

/// GitHub connection settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct GithubSettings {
    pub token: Secret,

    #[validate(length(min = 1, max = 255))]
    pub organization: Option<String>,

    #[validate(url)]
    pub api_base: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: Secret::default(),
            organization: None,
            api_base: "https://api.github.com".to_string(),
        }
    }
}

/// Azure DevOps connection settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct AzureSettings {
    pub token: Secret,

    #[validate(length(min = 1, max = 255))]
    pub organization: Option<String>,

    /// Default project for repository creation
    #[validate(length(min = 1, max = 255))]
    pub project: Option<String>,

    #[validate(url)]
    pub api_base: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            token: Secret::default(),
            organization: None,
            project: None,
            api_base: "https://dev.azure.com".to_string(),
        }
    }
}

/// Application configuration
///
/// Built once at startup from an optional YAML file plus environment
/// variables, then passed around by reference.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub gitlab: GitlabSettings,

    #[validate(nested)]
    pub github: GithubSettings,

    #[validate(nested)]
    pub azure: AzureSettings,

    /// Hostname that replaces the upstream API host in returned page links
    #[validate(length(min = 1, max = 255), custom(function = "validate_public_host"))]
    pub public_host: String,

    /// Parent directory for per-job scratch directories
    pub work_dir: PathBuf,

    /// JSON file backing the repository index
    pub index_path: PathBuf,

    #[validate(range(min = 1, max = 600))]
    pub http_timeout_secs: u64,

    #[validate(range(min = 1, max = 86400))]
    pub git_timeout_secs: u64,

    #[validate(range(min = 1, max = 100))]
    pub default_per_page: u32,

    #[validate(length(min = 1))]
    pub git_executable: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gitlab: GitlabSettings::default(),
            github: GithubSettings::default(),
            azure: AzureSettings::default(),
            public_host: "localhost:5000".to_string(),
            work_dir: std::env::temp_dir(),
            index_path: PathBuf::from("repositories.json"),
            http_timeout_secs: 30,
            git_timeout_secs: 120,
            default_per_page: 20,
            git_executable: "git".to_string(),
        }
    }
}

fn validate_public_host(host: &str) -> Result<(), ValidationError> {
    if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
        let mut error = ValidationError::new("public_host");
        error.message = Some("must be a bare host[:port] without scheme or path".into());
        return Err(error);
    }
    Ok(())
}

impl AppConfig {
    /// Override values from environment variables
    ///
    /// Empty variables are treated as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigStoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITLAB_TOKEN") {
            self.gitlab.token = Secret::new(token);
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Secret::new(token);
        }
        if let Some(token) = get("AZURE_TOKEN") {
            self.azure.token = Secret::new(token);
        }
        if let Some(group) = get("GITLAB_GROUP_ID") {
            self.gitlab.group_id = Some(group.trim().to_string());
        }
        if let Some(org) = get("GITHUB_ORGANIZATION") {
            self.github.organization = Some(org.trim().to_string());
        }
        if let Some(org) = get("AZURE_ORGANIZATION") {
            self.azure.organization = Some(org.trim().to_string());
        }
        if let Some(project) = get("AZURE_PROJECT") {
            self.azure.project = Some(project.trim().to_string());
        }
        if let Some(host) = get("REPOMIGRATOR_PUBLIC_HOST") {
            self.public_host = host.trim().to_string();
        }
        if let Some(dir) = get("REPOMIGRATOR_WORK_DIR") {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("REPOMIGRATOR_INDEX_PATH") {
            self.index_path = PathBuf::from(path);
        }
        if let Some(value) = get("REPOMIGRATOR_GIT_TIMEOUT") {
            self.git_timeout_secs = value
                .trim()
                .parse()
                .map_err(|_| ConfigStoreError::InvalidEnvValue {
                    name: "REPOMIGRATOR_GIT_TIMEOUT".to_string(),
                    value,
                })?;
        }

        Ok(())
    }

    /// Check that the credentials a platform needs are present
    pub fn require_platform(&self, platform: PlatformType) -> Result<(), MigratorError> {
        let token = match platform {
            PlatformType::Gitlab => &self.gitlab.token,
            PlatformType::Github => &self.github.token,
            PlatformType::Azure => &self.azure.token,
        };
        if token.is_empty() {
            return Err(MigratorError::platform_not_configured(
                platform,
                format!("{} is not set", token_variable(platform)),
            ));
        }
        if platform == PlatformType::Azure && self.azure.organization.is_none() {
            return Err(MigratorError::platform_not_configured(
                platform,
                "AZURE_ORGANIZATION is not set",
            ));
        }
        Ok(())
    }
}

/// Environment variable carrying the token of a platform
pub fn token_variable(platform: PlatformType) -> &'static str {
    match platform {
        PlatformType::Gitlab => "GITLAB_TOKEN",
        PlatformType::Github => "GITHUB_TOKEN",
        PlatformType::Azure => "AZURE_TOKEN",
    }
}

/// Configuration store for the YAML configuration file
pub struct ConfigStore {
    default_path: PathBuf,
}

impl ConfigStore {
    /// Create a store that falls back to `repomigrator.yaml` in the working directory
    pub fn new() -> Self {
        Self {
            default_path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn with_default_path(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    /// Load configuration from the process environment
    ///
    /// An explicit path must exist. Without one, the default file is read if
    /// present and built-in defaults are used otherwise.
    pub fn load(&self, explicit_path: Option<&Path>) -> Result<AppConfig, ConfigStoreError> {
        self.load_with_env(explicit_path, |name| std::env::var(name).ok())
    }

    pub fn load_with_env<F>(&self, explicit_path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigStoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit_path {
            Some(path) => self.read_config(path)?,
            None if self.default_path.exists() => self.read_config(&self.default_path)?,
            None => {
                debug!("No configuration file, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides(lookup)?;
        self.validate_config(&config)?;
        Ok(config)
    }

    /// Read configuration from a YAML file without applying the environment
    pub fn read_config<P: AsRef<Path>>(&self, config_path: P) -> Result<AppConfig, ConfigStoreError> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConfigStoreError::ConfigFileNotFound(
                config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(config_path)
            .map_err(|e| ConfigStoreError::ReadFailed(format!("{}: {}", config_path.display(), e)))?;

        debug!(path = %config_path.display(), "Read configuration file");

        if contents.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| ConfigStoreError::YamlParsingFailed(e.to_string()))
    }

    /// Validate configuration
    pub fn validate_config(&self, config: &AppConfig) -> Result<(), ConfigStoreError> {
        config
            .validate()
            .map_err(|e| ConfigStoreError::ValidationFailed(e.to_string()))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
