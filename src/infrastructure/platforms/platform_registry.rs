use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::azure_platform::AzurePlatform;
use super::github_platform::GithubPlatform;
use super::gitlab_platform::GitlabPlatform;
use super::platform_interface::DirectoryAdapter;
use crate::common::error::MigratorError;
use crate::common::result::{MigratorResult, ResultExt};
use crate::domain::value_objects::PlatformType;
use crate::infrastructure::filesystem::config_store::AppConfig;
use crate::infrastructure::http::{HttpTransport, ReqwestTransport};

/// Table of directory adapters keyed by platform
///
/// Platform names are resolved here and nowhere else, so an unknown tag is
/// reported as `UnsupportedPlatform` before any configuration is consulted.
pub struct PlatformRegistry {
    adapters: BTreeMap<PlatformType, Arc<dyn DirectoryAdapter>>,
    missing: BTreeMap<PlatformType, String>,
}

impl PlatformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            adapters: BTreeMap::new(),
            missing: BTreeMap::new(),
        }
    }

    /// Build adapters for every platform the configuration has credentials for
    pub fn from_config(config: &AppConfig) -> MigratorResult<Self> {
        let transport = ReqwestTransport::with_timeout(Duration::from_secs(config.http_timeout_secs))
            .with_internal_error("Failed to build HTTP client")?;
        Ok(Self::from_config_with_transport(config, Arc::new(transport)))
    }

    /// Same as [`from_config`](Self::from_config) with an explicit transport
    pub fn from_config_with_transport(config: &AppConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let mut registry = Self::new();

        for platform in PlatformType::ALL {
            if let Err(e) = config.require_platform(platform) {
                debug!(platform = %platform, reason = %e, "Platform not configured");
                registry.missing.insert(platform, e.to_string());
                continue;
            }

            let adapter: Arc<dyn DirectoryAdapter> = match platform {
                PlatformType::Gitlab => Arc::new(GitlabPlatform::new(
                    &config.gitlab,
                    &config.public_host,
                    transport.clone(),
                )),
                PlatformType::Github => Arc::new(GithubPlatform::new(
                    &config.github,
                    &config.public_host,
                    transport.clone(),
                )),
                PlatformType::Azure => match AzurePlatform::new(&config.azure, transport.clone()) {
                    Ok(adapter) => Arc::new(adapter),
                    Err(e) => {
                        registry.missing.insert(platform, e.to_string());
                        continue;
                    }
                },
            };
            registry.register(adapter);
        }

        registry
    }

    /// Register (or replace) the adapter for its platform
    pub fn register(&mut self, adapter: Arc<dyn DirectoryAdapter>) {
        let platform = adapter.platform();
        self.missing.remove(&platform);
        self.adapters.insert(platform, adapter);
    }

    /// Resolve a user-supplied platform name
    pub fn resolve(&self, name: &str) -> MigratorResult<Arc<dyn DirectoryAdapter>> {
        let platform: PlatformType = name.parse()?;
        self.get(platform)
    }

    pub fn get(&self, platform: PlatformType) -> MigratorResult<Arc<dyn DirectoryAdapter>> {
        if let Some(adapter) = self.adapters.get(&platform) {
            return Ok(adapter.clone());
        }

        let reason = self
            .missing
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| "no adapter registered".to_string());
        Err(MigratorError::platform_not_configured(platform, reason))
    }

    /// Platforms with a registered adapter
    pub fn platforms(&self) -> Vec<PlatformType> {
        self.adapters.keys().copied().collect()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
