use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hosting platform a repository lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    /// gitlab.com (REST v4)
    Gitlab,
    /// github.com (REST v3)
    Github,
    /// Azure DevOps Services (REST 6.0 / 7.1)
    Azure,
}

impl PlatformType {
    /// All supported platforms, in registry order
    pub const ALL: [PlatformType; 3] = [PlatformType::Gitlab, PlatformType::Github, PlatformType::Azure];

    /// Canonical lowercase tag used on the command line and in the index
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformType::Gitlab => "gitlab",
            PlatformType::Github => "github",
            PlatformType::Azure => "azure",
        }
    }

    /// Human-readable platform name
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformType::Gitlab => "GitLab",
            PlatformType::Github => "GitHub",
            PlatformType::Azure => "Azure DevOps",
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformType {
    type Err = PlatformTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gitlab" => Ok(PlatformType::Gitlab),
            "github" => Ok(PlatformType::Github),
            "azure" => Ok(PlatformType::Azure),
            _ => Err(PlatformTypeError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Errors that can occur when working with platform types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformTypeError {
    /// The specified platform is not supported
    #[error("Unsupported platform: '{0}'. Supported platforms are: gitlab, github, azure")]
    UnsupportedPlatform(String),
}
