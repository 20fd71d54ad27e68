use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::common::error::MigratorError;
use crate::domain::entities::{MigrationStage, RepositorySummary};
use crate::domain::value_objects::{PageLink, PlatformType, RepoName};
use crate::infrastructure::http::HttpMethod;

/// プラットフォーム操作のエラー
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{platform} API returned HTTP {status}: {body}")]
    Api {
        platform: PlatformType,
        status: u16,
        body: String,
    },

    #[error("{platform} request timed out after {timeout_secs} seconds: {} {url}", method.as_str())]
    Timeout {
        platform: PlatformType,
        method: HttpMethod,
        url: String,
        timeout_secs: u64,
    },

    #[error("{platform} request failed: {message}")]
    Transport {
        platform: PlatformType,
        message: String,
        url: String,
    },

    #[error("Failed to decode {platform} response: {message}")]
    Decode {
        platform: PlatformType,
        message: String,
    },

    #[error("Failed to resolve sub-scopes of '{scope}': {source}")]
    ScopeResolution {
        scope: String,
        #[source]
        source: Box<PlatformError>,
    },

    #[error("Invalid {platform} request: {message}")]
    InvalidRequest {
        platform: PlatformType,
        field: String,
        message: String,
    },
}

impl PlatformError {
    pub fn invalid_request(
        platform: PlatformType,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            platform,
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTPステータス（APIエラーの場合のみ）
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::ScopeResolution { source, .. } => source.status(),
            _ => None,
        }
    }

    /// 移行先リポジトリ作成の失敗として変換
    ///
    /// タイムアウトはステージ付きの `UpstreamTimeout` に、それ以外は
    /// `TargetCreationError` になる。
    pub fn into_target_creation_error(self, platform: PlatformType, repo_name: &RepoName) -> MigratorError {
        match self {
            Self::Timeout {
                method,
                url,
                timeout_secs,
                ..
            } => MigratorError::upstream_timeout_during(
                MigrationStage::CreateTarget,
                format!("{} {}", method.as_str(), url),
                timeout_secs,
            ),
            Self::InvalidRequest { field, message, .. } => {
                MigratorError::validation_error(field, message, None)
            }
            Self::Api { status, body, .. } => MigratorError::target_creation_error(
                platform,
                repo_name.as_str(),
                body,
                Some(status),
            ),
            other => {
                MigratorError::target_creation_error(platform, repo_name.as_str(), other.to_string(), None)
            }
        }
    }
}

impl From<PlatformError> for MigratorError {
    fn from(error: PlatformError) -> Self {
        match error {
            PlatformError::Api {
                platform,
                status,
                body,
            } => MigratorError::platform_api_error(platform, status, body),
            PlatformError::Timeout {
                platform,
                method,
                url,
                timeout_secs,
            } => MigratorError::upstream_timeout(format!("{} {} {}", platform, method.as_str(), url), timeout_secs),
            PlatformError::Transport { message, url, .. } => {
                MigratorError::network_error(message, Some(url))
            }
            PlatformError::Decode { platform, message } => MigratorError::SerializationError {
                message: format!("{} response: {}", platform, message),
                source: None,
            },
            PlatformError::ScopeResolution { scope, source } => {
                MigratorError::scope_resolution_error(scope, source.to_string())
            }
            PlatformError::InvalidRequest { field, message, .. } => {
                MigratorError::validation_error(field, message, None)
            }
        }
    }
}

/// 列挙のスコープ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// 名前付きのコンテナ（GitLabグループ、GitHub組織、Azureプロジェクト）
    Named(String),
    /// 認証主体から見えるすべて
    All,
}

impl ListScope {
    pub fn from_option(scope: Option<String>) -> Self {
        match scope.filter(|s| !s.trim().is_empty()) {
            Some(name) => Self::Named(name.trim().to_string()),
            None => Self::All,
        }
    }
}

/// 列挙オプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// trueなら最後のページまで辿る
    pub paginate: bool,
    /// 1ページあたりの件数
    pub per_page: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            paginate: false,
            per_page: 20,
        }
    }
}

/// 列挙結果
///
/// 単一ページモードでは `links` と `continuation` に次ページの手がかりが入る。
/// 全ページモードではどちらも空。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryPage {
    pub repositories: Vec<RepositorySummary>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<PageLink>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl RepositoryPage {
    pub fn complete(repositories: Vec<RepositorySummary>) -> Self {
        Self {
            repositories,
            links: Vec::new(),
            continuation: None,
        }
    }
}

/// 移行先リポジトリを作成する場所
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateScope {
    pub organization: Option<String>,
    pub project: Option<String>,
}

/// ホスティングプラットフォームのディレクトリ操作
///
/// 列挙とリポジトリ作成の2つの操作を提供する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryAdapter: Send + Sync {
    /// このアダプタのプラットフォーム
    fn platform(&self) -> PlatformType;

    /// 設定で与えられた既定の列挙スコープ
    fn default_scope(&self) -> ListScope;

    /// リポジトリを列挙する
    async fn list_repositories(
        &self,
        scope: &ListScope,
        options: &ListOptions,
    ) -> Result<RepositoryPage, PlatformError>;

    /// 空のリポジトリを作成し、プッシュ用のHTTPSクローンURLを返す
    async fn create_repository(
        &self,
        name: &RepoName,
        scope: &CreateScope,
    ) -> Result<String, PlatformError>;
}
