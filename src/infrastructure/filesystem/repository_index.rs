use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs as async_fs;
use tracing::{debug, info};

use crate::common::error::MigratorError;
use crate::domain::entities::RepositorySummary;

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Repository index related errors
#[derive(Debug, Error)]
pub enum RepositoryIndexError {
    #[error("Index file read failed: {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index file write failed: {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index file is not valid JSON: {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Index serialization failed: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

impl From<RepositoryIndexError> for MigratorError {
    fn from(error: RepositoryIndexError) -> Self {
        match error {
            RepositoryIndexError::ReadFailed { path, source } => {
                MigratorError::filesystem_error_with_source("Failed to read repository index", Some(path), source)
            }
            RepositoryIndexError::WriteFailed { path, source } => {
                MigratorError::filesystem_error_with_source("Failed to write repository index", Some(path), source)
            }
            RepositoryIndexError::ParseFailed { path, source } => MigratorError::serialization_error_with_source(
                format!("Repository index at {} is corrupt", path.display()),
                source,
            ),
            other @ RepositoryIndexError::UnsupportedVersion { .. } => {
                MigratorError::serialization_error_with_source("Unsupported repository index", other)
            }
            RepositoryIndexError::SerializeFailed(source) => {
                MigratorError::serialization_error_with_source("Failed to serialize repository index", source)
            }
        }
    }
}

/// Index file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub repositories: Vec<RepositorySummary>,
}

impl Default for IndexDocument {
    fn default() -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            updated_at: Utc::now(),
            repositories: Vec::new(),
        }
    }
}

/// Counts returned by [`RepositoryIndexStore::record`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub inserted: usize,
    pub updated: usize,
}

/// ローカルのリポジトリインデックス（JSONファイル）
///
/// `(platform, id)` をキーにupsertする。書き込みは一時ファイルに書いてから
/// renameするので、途中で落ちても既存のインデックスは壊れない。
#[derive(Debug, Clone)]
pub struct RepositoryIndexStore {
    path: PathBuf,
}

impl RepositoryIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// インデックスを読み込む（ファイルが無ければ空）
    pub async fn load(&self) -> Result<IndexDocument, RepositoryIndexError> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Index file does not exist yet");
                return Ok(IndexDocument::default());
            }
            Err(source) => {
                return Err(RepositoryIndexError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let document: IndexDocument =
            serde_json::from_str(&content).map_err(|source| RepositoryIndexError::ParseFailed {
                path: self.path.clone(),
                source,
            })?;

        if document.version != INDEX_FORMAT_VERSION {
            return Err(RepositoryIndexError::UnsupportedVersion {
                found: document.version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        Ok(document)
    }

    /// サマリーをupsertして保存する
    pub async fn record(&self, summaries: &[RepositorySummary]) -> Result<RecordOutcome, RepositoryIndexError> {
        let mut document = self.load().await?;
        let mut outcome = RecordOutcome::default();

        for summary in summaries {
            let existing = document
                .repositories
                .iter_mut()
                .find(|r| r.index_key() == summary.index_key());
            match existing {
                Some(slot) => {
                    *slot = summary.clone();
                    outcome.updated += 1;
                }
                None => {
                    document.repositories.push(summary.clone());
                    outcome.inserted += 1;
                }
            }
        }

        document.updated_at = Utc::now();
        self.save(&document).await?;

        info!(
            path = %self.path.display(),
            inserted = outcome.inserted,
            updated = outcome.updated,
            "Repository index updated"
        );
        Ok(outcome)
    }

    /// 名前の部分一致で検索する（大文字小文字を区別しない）
    pub async fn search(&self, query: &str) -> Result<Vec<RepositorySummary>, RepositoryIndexError> {
        let document = self.load().await?;
        Ok(document
            .repositories
            .into_iter()
            .filter(|r| r.name_contains(query))
            .collect())
    }

    async fn save(&self, document: &IndexDocument) -> Result<(), RepositoryIndexError> {
        let write_err = |source| RepositoryIndexError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        async_fs::write(&tmp_path, content).await.map_err(write_err)?;
        async_fs::rename(&tmp_path, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}
