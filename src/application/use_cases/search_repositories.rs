use tracing::debug;

use crate::common::error::MigratorError;
use crate::common::result::MigratorResult;
use crate::domain::entities::RepositorySummary;
use crate::infrastructure::filesystem::RepositoryIndexStore;

/// インデックス済みリポジトリの名前検索
pub struct SearchRepositoriesUseCase {
    index: RepositoryIndexStore,
}

impl SearchRepositoriesUseCase {
    pub fn new(index: RepositoryIndexStore) -> Self {
        Self { index }
    }

    /// 名前に `query` を含むリポジトリを返す（大文字小文字は区別しない）
    pub async fn execute(&self, query: &str) -> MigratorResult<Vec<RepositorySummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MigratorError::validation_error("query", "must not be empty", None));
        }

        let hits = self.index.search(query).await?;
        debug!(query, hits = hits.len(), index = %self.index.path().display(), "Searched repository index");
        Ok(hits)
    }
}
