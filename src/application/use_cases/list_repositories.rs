use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::common::error::MigratorError;
use crate::common::result::MigratorResult;
use crate::domain::value_objects::PlatformType;
use crate::infrastructure::filesystem::{RecordOutcome, RepositoryIndexStore};
use crate::infrastructure::platforms::{ListOptions, ListScope, PlatformRegistry, RepositoryPage};

/// Upper bound accepted for `per_page` by every supported platform
pub const MAX_PER_PAGE: u32 = 100;

/// リポジトリ列挙のリクエスト
#[derive(Debug, Clone, Default)]
pub struct ListRepositoriesRequest {
    /// プラットフォーム名（gitlab / github / azure）
    pub platform: String,

    /// 列挙スコープ（Noneなら設定の既定値）
    pub scope: Option<String>,

    /// 全ページを辿るか
    pub paginate: bool,

    /// 1ページあたりの件数（Noneなら設定の既定値）
    pub per_page: Option<u32>,

    /// 結果をインデックスに記録するか
    pub index: bool,
}

impl ListRepositoriesRequest {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    pub fn with_per_page(mut self, per_page: Option<u32>) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }
}

/// 列挙結果
#[derive(Debug, Clone, Serialize)]
pub struct ListRepositoriesResult {
    pub platform: PlatformType,

    #[serde(flatten)]
    pub page: RepositoryPage,

    /// `index` 指定時のみ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<RecordOutcome>,
}

/// リポジトリ列挙ユースケース
pub struct ListRepositoriesUseCase {
    registry: Arc<PlatformRegistry>,
    index: RepositoryIndexStore,
    default_per_page: u32,
}

impl ListRepositoriesUseCase {
    pub fn new(registry: Arc<PlatformRegistry>, index: RepositoryIndexStore, default_per_page: u32) -> Self {
        Self {
            registry,
            index,
            default_per_page,
        }
    }

    /// 列挙を実行する
    ///
    /// インデックスへの記録は列挙が成功した後にだけ行う。
    pub async fn execute(&self, request: &ListRepositoriesRequest) -> MigratorResult<ListRepositoriesResult> {
        let adapter = self.registry.resolve(&request.platform)?;
        let platform = adapter.platform();

        let per_page = request.per_page.unwrap_or(self.default_per_page);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(MigratorError::validation_error(
                "per_page",
                format!("must be between 1 and {}", MAX_PER_PAGE),
                Some(per_page.to_string()),
            ));
        }

        let scope = match request.scope.clone() {
            Some(scope) => ListScope::from_option(Some(scope)),
            None => adapter.default_scope(),
        };
        let options = ListOptions {
            paginate: request.paginate,
            per_page,
        };

        debug!(platform = %platform, scope = ?scope, paginate = options.paginate, per_page, "Listing repositories");
        let page = adapter.list_repositories(&scope, &options).await?;
        info!(
            platform = %platform,
            count = page.repositories.len(),
            has_more = page.continuation.is_some(),
            "Listed repositories"
        );

        let indexed = if request.index {
            Some(self.index.record(&page.repositories).await?)
        } else {
            None
        };

        Ok(ListRepositoriesResult {
            platform,
            page,
            indexed,
        })
    }
}
