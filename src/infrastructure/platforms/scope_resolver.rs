use async_trait::async_trait;
use tracing::{debug, info};

use super::platform_interface::PlatformError;
use crate::domain::value_objects::ScopeSet;

/// 子スコープを列挙できるプラットフォーム（GitLabのサブグループ）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubScopeSource: Send + Sync {
    /// 直下の子スコープIDを全ページ分返す
    async fn list_child_scopes(&self, parent: &str) -> Result<Vec<String>, PlatformError>;
}

/// ルートスコープと直下の子スコープを平坦な集合に展開する
///
/// 展開は1階層のみ。孫スコープは辿らない。
pub struct ScopeResolver<'a> {
    source: &'a dyn SubScopeSource,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(source: &'a dyn SubScopeSource) -> Self {
        Self { source }
    }

    /// `[root] + children` を返す（重複は除く）
    ///
    /// 子スコープの取得に失敗した場合は `ScopeResolution` エラーになる。
    pub async fn resolve(&self, root: &str) -> Result<ScopeSet, PlatformError> {
        let mut scopes = ScopeSet::new(root);

        let children = self
            .source
            .list_child_scopes(root)
            .await
            .map_err(|e| PlatformError::ScopeResolution {
                scope: root.to_string(),
                source: Box::new(e),
            })?;

        for child in children {
            if !scopes.push_child(child.clone(), root) {
                debug!(scope = %child, "Skipping duplicate scope");
            }
        }

        info!(root = %root, scopes = scopes.len(), "Resolved enumeration scopes");
        Ok(scopes)
    }
}
