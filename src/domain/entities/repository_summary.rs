use crate::domain::value_objects::platform_type::PlatformType;
use serde::{Deserialize, Serialize};

/// プラットフォーム非依存のリポジトリ情報
///
/// 各プラットフォームのアダプタがネイティブのJSONレコードから生成する。
/// 生成後は変更されない。インデックスとCLIのJSON出力は同じ形を共有する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// プラットフォーム固有のID（GitHub/GitLabは数値、AzureはGUID）
    pub id: String,

    /// リポジトリ名
    pub name: String,

    /// 説明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 名前空間を含むパス（例: group/subgroup/repo）
    pub path: String,

    /// 作成日時（プラットフォームの表記のまま）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// デフォルトブランチ名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    /// Web UIのURL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// SSHクローンURL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_url: Option<String>,

    /// HTTPSクローンURL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,

    /// 最終アクティビティ日時
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<String>,

    /// 取得元プラットフォーム
    pub platform: PlatformType,
}

impl RepositorySummary {
    /// 必須フィールドのみで新しいインスタンスを作成
    pub fn new(
        platform: PlatformType,
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            path: path.into(),
            created_at: None,
            default_branch: None,
            web_url: None,
            ssh_url: None,
            http_url: None,
            last_activity_at: None,
            platform,
        }
    }

    /// 説明を設定
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    /// 作成日時と最終アクティビティ日時を設定
    pub fn with_timestamps(mut self, created_at: Option<String>, last_activity_at: Option<String>) -> Self {
        self.created_at = created_at;
        self.last_activity_at = last_activity_at;
        self
    }

    /// デフォルトブランチを設定（`refs/heads/` 接頭辞は取り除く）
    pub fn with_default_branch(mut self, branch: Option<String>) -> Self {
        self.default_branch = branch.map(|b| match b.strip_prefix("refs/heads/") {
            Some(short) => short.to_string(),
            None => b,
        });
        self
    }

    /// Web/SSH/HTTPSのURLを設定
    pub fn with_urls(
        mut self,
        web_url: Option<String>,
        ssh_url: Option<String>,
        http_url: Option<String>,
    ) -> Self {
        self.web_url = web_url;
        self.ssh_url = ssh_url;
        self.http_url = http_url;
        self
    }

    /// インデックスで使う一意キー
    pub fn index_key(&self) -> (PlatformType, &str) {
        (self.platform, self.id.as_str())
    }

    /// 名前に部分文字列が含まれるか（大文字小文字を区別しない）
    pub fn name_contains(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}
