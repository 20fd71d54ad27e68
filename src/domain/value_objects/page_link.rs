use serde::{Deserialize, Serialize};
use std::fmt;

/// ページネーションリンクの関係（rel属性）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkRelation {
    /// 次のページ
    Next,
    /// 前のページ
    Prev,
    /// 最初のページ
    First,
    /// 最後のページ
    Last,
    /// 上記以外の関係（そのまま保持する）
    Other(String),
}

impl LinkRelation {
    /// rel属性の文字列から生成
    pub fn parse(rel: &str) -> Self {
        match rel {
            "next" => LinkRelation::Next,
            "prev" => LinkRelation::Prev,
            "first" => LinkRelation::First,
            "last" => LinkRelation::Last,
            other => LinkRelation::Other(other.to_string()),
        }
    }

    /// rel属性の文字列表現
    pub fn as_str(&self) -> &str {
        match self {
            LinkRelation::Next => "next",
            LinkRelation::Prev => "prev",
            LinkRelation::First => "first",
            LinkRelation::Last => "last",
            LinkRelation::Other(rel) => rel.as_str(),
        }
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LinkRelation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LinkRelation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rel = String::deserialize(deserializer)?;
        Ok(LinkRelation::parse(&rel))
    }
}

/// ページネーションメタデータから抽出した `{url, rel}` の組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    /// ページのURL（公開ホストに書き換え済み）
    pub url: String,

    /// リンクの関係
    #[serde(rename = "rel")]
    pub relation: LinkRelation,
}

impl PageLink {
    /// 新しいPageLinkを作成
    pub fn new(url: impl Into<String>, relation: LinkRelation) -> Self {
        Self {
            url: url.into(),
            relation,
        }
    }

    /// 次ページへのリンクかどうか
    pub fn is_next(&self) -> bool {
        self.relation == LinkRelation::Next
    }
}
