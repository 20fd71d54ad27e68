use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// リポジトリ名関連のエラー
#[derive(Debug, Error, PartialEq)]
pub enum RepoNameError {
    #[error("Repository name is empty")]
    Empty,

    #[error("Repository name too long: {0} characters (max 100)")]
    TooLong(usize),

    #[error("Invalid characters in repository name: {0}")]
    InvalidCharacters(String),

    #[error("Reserved repository name: {0}")]
    Reserved(String),
}

const MAX_LENGTH: usize = 100;

fn allowed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid"))
}

/// 移行先リポジトリ名の値オブジェクト
///
/// 3つのプラットフォームすべてで作成可能な名前に限定する。
/// ローカルの作業ディレクトリ名にも使われるため、パス区切り文字は許可しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    /// 新しいRepoNameインスタンスを作成
    pub fn new(name: &str) -> Result<Self, RepoNameError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(RepoNameError::Empty);
        }

        let length = trimmed.chars().count();
        if length > MAX_LENGTH {
            return Err(RepoNameError::TooLong(length));
        }

        if trimmed == "." || trimmed == ".." {
            return Err(RepoNameError::Reserved(trimmed.to_string()));
        }

        if !allowed_pattern().is_match(trimmed) {
            return Err(RepoNameError::InvalidCharacters(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// 名前の文字列表現
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RepoName {
    type Error = RepoNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RepoName::new(&value)
    }
}

impl From<RepoName> for String {
    fn from(name: RepoName) -> Self {
        name.0
    }
}
