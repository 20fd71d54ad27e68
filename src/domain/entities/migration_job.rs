use crate::domain::value_objects::{platform_type::PlatformType, repo_name::RepoName};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 移行リクエストから組み立てる1回分のジョブ
///
/// 永続化されず、再開もできない。オーケストレータが同期的に消費する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationJob {
    /// 移行元リポジトリのクローンURL
    pub source_repo_url: String,

    /// 移行元プラットフォーム（ログ用途のみ）
    pub source_platform: PlatformType,

    /// 移行先プラットフォーム
    pub target_platform: PlatformType,

    /// 移行先に作成するリポジトリ名
    pub repo_name: RepoName,

    /// 移行先の組織/名前空間（GitHubの組織、GitLabの名前空間ID）
    pub organization: Option<String>,

    /// 移行先のプロジェクト（Azureのみ必須）
    pub project: Option<String>,
}

impl MigrationJob {
    /// 新しいMigrationJobを作成
    pub fn new(
        source_repo_url: impl Into<String>,
        source_platform: PlatformType,
        target_platform: PlatformType,
        repo_name: RepoName,
    ) -> Self {
        Self {
            source_repo_url: source_repo_url.into(),
            source_platform,
            target_platform,
            repo_name,
            organization: None,
            project: None,
        }
    }

    /// 組織を設定
    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization.filter(|o| !o.trim().is_empty());
        self
    }

    /// プロジェクトを設定
    pub fn with_project(mut self, project: Option<String>) -> Self {
        self.project = project.filter(|p| !p.trim().is_empty());
        self
    }
}

/// プッシュ処理の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStage {
    /// `git push --all`
    Branches,
    /// `git push --tags`
    Tags,
}

impl fmt::Display for PushStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushStage::Branches => f.write_str("branches"),
            PushStage::Tags => f.write_str("tags"),
        }
    }
}

/// 移行ワークフローの各ステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStage {
    CreateTarget,
    MirrorClone,
    RetargetRemote,
    Push(PushStage),
    Cleanup,
}

impl MigrationStage {
    /// このステップで失敗した場合の終了状態
    pub fn failed_state(&self) -> MigrationState {
        match self {
            MigrationStage::CreateTarget => MigrationState::FailedAtCreate,
            MigrationStage::MirrorClone => MigrationState::FailedAtClone,
            MigrationStage::RetargetRemote => MigrationState::FailedAtRetarget,
            MigrationStage::Push(_) => MigrationState::FailedAtPush,
            // cleanup failures never fail the job
            MigrationStage::Cleanup => MigrationState::Succeeded,
        }
    }
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStage::CreateTarget => f.write_str("create target"),
            MigrationStage::MirrorClone => f.write_str("mirror clone"),
            MigrationStage::RetargetRemote => f.write_str("retarget remote"),
            MigrationStage::Push(stage) => write!(f, "push {}", stage),
            MigrationStage::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// ジョブの終了状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MigrationState {
    Succeeded,
    FailedAtCreate,
    FailedAtClone,
    FailedAtRetarget,
    FailedAtPush,
}

impl MigrationState {
    pub fn is_success(&self) -> bool {
        matches!(self, MigrationState::Succeeded)
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MigrationState::Succeeded => "Succeeded",
            MigrationState::FailedAtCreate => "FailedAtCreate",
            MigrationState::FailedAtClone => "FailedAtClone",
            MigrationState::FailedAtRetarget => "FailedAtRetarget",
            MigrationState::FailedAtPush => "FailedAtPush",
        };
        f.write_str(label)
    }
}

/// 成功したジョブの結果
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// 終了状態（成功時は常に `Succeeded`）
    pub state: MigrationState,

    /// 移行先リポジトリ名
    pub repo_name: String,

    /// 移行先プラットフォーム
    pub target_platform: PlatformType,

    /// 作成された移行先リポジトリのクローンURL
    pub target_url: String,

    /// 実行されたステップ（実行順）
    pub steps: Vec<MigrationStage>,

    /// 所要時間
    #[serde(skip)]
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_builder_drops_blank_scopes() {
        let job = MigrationJob::new(
            "https://gitlab.com/team/api.git",
            PlatformType::Gitlab,
            PlatformType::Azure,
            RepoName::new("api").unwrap(),
        )
        .with_organization(Some("  ".to_string()))
        .with_project(Some("Platform".to_string()));

        assert!(job.organization.is_none());
        assert_eq!(job.project.as_deref(), Some("Platform"));
    }

    #[test]
    fn test_stage_failed_states() {
        assert_eq!(MigrationStage::CreateTarget.failed_state(), MigrationState::FailedAtCreate);
        assert_eq!(MigrationStage::MirrorClone.failed_state(), MigrationState::FailedAtClone);
        assert_eq!(
            MigrationStage::RetargetRemote.failed_state(),
            MigrationState::FailedAtRetarget
        );
        assert_eq!(
            MigrationStage::Push(PushStage::Tags).failed_state(),
            MigrationState::FailedAtPush
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(MigrationStage::Push(PushStage::Branches).to_string(), "push branches");
        assert_eq!(MigrationState::FailedAtPush.to_string(), "FailedAtPush");
    }
}
