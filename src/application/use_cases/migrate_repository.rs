use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::common::result::MigratorResult;
use crate::domain::entities::{MigrationJob, MigrationReport, MigrationStage, MigrationState, PushStage};
use crate::domain::value_objects::redact_url_credentials;
use crate::infrastructure::filesystem::ScratchDir;
use crate::infrastructure::git::MirrorOperations;
use crate::infrastructure::platforms::{CreateScope, PlatformRegistry};

/// ミラー移行のオーケストレータ
///
/// 移行先の作成 -> `clone --mirror` -> `remote set-url` -> `push --all` ->
/// `push --tags` -> 後片付け、の順に実行する。どこで失敗しても一時ディレクトリは
/// 削除されるが、作成済みの移行先リポジトリは残る。
pub struct MigrationOrchestrator {
    registry: Arc<PlatformRegistry>,
    mirror: Arc<dyn MirrorOperations>,
    work_dir: PathBuf,
}

impl MigrationOrchestrator {
    pub fn new(registry: Arc<PlatformRegistry>, mirror: Arc<dyn MirrorOperations>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            mirror,
            work_dir: work_dir.into(),
        }
    }

    /// ジョブを実行する
    pub async fn execute(&self, job: &MigrationJob) -> MigratorResult<MigrationReport> {
        let started = Instant::now();
        info!(
            repo = %job.repo_name,
            source_platform = %job.source_platform,
            target_platform = %job.target_platform,
            "Starting migration"
        );

        let result = self.run(job, started).await;
        match &result {
            Ok(report) => info!(
                repo = %job.repo_name,
                target = %redact_url_credentials(&report.target_url),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Migration succeeded"
            ),
            Err(e) => error!(
                repo = %job.repo_name,
                state = ?e.migration_state(),
                code = e.code(),
                "Migration failed: {}",
                e
            ),
        }
        result
    }

    async fn run(&self, job: &MigrationJob, started: Instant) -> MigratorResult<MigrationReport> {
        let mut steps = Vec::new();

        let adapter = self.registry.get(job.target_platform)?;
        let scope = CreateScope {
            organization: job.organization.clone(),
            project: job.project.clone(),
        };

        steps.push(MigrationStage::CreateTarget);
        let target_url = adapter
            .create_repository(&job.repo_name, &scope)
            .await
            .map_err(|e| e.into_target_creation_error(job.target_platform, &job.repo_name))?;
        info!(repo = %job.repo_name, target = %redact_url_credentials(&target_url), "Created target repository");

        let scratch = ScratchDir::acquire(&self.work_dir, &job.repo_name)?;
        let transfer = self.transfer(job, &target_url, &scratch, &mut steps).await;

        steps.push(MigrationStage::Cleanup);
        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.release() {
            warn!(path = %scratch_path.display(), error = %e, "Failed to remove scratch directory");
        }

        transfer?;

        Ok(MigrationReport {
            state: MigrationState::Succeeded,
            repo_name: job.repo_name.to_string(),
            target_platform: job.target_platform,
            target_url,
            steps,
            elapsed: started.elapsed(),
        })
    }

    async fn transfer(
        &self,
        job: &MigrationJob,
        target_url: &str,
        scratch: &ScratchDir,
        steps: &mut Vec<MigrationStage>,
    ) -> MigratorResult<()> {
        let repo = scratch.repo_path();

        steps.push(MigrationStage::MirrorClone);
        self.mirror
            .clone_mirror(&job.source_repo_url, repo)
            .await
            .map_err(|e| e.into_stage_error(MigrationStage::MirrorClone, &job.source_repo_url))?;

        steps.push(MigrationStage::RetargetRemote);
        self.mirror
            .set_origin_url(repo, target_url)
            .await
            .map_err(|e| e.into_stage_error(MigrationStage::RetargetRemote, target_url))?;

        let branches = MigrationStage::Push(PushStage::Branches);
        steps.push(branches);
        self.mirror
            .push_branches(repo)
            .await
            .map_err(|e| e.into_stage_error(branches, target_url))?;

        let tags = MigrationStage::Push(PushStage::Tags);
        steps.push(tags);
        self.mirror
            .push_tags(repo)
            .await
            .map_err(|e| e.into_stage_error(tags, target_url))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::MigratorError;
    use crate::domain::value_objects::{PlatformType, RepoName};
    use crate::infrastructure::git::mirror::{MirrorError, MockMirrorOperations};
    use crate::infrastructure::platforms::{MockDirectoryAdapter, PlatformError};
    use mockall::predicate::*;
    use mockall::Sequence;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const TARGET_URL: &str = "https://github.com/acme/api.git";

    fn job() -> MigrationJob {
        MigrationJob::new(
            "https://gitlab.com/team/api.git",
            PlatformType::Gitlab,
            PlatformType::Github,
            RepoName::new("api").unwrap(),
        )
        .with_organization(Some("acme".to_string()))
    }

    fn registry_with_target(adapter: MockDirectoryAdapter) -> Arc<PlatformRegistry> {
        let mut registry = PlatformRegistry::new();
        registry.register(Arc::new(adapter));
        Arc::new(registry)
    }

    fn creating_adapter(seq: &mut Sequence) -> MockDirectoryAdapter {
        let mut adapter = MockDirectoryAdapter::new();
        adapter.expect_platform().return_const(PlatformType::Github);
        adapter
            .expect_create_repository()
            .withf(|name, scope| name.as_str() == "api" && scope.organization.as_deref() == Some("acme"))
            .times(1)
            .in_sequence(seq)
            .returning(|_, _| Ok(TARGET_URL.to_string()));
        adapter
    }

    fn fail(command: &str) -> MirrorError {
        MirrorError::CommandFailed {
            command: command.to_string(),
            exit_code: 128,
            stderr: "fatal: boom".to_string(),
        }
    }

    /// Records the clone destination and creates it, like `git clone` would
    fn cloning(seen: Arc<Mutex<Option<PathBuf>>>) -> impl Fn(&str, &Path) -> Result<(), MirrorError> + Send + 'static {
        move |_, dest| {
            std::fs::create_dir_all(dest).unwrap();
            *seen.lock().unwrap() = Some(dest.to_path_buf());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_happy_path_runs_steps_in_order() {
        let work = TempDir::new().unwrap();
        let mut seq = Sequence::new();
        let adapter = creating_adapter(&mut seq);
        let seen = Arc::new(Mutex::new(None));

        let mut mirror = MockMirrorOperations::new();
        mirror
            .expect_clone_mirror()
            .with(eq("https://gitlab.com/team/api.git"), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(cloning(seen.clone()));
        mirror
            .expect_set_origin_url()
            .with(always(), eq(TARGET_URL))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mirror
            .expect_push_branches()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mirror
            .expect_push_tags()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let orchestrator = MigrationOrchestrator::new(registry_with_target(adapter), Arc::new(mirror), work.path());
        let report = orchestrator.execute(&job()).await.unwrap();

        assert_eq!(report.state, MigrationState::Succeeded);
        assert_eq!(report.target_url, TARGET_URL);
        assert_eq!(
            report.steps,
            vec![
                MigrationStage::CreateTarget,
                MigrationStage::MirrorClone,
                MigrationStage::RetargetRemote,
                MigrationStage::Push(PushStage::Branches),
                MigrationStage::Push(PushStage::Tags),
                MigrationStage::Cleanup,
            ]
        );

        let clone_dest = seen.lock().unwrap().clone().unwrap();
        assert!(clone_dest.ends_with("api.git"));
        assert!(!clone_dest.exists());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_branch_push_failure_skips_tags_and_cleans_up() {
        let work = TempDir::new().unwrap();
        let mut seq = Sequence::new();
        let adapter = creating_adapter(&mut seq);
        let seen = Arc::new(Mutex::new(None));

        let mut mirror = MockMirrorOperations::new();
        mirror
            .expect_clone_mirror()
            .times(1)
            .in_sequence(&mut seq)
            .returning(cloning(seen.clone()));
        mirror
            .expect_set_origin_url()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mirror
            .expect_push_branches()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(fail("git push --all origin")));
        mirror.expect_push_tags().never();

        let orchestrator = MigrationOrchestrator::new(registry_with_target(adapter), Arc::new(mirror), work.path());
        let err = orchestrator.execute(&job()).await.unwrap_err();

        assert!(matches!(
            err,
            MigratorError::PushError {
                stage: PushStage::Branches,
                ..
            }
        ));
        assert_eq!(err.migration_state(), Some(MigrationState::FailedAtPush));
        let clone_dest = seen.lock().unwrap().clone().unwrap();
        assert!(!clone_dest.exists());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_never_clones() {
        let work = TempDir::new().unwrap();
        let mut adapter = MockDirectoryAdapter::new();
        adapter.expect_platform().return_const(PlatformType::Github);
        adapter.expect_create_repository().times(1).returning(|_, _| {
            Err(PlatformError::Api {
                platform: PlatformType::Github,
                status: 422,
                body: "name already exists on this account".to_string(),
            })
        });

        let mut mirror = MockMirrorOperations::new();
        mirror.expect_clone_mirror().never();
        mirror.expect_set_origin_url().never();
        mirror.expect_push_branches().never();
        mirror.expect_push_tags().never();

        let orchestrator = MigrationOrchestrator::new(registry_with_target(adapter), Arc::new(mirror), work.path());
        let err = orchestrator.execute(&job()).await.unwrap_err();

        assert_eq!(err.code(), "target_creation_error");
        assert_eq!(err.migration_state(), Some(MigrationState::FailedAtCreate));
        assert!(!err.is_retriable());
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_clone_failure_stops_before_retarget() {
        let work = TempDir::new().unwrap();
        let mut seq = Sequence::new();
        let adapter = creating_adapter(&mut seq);

        let mut mirror = MockMirrorOperations::new();
        mirror
            .expect_clone_mirror()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(fail("git clone --mirror")));
        mirror.expect_set_origin_url().never();
        mirror.expect_push_branches().never();
        mirror.expect_push_tags().never();

        let orchestrator = MigrationOrchestrator::new(registry_with_target(adapter), Arc::new(mirror), work.path());
        let err = orchestrator.execute(&job()).await.unwrap_err();

        assert_eq!(err.code(), "source_clone_error");
        assert_eq!(err.migration_state(), Some(MigrationState::FailedAtClone));
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_tag_push_failure_is_failed_at_push() {
        let work = TempDir::new().unwrap();
        let mut seq = Sequence::new();
        let adapter = creating_adapter(&mut seq);

        let mut mirror = MockMirrorOperations::new();
        mirror.expect_clone_mirror().returning(|_, _| Ok(()));
        mirror.expect_set_origin_url().returning(|_, _| Ok(()));
        mirror.expect_push_branches().returning(|_| Ok(()));
        mirror
            .expect_push_tags()
            .returning(|_| Err(fail("git push --tags origin")));

        let orchestrator = MigrationOrchestrator::new(registry_with_target(adapter), Arc::new(mirror), work.path());
        let err = orchestrator.execute(&job()).await.unwrap_err();

        assert!(matches!(
            err,
            MigratorError::PushError {
                stage: PushStage::Tags,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_target_platform() {
        let work = TempDir::new().unwrap();
        let mirror = MockMirrorOperations::new();
        let orchestrator = MigrationOrchestrator::new(Arc::new(PlatformRegistry::new()), Arc::new(mirror), work.path());

        let err = orchestrator.execute(&job()).await.unwrap_err();
        assert_eq!(err.code(), "platform_not_configured");
    }
}
