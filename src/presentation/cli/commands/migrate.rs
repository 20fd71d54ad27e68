use std::sync::Arc;

use crate::application::use_cases::MigrationOrchestrator;
use crate::common::result::MigratorResult;
use crate::domain::entities::{MigrationJob, MigrationReport, MigrationStage};
use crate::domain::value_objects::{PlatformType, RepoName};
use crate::infrastructure::filesystem::AppConfig;
use crate::infrastructure::git::GitMirror;
use crate::infrastructure::platforms::PlatformRegistry;
use crate::presentation::cli::OutputFormat;
use crate::presentation::ui::DisplayHelper;

/// Handler for the migrate command
pub struct MigrateCommand {
    pub source_platform: String,
    pub target_platform: String,
    pub repo_name: String,
    pub source_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub output: OutputFormat,
}

impl MigrateCommand {
    /// Validate the arguments into a job
    pub fn to_job(&self) -> MigratorResult<MigrationJob> {
        let source_platform: PlatformType = self.source_platform.parse()?;
        let target_platform: PlatformType = self.target_platform.parse()?;
        let repo_name = RepoName::new(&self.repo_name)?;

        Ok(
            MigrationJob::new(self.source_url.trim(), source_platform, target_platform, repo_name)
                .with_organization(self.organization.clone())
                .with_project(self.project.clone()),
        )
    }

    pub async fn execute(&self, config: &AppConfig, display: &DisplayHelper) -> MigratorResult<()> {
        let job = self.to_job()?;

        let registry = Arc::new(PlatformRegistry::from_config(config)?);
        let mirror = Arc::new(GitMirror::with_executable(
            config.git_executable.clone(),
            config.git_timeout_secs,
        ));
        let orchestrator = MigrationOrchestrator::new(registry, mirror, &config.work_dir);

        if self.output == OutputFormat::Text {
            display.info(&format!(
                "Migrating {} from {} to {}...",
                display.format_repo(job.repo_name.as_str()),
                job.source_platform.display_name(),
                job.target_platform.display_name()
            ));
        }

        let report = orchestrator.execute(&job).await?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => self.print_text(&report, display),
        }
        Ok(())
    }

    fn print_text(&self, report: &MigrationReport, display: &DisplayHelper) {
        display.success(&format!(
            "Migrated {} to {} in {}",
            display.format_repo(&report.repo_name),
            display.format_url(&report.target_url),
            display.format_duration(report.elapsed)
        ));
        println!("  Steps: {}", format_steps(&report.steps));
    }
}

fn format_steps(steps: &[MigrationStage]) -> String {
    steps.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" -> ")
}
