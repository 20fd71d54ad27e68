pub mod commands;

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::common::error::MigratorError;
use crate::common::result::MigratorResult;
use crate::infrastructure::filesystem::{AppConfig, ConfigStore};
use crate::presentation::ui::DisplayHelper;

use commands::{ListCommand, MigrateCommand, SearchCommand};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// repomigrator - enumerate and mirror-migrate repositories across GitLab, GitHub and Azure DevOps
#[derive(Debug, Parser)]
#[command(name = "repomigrator")]
#[command(about = "Enumerate repositories and mirror-migrate them between GitLab, GitHub and Azure DevOps")]
#[command(version)]
#[command(long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ", built ", env!("BUILD_DATE"), ")"))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./repomigrator.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List repositories on a platform
    List {
        /// Platform name (gitlab, github, azure)
        platform: String,

        /// Group id, organization or project to list (defaults to the configured one)
        #[arg(short, long)]
        scope: Option<String>,

        /// Follow pagination until the last page
        #[arg(short, long)]
        paginate: bool,

        /// Page size
        #[arg(long)]
        per_page: Option<u32>,

        /// Record the listed repositories in the local index
        #[arg(long)]
        index: bool,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Mirror-migrate one repository to another platform
    Migrate {
        /// Platform the repository currently lives on
        source_platform: String,

        /// Platform to create the repository on
        target_platform: String,

        /// Name of the repository to create on the target
        #[arg(long)]
        repo_name: String,

        /// Clone URL of the source repository
        #[arg(long)]
        source_url: String,

        /// Target organization / namespace
        #[arg(long)]
        organization: Option<String>,

        /// Target project (required for Azure DevOps)
        #[arg(long)]
        project: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Search the local repository index by name
    Search {
        /// Case-insensitive substring of the repository name
        query: String,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

impl Commands {
    pub fn output(&self) -> OutputFormat {
        match self {
            Commands::List { output, .. } | Commands::Migrate { output, .. } | Commands::Search { output, .. } => {
                *output
            }
        }
    }
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    /// Install the tracing subscriber
    ///
    /// `RUST_LOG` wins when set; otherwise `repomigrator=info`, or `debug`
    /// with `--verbose`. Logs go to stderr so stdout stays parseable.
    pub fn init_logging(&self) {
        let default_level = if self.cli.verbose { "repomigrator=debug" } else { "repomigrator=info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!self.cli.no_color)
            .with_target(false)
            .try_init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color);

        let output = self.cli.command.output();
        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                match output {
                    OutputFormat::Json => println!("{}", error_json(&e)),
                    OutputFormat::Text => DisplayHelper::new(!self.cli.no_color).print_migrator_error(&e),
                }
                exit(1);
            }
        }
    }

    fn load_config(&self) -> MigratorResult<AppConfig> {
        Ok(ConfigStore::new().load(self.cli.config.as_deref())?)
    }

    async fn handle_command(&self) -> MigratorResult<()> {
        let display = DisplayHelper::new(!self.cli.no_color);
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::List {
                platform,
                scope,
                paginate,
                per_page,
                index,
                output,
            } => {
                ListCommand::new(platform.clone(), scope.clone(), *paginate, *per_page, *index, *output)
                    .execute(&config, &display)
                    .await
            }
            Commands::Migrate {
                source_platform,
                target_platform,
                repo_name,
                source_url,
                organization,
                project,
                output,
            } => {
                MigrateCommand {
                    source_platform: source_platform.clone(),
                    target_platform: target_platform.clone(),
                    repo_name: repo_name.clone(),
                    source_url: source_url.clone(),
                    organization: organization.clone(),
                    project: project.clone(),
                    output: *output,
                }
                .execute(&config, &display)
                .await
            }
            Commands::Search { query, output } => {
                SearchCommand::new(query.clone(), *output)
                    .execute(&config, &display)
                    .await
            }
        }
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine-readable error document for `--output json`
pub fn error_json(error: &MigratorError) -> serde_json::Value {
    json!({
        "error": {
            "code": error.code(),
            "message": error.to_string(),
            "retriable": error.is_retriable(),
            "state": error.migration_state().map(|s| s.to_string()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PushStage;
    use crate::domain::value_objects::PlatformType;

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from([
            "repomigrator",
            "list",
            "gitlab",
            "--paginate",
            "--per-page",
            "50",
            "--index",
            "-o",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::List {
                platform,
                paginate,
                per_page,
                index,
                output,
                scope,
            } => {
                assert_eq!(platform, "gitlab");
                assert!(paginate);
                assert_eq!(per_page, Some(50));
                assert!(index);
                assert_eq!(output, OutputFormat::Json);
                assert!(scope.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_migrate_command_with_global_flags() {
        let cli = Cli::try_parse_from([
            "repomigrator",
            "migrate",
            "gitlab",
            "azure",
            "--repo-name",
            "api",
            "--source-url",
            "https://gitlab.com/team/api.git",
            "--project",
            "Platform",
            "--verbose",
            "--config",
            "custom.yaml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Migrate {
                source_platform,
                target_platform,
                repo_name,
                project,
                organization,
                ..
            } => {
                assert_eq!(source_platform, "gitlab");
                assert_eq!(target_platform, "azure");
                assert_eq!(repo_name, "api");
                assert_eq!(project.as_deref(), Some("Platform"));
                assert!(organization.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_migrate_requires_repo_name() {
        let result = Cli::try_parse_from([
            "repomigrator",
            "migrate",
            "gitlab",
            "github",
            "--source-url",
            "https://gitlab.com/team/api.git",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_json_shape() {
        let value = error_json(&MigratorError::push_error(PushStage::Tags, "rejected"));
        assert_eq!(value["error"]["code"], "push_error");
        assert_eq!(value["error"]["state"], "FailedAtPush");
        assert_eq!(value["error"]["retriable"], true);

        let value = error_json(&MigratorError::platform_api_error(PlatformType::Github, 404, "Not Found"));
        assert_eq!(value["error"]["code"], "platform_api_error");
        assert!(value["error"]["state"].is_null());
    }
}
