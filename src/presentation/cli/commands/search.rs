use crate::application::use_cases::SearchRepositoriesUseCase;
use crate::common::result::MigratorResult;
use crate::infrastructure::filesystem::{AppConfig, RepositoryIndexStore};
use crate::presentation::cli::OutputFormat;
use crate::presentation::ui::DisplayHelper;

/// Handler for the search command
pub struct SearchCommand {
    pub query: String,
    pub output: OutputFormat,
}

impl SearchCommand {
    pub fn new(query: String, output: OutputFormat) -> Self {
        Self { query, output }
    }

    pub async fn execute(&self, config: &AppConfig, display: &DisplayHelper) -> MigratorResult<()> {
        let use_case = SearchRepositoriesUseCase::new(RepositoryIndexStore::new(&config.index_path));
        let hits = use_case.execute(&self.query).await?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
            OutputFormat::Text if hits.is_empty() => {
                display.warning(&format!("No indexed repository matches '{}'", self.query))
            }
            OutputFormat::Text => {
                display.print_repositories(&hits);
                display.info(&format!("{} matching repositories", hits.len()));
            }
        }
        Ok(())
    }
}
