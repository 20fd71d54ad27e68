use std::sync::Arc;

use crate::application::use_cases::{ListRepositoriesRequest, ListRepositoriesResult, ListRepositoriesUseCase};
use crate::common::result::MigratorResult;
use crate::infrastructure::filesystem::{AppConfig, RepositoryIndexStore};
use crate::infrastructure::platforms::PlatformRegistry;
use crate::presentation::cli::OutputFormat;
use crate::presentation::ui::DisplayHelper;

/// Handler for the list command
pub struct ListCommand {
    pub request: ListRepositoriesRequest,
    pub output: OutputFormat,
}

impl ListCommand {
    pub fn new(
        platform: String,
        scope: Option<String>,
        paginate: bool,
        per_page: Option<u32>,
        index: bool,
        output: OutputFormat,
    ) -> Self {
        Self {
            request: ListRepositoriesRequest::new(platform)
                .with_scope(scope)
                .with_paginate(paginate)
                .with_per_page(per_page)
                .with_index(index),
            output,
        }
    }

    pub async fn execute(&self, config: &AppConfig, display: &DisplayHelper) -> MigratorResult<()> {
        let registry = Arc::new(PlatformRegistry::from_config(config)?);
        let use_case = ListRepositoriesUseCase::new(
            registry,
            RepositoryIndexStore::new(&config.index_path),
            config.default_per_page,
        );

        let result = use_case.execute(&self.request).await?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Text => self.print_text(&result, display),
        }
        Ok(())
    }

    fn print_text(&self, result: &ListRepositoriesResult, display: &DisplayHelper) {
        let page = &result.page;
        if page.repositories.is_empty() {
            display.warning(&format!("No repositories found on {}", result.platform.display_name()));
        } else {
            display.print_repositories(&page.repositories);
            display.info(&format!(
                "{} repositories on {}",
                page.repositories.len(),
                result.platform.display_name()
            ));
        }

        for link in &page.links {
            println!("  {}: {}", link.relation, display.format_url(&link.url));
        }
        if let Some(next) = &page.continuation {
            display.info(&format!("More results available, continuation: {}", next));
        }
        if let Some(indexed) = &result.indexed {
            display.success(&format!(
                "Indexed {} new and {} updated repositories",
                indexed.inserted, indexed.updated
            ));
        }
    }
}
