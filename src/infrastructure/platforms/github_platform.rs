use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::api_client::{host_of, ApiClient};
use super::pagination::{fetch_all, fetch_single, to_link_array, LinkHeaderPages, LinkRewriter};
use super::platform_interface::{
    CreateScope, DirectoryAdapter, ListOptions, ListScope, PlatformError, RepositoryPage,
};
use crate::domain::entities::RepositorySummary;
use crate::domain::value_objects::{PlatformType, RepoName};
use crate::infrastructure::filesystem::config_store::GithubSettings;
use crate::infrastructure::http::HttpTransport;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub clone_url: Option<String>,
}

impl From<GithubRepository> for RepositorySummary {
    fn from(repo: GithubRepository) -> Self {
        RepositorySummary::new(PlatformType::Github, repo.id.to_string(), repo.name, repo.full_name)
            .with_description(repo.description)
            .with_timestamps(repo.created_at, repo.pushed_at)
            .with_default_branch(repo.default_branch)
            .with_urls(repo.html_url, repo.ssh_url, repo.clone_url)
    }
}

#[derive(Debug, Serialize)]
struct CreateRepositoryRequest<'a> {
    name: &'a str,
    private: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedRepository {
    clone_url: String,
}

/// GitHub REST API v3 アダプタ
pub struct GithubPlatform {
    client: ApiClient,
    api_base: String,
    default_organization: Option<String>,
    rewriter: LinkRewriter,
}

impl GithubPlatform {
    pub fn new(settings: &GithubSettings, public_host: &str, transport: Arc<dyn HttpTransport>) -> Self {
        let headers = vec![
            ("Authorization".to_string(), format!("token {}", settings.token.expose())),
            ("Accept".to_string(), ACCEPT_V3.to_string()),
        ];
        let upstream_host = host_of(&settings.api_base).unwrap_or_default();

        Self {
            client: ApiClient::new(PlatformType::Github, transport, settings.token.clone(), headers),
            api_base: settings.api_base.clone(),
            default_organization: settings.organization.clone(),
            rewriter: LinkRewriter::new(upstream_host, public_host),
        }
    }

    fn repos_url(&self, scope: &ListScope, per_page: u32) -> Result<String, PlatformError> {
        let query = [("per_page", per_page.to_string()), ("page", "1".to_string())];
        match scope {
            ListScope::Named(org) => self.client.endpoint(&self.api_base, &["orgs", org.as_str(), "repos"], &query),
            ListScope::All => self.client.endpoint(&self.api_base, &["user", "repos"], &query),
        }
    }
}

#[async_trait]
impl DirectoryAdapter for GithubPlatform {
    fn platform(&self) -> PlatformType {
        PlatformType::Github
    }

    fn default_scope(&self) -> ListScope {
        ListScope::from_option(self.default_organization.clone())
    }

    async fn list_repositories(
        &self,
        scope: &ListScope,
        options: &ListOptions,
    ) -> Result<RepositoryPage, PlatformError> {
        let url = self.repos_url(scope, options.per_page)?;
        let pages = LinkHeaderPages::<GithubRepository>::new(&self.client);

        if options.paginate {
            let repositories: Vec<RepositorySummary> = fetch_all(&pages, url)
                .await?
                .into_iter()
                .map(RepositorySummary::from)
                .collect();
            info!(count = repositories.len(), "Listed GitHub repositories");
            return Ok(RepositoryPage::complete(repositories));
        }

        let page = fetch_single(&pages, &url).await?;
        let links = to_link_array(page.link_header(), &self.rewriter);
        let continuation = links.iter().find(|l| l.is_next()).map(|l| l.url.clone());
        Ok(RepositoryPage {
            repositories: page.items.into_iter().map(RepositorySummary::from).collect(),
            links,
            continuation,
        })
    }

    async fn create_repository(&self, name: &RepoName, scope: &CreateScope) -> Result<String, PlatformError> {
        let organization = scope
            .organization
            .as_deref()
            .or(self.default_organization.as_deref());
        let url = match organization {
            Some(org) => self.client.endpoint(&self.api_base, &["orgs", org, "repos"], &[])?,
            None => self.client.endpoint(&self.api_base, &["user", "repos"], &[])?,
        };

        let body = CreateRepositoryRequest {
            name: name.as_str(),
            private: true,
        };
        let created: CreatedRepository = self.client.post_json(&url, &body).await?;
        info!(repo = %name, url = %created.clone_url, "Created GitHub repository");
        Ok(created.clone_url)
    }
}
