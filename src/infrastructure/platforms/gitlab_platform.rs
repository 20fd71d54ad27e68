use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::api_client::{host_of, ApiClient};
use super::pagination::{fetch_all, fetch_single, to_link_array, LinkHeaderPages, LinkRewriter, Page, PageSource};
use super::platform_interface::{
    CreateScope, DirectoryAdapter, ListOptions, ListScope, PlatformError, RepositoryPage,
};
use super::scope_resolver::{ScopeResolver, SubScopeSource};
use crate::domain::entities::RepositorySummary;
use crate::domain::value_objects::{PlatformType, RepoName};
use crate::infrastructure::filesystem::config_store::GitlabSettings;
use crate::infrastructure::http::HttpTransport;

/// サブグループ取得時の1ページあたり件数
const SUBGROUP_PAGE_SIZE: u32 = 100;

/// GitLabのプロジェクト（必要なフィールドのみ）
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabProject {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub path_with_namespace: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
    #[serde(default)]
    pub last_activity_at: Option<String>,
}

impl From<GitlabProject> for RepositorySummary {
    fn from(project: GitlabProject) -> Self {
        RepositorySummary::new(
            PlatformType::Gitlab,
            project.id.to_string(),
            project.name,
            project.path_with_namespace,
        )
        .with_description(project.description)
        .with_timestamps(project.created_at, project.last_activity_at)
        .with_default_branch(project.default_branch)
        .with_urls(project.web_url, project.ssh_url_to_repo, project.http_url_to_repo)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GitlabGroup {
    id: u64,
    #[serde(default)]
    full_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateProjectRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatedProject {
    http_url_to_repo: String,
}

/// GitLab REST API v4 アダプタ
///
/// 全件取得ではルートグループと直下のサブグループを展開し、各グループの
/// プロジェクトを `id_after` カーソルで最後まで辿る。
pub struct GitlabPlatform {
    client: ApiClient,
    api_base: String,
    default_group: Option<String>,
    rewriter: LinkRewriter,
}

impl GitlabPlatform {
    pub fn new(settings: &GitlabSettings, public_host: &str, transport: Arc<dyn HttpTransport>) -> Self {
        let headers = vec![(
            "Authorization".to_string(),
            format!("Bearer {}", settings.token.expose()),
        )];
        let upstream_host = host_of(&settings.api_base).unwrap_or_default();

        Self {
            client: ApiClient::new(PlatformType::Gitlab, transport, settings.token.clone(), headers),
            api_base: settings.api_base.clone(),
            default_group: settings.group_id.clone(),
            rewriter: LinkRewriter::new(upstream_host, public_host),
        }
    }

    fn project_pages<'a>(&'a self, group: Option<&'a str>, per_page: u32) -> ProjectPages<'a> {
        ProjectPages {
            platform: self,
            group,
            per_page,
        }
    }

    async fn list_group_tree(&self, root: &str, per_page: u32) -> Result<Vec<RepositorySummary>, PlatformError> {
        let scopes = ScopeResolver::new(self).resolve(root).await?;

        let mut seen = HashSet::new();
        let mut repositories = Vec::new();
        for scope in scopes.nodes() {
            let pages = self.project_pages(Some(scope.id.as_str()), per_page);
            let projects = fetch_all(&pages, pages.url(None)?).await?;
            debug!(group = %scope.id, projects = projects.len(), "Fetched group projects");

            for project in projects {
                if seen.insert(project.id) {
                    repositories.push(project.into());
                }
            }
        }
        Ok(repositories)
    }
}

/// グループ（または所属プロジェクト全体）のプロジェクト一覧
///
/// 次ページは直前ページ末尾のIDを `id_after` に入れて求める。
struct ProjectPages<'a> {
    platform: &'a GitlabPlatform,
    group: Option<&'a str>,
    per_page: u32,
}

impl<'a> ProjectPages<'a> {
    fn url(&self, id_after: Option<u64>) -> Result<String, PlatformError> {
        let mut query = vec![
            ("per_page", self.per_page.to_string()),
            ("order_by", "id".to_string()),
            ("sort", "asc".to_string()),
        ];
        if let Some(id) = id_after {
            query.push(("id_after", id.to_string()));
        }

        match self.group {
            Some(group) => self
                .platform
                .client
                .endpoint(&self.platform.api_base, &["groups", group, "projects"], &query),
            None => {
                query.insert(0, ("membership", "true".to_string()));
                self.platform
                    .client
                    .endpoint(&self.platform.api_base, &["projects"], &query)
            }
        }
    }
}

#[async_trait]
impl<'a> PageSource for ProjectPages<'a> {
    type Item = GitlabProject;

    async fn fetch_page(&self, url: &str) -> Result<Page<GitlabProject>, PlatformError> {
        let (items, headers) = self.platform.client.get_json::<Vec<GitlabProject>>(url).await?;
        Ok(Page::new(items, headers))
    }

    fn next_page_url(&self, _current_url: &str, page: &Page<GitlabProject>) -> Option<String> {
        let last = page.items.last()?;
        self.url(Some(last.id)).ok()
    }
}

#[async_trait]
impl SubScopeSource for GitlabPlatform {
    async fn list_child_scopes(&self, parent: &str) -> Result<Vec<String>, PlatformError> {
        let url = self.client.endpoint(
            &self.api_base,
            &["groups", parent, "subgroups"],
            &[("per_page", SUBGROUP_PAGE_SIZE.to_string())],
        )?;
        let groups = fetch_all(&LinkHeaderPages::<GitlabGroup>::new(&self.client), url).await?;

        for group in &groups {
            debug!(id = group.id, path = group.full_path.as_deref().unwrap_or(""), "Found subgroup");
        }
        Ok(groups.into_iter().map(|g| g.id.to_string()).collect())
    }
}

#[async_trait]
impl DirectoryAdapter for GitlabPlatform {
    fn platform(&self) -> PlatformType {
        PlatformType::Gitlab
    }

    fn default_scope(&self) -> ListScope {
        ListScope::from_option(self.default_group.clone())
    }

    async fn list_repositories(
        &self,
        scope: &ListScope,
        options: &ListOptions,
    ) -> Result<RepositoryPage, PlatformError> {
        let group = match scope {
            ListScope::Named(group) => Some(group.as_str()),
            ListScope::All => None,
        };

        if options.paginate {
            let repositories = match group {
                Some(root) => self.list_group_tree(root, options.per_page).await?,
                None => {
                    let pages = self.project_pages(None, options.per_page);
                    fetch_all(&pages, pages.url(None)?)
                        .await?
                        .into_iter()
                        .map(RepositorySummary::from)
                        .collect()
                }
            };
            info!(count = repositories.len(), "Listed GitLab projects");
            return Ok(RepositoryPage::complete(repositories));
        }

        let pages = self.project_pages(group, options.per_page);
        let page = fetch_single(&pages, &pages.url(None)?).await?;
        let links = to_link_array(page.link_header(), &self.rewriter);
        let continuation = links.iter().find(|l| l.is_next()).map(|l| l.url.clone());

        Ok(RepositoryPage {
            repositories: page.items.into_iter().map(RepositorySummary::from).collect(),
            links,
            continuation,
        })
    }

    async fn create_repository(&self, name: &RepoName, scope: &CreateScope) -> Result<String, PlatformError> {
        let url = self.client.endpoint(&self.api_base, &["projects"], &[])?;
        let body = CreateProjectRequest {
            name: name.as_str(),
            namespace_id: scope.organization.as_deref(),
        };

        let created: CreatedProject = self.client.post_json(&url, &body).await?;
        info!(repo = %name, url = %created.http_url_to_repo, "Created GitLab project");
        Ok(created.http_url_to_repo)
    }
}
