use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::api_client::ApiClient;
use super::pagination::{fetch_all, fetch_single, Page, PageSource};
use super::platform_interface::{
    CreateScope, DirectoryAdapter, ListOptions, ListScope, PlatformError, RepositoryPage,
};
use crate::domain::entities::RepositorySummary;
use crate::domain::value_objects::{PlatformType, RepoName, Secret};
use crate::infrastructure::filesystem::config_store::AzureSettings;
use crate::infrastructure::http::HttpTransport;

const PROJECTS_API_VERSION: &str = "7.1-preview.4";
const REPOSITORIES_API_VERSION: &str = "7.1-preview.1";
const CREATE_API_VERSION: &str = "6.0";
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Azure DevOpsの一覧レスポンスの外枠
#[derive(Debug, Deserialize)]
struct AzureList<T> {
    value: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
struct AzureProject {
    id: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AzureProjectRef {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRepository {
    pub id: String,
    pub name: String,
    project: AzureProjectRef,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl From<AzureRepository> for RepositorySummary {
    fn from(repo: AzureRepository) -> Self {
        let path = format!("{}/{}", repo.project.name, repo.name);
        RepositorySummary::new(PlatformType::Azure, repo.id, repo.name, path)
            .with_default_branch(repo.default_branch)
            .with_urls(repo.web_url, repo.ssh_url, repo.remote_url)
    }
}

#[derive(Debug, Serialize)]
struct CreateRepositoryRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRepository {
    remote_url: String,
}

/// Azure DevOps REST API アダプタ
///
/// 組織内のプロジェクトを継続トークンで列挙し、プロジェクトごとに
/// リポジトリを1回の呼び出しで取得する。
pub struct AzurePlatform {
    client: ApiClient,
    api_base: String,
    organization: String,
    default_project: Option<String>,
}

impl AzurePlatform {
    /// 組織が設定されていなければエラー
    pub fn new(
        settings: &AzureSettings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, PlatformError> {
        let organization = settings
            .organization
            .clone()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| {
                PlatformError::invalid_request(
                    PlatformType::Azure,
                    "organization",
                    "AZURE_ORGANIZATION is required for Azure DevOps",
                )
            })?;

        let credentials = STANDARD.encode(format!(":{}", settings.token.expose()));
        let headers = vec![("Authorization".to_string(), format!("Basic {}", credentials))];

        Ok(Self {
            client: ApiClient::new(PlatformType::Azure, transport, settings.token.clone(), headers)
                .with_secret(Secret::new(credentials)),
            api_base: settings.api_base.clone(),
            organization,
            default_project: settings.project.clone(),
        })
    }

    fn projects_url(&self, per_page: u32, continuation: Option<&str>) -> Result<String, PlatformError> {
        let mut query = vec![
            ("api-version", PROJECTS_API_VERSION.to_string()),
            ("$top", per_page.to_string()),
        ];
        if let Some(token) = continuation {
            query.push(("continuationToken", token.to_string()));
        }
        self.client
            .endpoint(&self.api_base, &[self.organization.as_str(), "_apis", "projects"], &query)
    }

    async fn project_repositories(&self, project: &str) -> Result<Vec<RepositorySummary>, PlatformError> {
        let url = self.client.endpoint(
            &self.api_base,
            &[self.organization.as_str(), project, "_apis", "git", "repositories"],
            &[("api-version", REPOSITORIES_API_VERSION.to_string())],
        )?;
        let (list, _) = self.client.get_json::<AzureList<AzureRepository>>(&url).await?;
        debug!(project = %project, repositories = list.value.len(), "Fetched Azure repositories");
        Ok(list.value.into_iter().map(RepositorySummary::from).collect())
    }

    async fn repositories_of(&self, projects: &[AzureProject]) -> Result<Vec<RepositorySummary>, PlatformError> {
        let mut repositories = Vec::new();
        for project in projects {
            debug!(project = %project.name, "Listing repositories of Azure project");
            repositories.extend(self.project_repositories(&project.id).await?);
        }
        Ok(repositories)
    }
}

/// 継続トークンで辿るプロジェクト一覧
struct ProjectPages<'a> {
    platform: &'a AzurePlatform,
    per_page: u32,
}

#[async_trait]
impl<'a> PageSource for ProjectPages<'a> {
    type Item = AzureProject;

    async fn fetch_page(&self, url: &str) -> Result<Page<AzureProject>, PlatformError> {
        let (list, headers) = self
            .platform
            .client
            .get_json::<AzureList<AzureProject>>(url)
            .await?;
        Ok(Page::new(list.value, headers))
    }

    fn next_page_url(&self, _current_url: &str, page: &Page<AzureProject>) -> Option<String> {
        let token = page.header(CONTINUATION_HEADER).filter(|t| !t.is_empty())?;
        self.platform.projects_url(self.per_page, Some(token)).ok()
    }
}

#[async_trait]
impl DirectoryAdapter for AzurePlatform {
    fn platform(&self) -> PlatformType {
        PlatformType::Azure
    }

    fn default_scope(&self) -> ListScope {
        ListScope::All
    }

    async fn list_repositories(
        &self,
        scope: &ListScope,
        options: &ListOptions,
    ) -> Result<RepositoryPage, PlatformError> {
        if let ListScope::Named(project) = scope {
            let repositories = self.project_repositories(project).await?;
            return Ok(RepositoryPage::complete(repositories));
        }

        let pages = ProjectPages {
            platform: self,
            per_page: options.per_page,
        };
        let first_url = self.projects_url(options.per_page, None)?;

        if options.paginate {
            let projects = fetch_all(&pages, first_url).await?;
            let repositories = self.repositories_of(&projects).await?;
            info!(
                projects = projects.len(),
                count = repositories.len(),
                "Listed Azure DevOps repositories"
            );
            return Ok(RepositoryPage::complete(repositories));
        }

        let page = fetch_single(&pages, &first_url).await?;
        let continuation = page
            .header(CONTINUATION_HEADER)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let repositories = self.repositories_of(&page.items).await?;

        Ok(RepositoryPage {
            repositories,
            links: Vec::new(),
            continuation,
        })
    }

    async fn create_repository(&self, name: &RepoName, scope: &CreateScope) -> Result<String, PlatformError> {
        let project = scope
            .project
            .as_deref()
            .or(self.default_project.as_deref())
            .ok_or_else(|| {
                PlatformError::invalid_request(
                    PlatformType::Azure,
                    "project",
                    "Azure DevOps needs a project to create the repository in",
                )
            })?;

        let url = self.client.endpoint(
            &self.api_base,
            &[self.organization.as_str(), project, "_apis", "git", "repositories"],
            &[("api-version", CREATE_API_VERSION.to_string())],
        )?;
        let body = CreateRepositoryRequest { name: name.as_str() };

        let created: CreatedRepository = self.client.post_json(&url, &body).await?;
        info!(repo = %name, project = %project, url = %created.remote_url, "Created Azure DevOps repository");
        Ok(created.remote_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::{HttpMethod, HttpResponse, MockTransport};
    use serde_json::json;

    const BASE: &str = "https://dev.azure.com";

    fn settings(organization: Option<&str>, project: Option<&str>) -> AzureSettings {
        AzureSettings {
            token: Secret::new("pat"),
            organization: organization.map(str::to_string),
            project: project.map(str::to_string),
            api_base: BASE.to_string(),
        }
    }

    fn adapter(transport: &MockTransport) -> AzurePlatform {
        AzurePlatform::new(&settings(Some("contoso"), None), Arc::new(transport.clone())).unwrap()
    }

    fn projects_url(continuation: Option<&str>) -> String {
        let mut url = format!("{}/contoso/_apis/projects?api-version=7.1-preview.4&%24top=2", BASE);
        if let Some(token) = continuation {
            url.push_str(&format!("&continuationToken={}", token));
        }
        url
    }

    fn repos_url(project_id: &str) -> String {
        format!("{}/contoso/{}/_apis/git/repositories?api-version=7.1-preview.1", BASE, project_id)
    }

    fn push_projects(transport: &MockTransport, url: String, projects: serde_json::Value, token: Option<&str>) {
        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push(("x-ms-continuationtoken".to_string(), token.to_string()));
        }
        transport.push_response(
            HttpMethod::Get,
            url,
            HttpResponse {
                status: 200,
                headers,
                body: projects.to_string().into_bytes(),
            },
        );
    }

    fn repo(id: &str, name: &str, project: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "project": {"id": format!("{}-id", project), "name": project},
            "defaultBranch": "refs/heads/main",
            "webUrl": format!("https://dev.azure.com/contoso/{}/_git/{}", project, name),
            "sshUrl": format!("git@ssh.dev.azure.com:v3/contoso/{}/{}", project, name),
            "remoteUrl": format!("https://contoso@dev.azure.com/contoso/{}/_git/{}", project, name)
        })
    }

    #[test]
    fn test_missing_organization_is_rejected() {
        let err = AzurePlatform::new(&settings(None, None), Arc::new(MockTransport::new()))
            .err()
            .expect("organization is required");
        assert!(matches!(err, PlatformError::InvalidRequest { .. }));
    }

    #[test]
    fn test_repository_maps_to_summary() {
        let record: AzureRepository = serde_json::from_value(repo("guid-1", "api", "Core")).unwrap();
        let summary = RepositorySummary::from(record);

        assert_eq!(summary.id, "guid-1");
        assert_eq!(summary.path, "Core/api");
        assert_eq!(summary.default_branch.as_deref(), Some("main"));
        assert_eq!(summary.description, None);
        assert_eq!(summary.created_at, None);
        assert_eq!(
            summary.http_url.as_deref(),
            Some("https://contoso@dev.azure.com/contoso/Core/_git/api")
        );
    }

    #[tokio::test]
    async fn test_paginated_listing_follows_continuation_tokens() {
        let transport = MockTransport::new();
        push_projects(
            &transport,
            projects_url(None),
            json!({"count": 2, "value": [{"id": "p1", "name": "Core"}, {"id": "p2", "name": "Web"}]}),
            Some("tok2"),
        );
        push_projects(
            &transport,
            projects_url(Some("tok2")),
            json!({"count": 1, "value": [{"id": "p3", "name": "Ops"}]}),
            None,
        );
        transport.push_json(repos_url("p1"), json!({"count": 1, "value": [repo("r1", "api", "Core")]}), None);
        transport.push_json(repos_url("p2"), json!({"count": 0, "value": []}), None);
        transport.push_json(
            repos_url("p3"),
            json!({"count": 2, "value": [repo("r3", "infra", "Ops"), repo("r4", "deploy", "Ops")]}),
            None,
        );

        let page = adapter(&transport)
            .list_repositories(
                &ListScope::All,
                &ListOptions {
                    paginate: true,
                    per_page: 2,
                },
            )
            .await
            .unwrap();

        let paths: Vec<&str> = page.repositories.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Core/api", "Ops/infra", "Ops/deploy"]);
        assert!(page.continuation.is_none());

        let sent = transport.requests();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0].header("authorization"), Some("Basic OnBhdA=="));
    }

    #[tokio::test]
    async fn test_single_page_returns_continuation_token() {
        let transport = MockTransport::new();
        push_projects(
            &transport,
            projects_url(None),
            json!({"count": 1, "value": [{"id": "p1", "name": "Core"}]}),
            Some("tok2"),
        );
        transport.push_json(repos_url("p1"), json!({"count": 1, "value": [repo("r1", "api", "Core")]}), None);

        let page = adapter(&transport)
            .list_repositories(
                &ListScope::All,
                &ListOptions {
                    paginate: false,
                    per_page: 2,
                },
            )
            .await
            .unwrap();

        assert_eq!(page.repositories.len(), 1);
        assert!(page.links.is_empty());
        assert_eq!(page.continuation.as_deref(), Some("tok2"));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_echoed_authorization_header_is_redacted() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            projects_url(None),
            HttpResponse {
                status: 401,
                headers: Vec::new(),
                body: b"denied; request had Authorization: Basic OnBhdA==".to_vec(),
            },
        );

        let err = adapter(&transport)
            .list_repositories(&ListScope::All, &ListOptions { paginate: false, per_page: 2 })
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("HTTP 401"));
        assert!(!message.contains("OnBhdA=="), "credential leaked: {}", message);
    }

    #[tokio::test]
    async fn test_create_requires_project() {
        let transport = MockTransport::new();
        let err = adapter(&transport)
            .create_repository(&RepoName::new("api").unwrap(), &CreateScope::default())
            .await
            .unwrap_err();

        match err {
            PlatformError::InvalidRequest { field, .. } => assert_eq!(field, "project"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_repository_returns_remote_url() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{}/contoso/Core%20Platform/_apis/git/repositories?api-version=6.0", BASE),
            HttpResponse {
                status: 201,
                headers: Vec::new(),
                body: json!({"id": "g", "remoteUrl": "https://contoso@dev.azure.com/contoso/Core%20Platform/_git/api"})
                    .to_string()
                    .into_bytes(),
            },
        );

        let url = adapter(&transport)
            .create_repository(
                &RepoName::new("api").unwrap(),
                &CreateScope {
                    organization: None,
                    project: Some("Core Platform".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(url, "https://contoso@dev.azure.com/contoso/Core%20Platform/_git/api");
        let body: serde_json::Value = serde_json::from_slice(&transport.requests()[0].body).unwrap();
        assert_eq!(body, json!({"name": "api"}));
    }
}
