//! Test fixtures: configuration, platform JSON records and git repositories

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use repomigrator::domain::value_objects::Secret;
use repomigrator::infrastructure::filesystem::AppConfig;

pub const GITHUB_BASE: &str = "https://api.github.com";
pub const GITLAB_BASE: &str = "https://gitlab.com/api/v4";
pub const AZURE_BASE: &str = "https://dev.azure.com";
pub const PUBLIC_HOST: &str = "relay.internal:8443";

/// Configuration with every platform credentialed
pub fn full_config(work_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.gitlab.token = Secret::new("glpat-secret");
    config.gitlab.group_id = Some("100".to_string());
    config.gitlab.api_base = GITLAB_BASE.to_string();
    config.github.token = Secret::new("ghp_secret");
    config.github.organization = Some("acme".to_string());
    config.github.api_base = GITHUB_BASE.to_string();
    config.azure.token = Secret::new("azure-pat");
    config.azure.organization = Some("contoso".to_string());
    config.azure.api_base = AZURE_BASE.to_string();
    config.public_host = PUBLIC_HOST.to_string();
    config.work_dir = work_dir.to_path_buf();
    config.index_path = work_dir.join("repositories.json");
    config
}

pub fn github_repo(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("acme/{}", name),
        "description": null,
        "created_at": "2023-03-01T00:00:00Z",
        "pushed_at": "2024-03-01T00:00:00Z",
        "default_branch": "main",
        "html_url": format!("https://github.com/acme/{}", name),
        "ssh_url": format!("git@github.com:acme/{}.git", name),
        "clone_url": format!("https://github.com/acme/{}.git", name)
    })
}

pub fn gitlab_project(id: u64, name: &str, namespace: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "path_with_namespace": format!("{}/{}", namespace, name),
        "created_at": "2024-01-01T00:00:00Z",
        "default_branch": "main",
        "web_url": format!("https://gitlab.com/{}/{}", namespace, name),
        "ssh_url_to_repo": format!("git@gitlab.com:{}/{}.git", namespace, name),
        "http_url_to_repo": format!("https://gitlab.com/{}/{}.git", namespace, name),
        "last_activity_at": "2024-06-01T00:00:00Z"
    })
}

pub fn gitlab_group(id: u64, full_path: &str) -> Value {
    json!({ "id": id, "full_path": full_path })
}

pub fn azure_project(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name })
}

pub fn azure_repo(id: &str, name: &str, project: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "defaultBranch": "refs/heads/main",
        "webUrl": format!("https://dev.azure.com/contoso/{}/_git/{}", project, name),
        "sshUrl": format!("git@ssh.dev.azure.com:v3/contoso/{}/{}", project, name),
        "remoteUrl": format!("https://dev.azure.com/contoso/{}/_git/{}", project, name),
        "project": { "name": project }
    })
}

/// Run git in `dir` with a fixed identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("git should be installed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Source repository with `main`, `develop` and two tags
pub struct SourceRepoFixture {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl SourceRepoFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("source");
        std::fs::create_dir_all(&path).unwrap();

        git(&path, &["init", "-q", "-b", "main"]);
        std::fs::write(path.join("README.md"), "# source\n").unwrap();
        git(&path, &["add", "README.md"]);
        git(&path, &["commit", "-q", "-m", "initial"]);
        git(&path, &["tag", "v1.0.0"]);
        git(&path, &["checkout", "-q", "-b", "develop"]);
        std::fs::write(path.join("CHANGELOG.md"), "- next\n").unwrap();
        git(&path, &["add", "CHANGELOG.md"]);
        git(&path, &["commit", "-q", "-m", "develop work"]);
        git(&path, &["tag", "-a", "v1.1.0-rc1", "-m", "release candidate"]);
        git(&path, &["checkout", "-q", "main"]);

        Self { temp, path }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Refs of a (bare) repository
pub fn refs_of(repo: &Path) -> Vec<String> {
    git(repo, &["for-each-ref", "--format=%(refname)"])
        .lines()
        .map(str::to_string)
        .collect()
}
