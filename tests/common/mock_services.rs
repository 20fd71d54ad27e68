//! Fake implementations of the HTTP, platform and git seams

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use repomigrator::domain::value_objects::{PlatformType, RepoName};
use repomigrator::infrastructure::git::{MirrorError, MirrorOperations};
use repomigrator::infrastructure::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use repomigrator::infrastructure::platforms::{
    CreateScope, DirectoryAdapter, ListOptions, ListScope, PlatformError, RepositoryPage,
};

/// HTTP transport answering from registered responses
#[derive(Clone, Default)]
pub struct RecordingTransport {
    routes: Arc<Mutex<HashMap<(HttpMethod, String), VecDeque<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, url: impl Into<String>, response: HttpResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    /// `200 OK` JSON answer for a GET, with optional extra headers
    pub fn json(&self, url: impl Into<String>, body: serde_json::Value, headers: &[(&str, &str)]) {
        let mut all = vec![("Content-Type".to_string(), "application/json".to_string())];
        all.extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self.respond(
            HttpMethod::Get,
            url,
            HttpResponse {
                status: 200,
                headers: all,
                body: body.to_string().into_bytes(),
            },
        );
    }

    pub fn status(&self, method: HttpMethod, url: impl Into<String>, status: u16, body: &str) {
        self.respond(
            method,
            url,
            HttpResponse {
                status,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let key = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);

        match self.routes.lock().unwrap().get_mut(&key).and_then(|q| q.pop_front()) {
            Some(response) => Ok(response),
            None => Err(HttpError::NoMockResponse {
                method: key.0.as_str().to_string(),
                url: key.1,
            }),
        }
    }
}

/// Target adapter that "creates" repositories as local bare repos
pub struct LocalBareTarget {
    pub platform: PlatformType,
    pub root: PathBuf,
    pub created: Mutex<Vec<String>>,
}

impl LocalBareTarget {
    pub fn new(platform: PlatformType, root: &Path) -> Self {
        Self {
            platform,
            root: root.to_path_buf(),
            created: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DirectoryAdapter for LocalBareTarget {
    fn platform(&self) -> PlatformType {
        self.platform
    }

    fn default_scope(&self) -> ListScope {
        ListScope::All
    }

    async fn list_repositories(&self, _scope: &ListScope, _options: &ListOptions) -> Result<RepositoryPage, PlatformError> {
        Ok(RepositoryPage::default())
    }

    async fn create_repository(&self, name: &RepoName, _scope: &CreateScope) -> Result<String, PlatformError> {
        let path = self.root.join(format!("{}.git", name));
        std::fs::create_dir_all(&path).unwrap();
        let status = std::process::Command::new("git")
            .args(["init", "-q", "--bare"])
            .current_dir(&path)
            .status()
            .unwrap();
        assert!(status.success());

        self.created.lock().unwrap().push(name.to_string());
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Mirror that records calls and can fail at one of them
#[derive(Default)]
pub struct ScriptedMirror {
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Option<&'static str>,
    pub clone_dirs: Mutex<Vec<PathBuf>>,
}

impl ScriptedMirror {
    pub fn failing_on(call: &'static str) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), MirrorError> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.fail_on == Some(call) {
            return Err(MirrorError::CommandFailed {
                command: format!("git {}", call),
                exit_code: 1,
                stderr: "remote: rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorOperations for ScriptedMirror {
    async fn clone_mirror(&self, _source_url: &str, dest: &Path) -> Result<(), MirrorError> {
        std::fs::create_dir_all(dest).unwrap();
        self.clone_dirs.lock().unwrap().push(dest.to_path_buf());
        self.record("clone")
    }

    async fn set_origin_url(&self, _repo: &Path, _target_url: &str) -> Result<(), MirrorError> {
        self.record("set-url")
    }

    async fn push_branches(&self, _repo: &Path) -> Result<(), MirrorError> {
        self.record("push-all")
    }

    async fn push_tags(&self, _repo: &Path) -> Result<(), MirrorError> {
        self.record("push-tags")
    }
}
