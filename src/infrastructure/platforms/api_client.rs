use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::platform_interface::PlatformError;
use crate::domain::value_objects::{redact, PlatformType, Secret};
use crate::infrastructure::http::{HttpError, HttpHeaders, HttpRequest, HttpResponse, HttpTransport};

/// 1プラットフォーム分のREST APIクライアント
///
/// 認証ヘッダの付与、ステータスの検査、JSONのデコード、エラー本文からの
/// 認証情報除去をまとめて行う。
#[derive(Clone)]
pub struct ApiClient {
    platform: PlatformType,
    transport: Arc<dyn HttpTransport>,
    default_headers: HttpHeaders,
    secrets: Vec<Secret>,
}

impl ApiClient {
    pub fn new(
        platform: PlatformType,
        transport: Arc<dyn HttpTransport>,
        token: Secret,
        default_headers: HttpHeaders,
    ) -> Self {
        Self {
            platform,
            transport,
            default_headers,
            secrets: vec![token],
        }
    }

    /// Also redact `secret` from error text (e.g. an encoded credential sent on the wire)
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn platform(&self) -> PlatformType {
        self.platform
    }

    /// GETしてJSONをデコードする。レスポンスヘッダも返す。
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(T, HttpHeaders), PlatformError> {
        let request = HttpRequest::get(url).with_headers(self.default_headers.clone());
        let response = self.send(request).await?;
        let value = self.decode(&response)?;
        Ok((value, response.headers))
    }

    /// JSON本文でPOSTしてレスポンスをデコードする
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let request = HttpRequest::post_json(url, body)
            .map_err(|e| PlatformError::Decode {
                platform: self.platform,
                message: e.to_string(),
            })?
            .with_headers(self.default_headers.clone());
        let response = self.send(request).await?;
        self.decode(&response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PlatformError> {
        let url = request.url.clone();
        let method = request.method;
        debug!(platform = %self.platform, method = request.method.as_str(), url = %url, "Calling platform API");

        let response = self.transport.send(request).await.map_err(|e| match e {
            HttpError::Timeout { timeout_secs } => PlatformError::Timeout {
                platform: self.platform,
                method,
                url: url.clone(),
                timeout_secs,
            },
            other => PlatformError::Transport {
                platform: self.platform,
                message: self.redact(&other.to_string()),
                url: url.clone(),
            },
        })?;

        debug!(platform = %self.platform, status = response.status, url = %url, "Platform API responded");

        if !response.is_success() {
            return Err(PlatformError::Api {
                platform: self.platform,
                status: response.status,
                body: self.redact(response.text().trim()),
            });
        }

        Ok(response)
    }

    fn redact(&self, text: &str) -> String {
        // longest first, so a token inside another secret can't split it
        let mut secrets: Vec<&Secret> = self.secrets.iter().collect();
        secrets.sort_by_key(|s| std::cmp::Reverse(s.expose().len()));
        redact(text, &secrets)
    }

    fn decode<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, PlatformError> {
        serde_json::from_slice(&response.body).map_err(|e| PlatformError::Decode {
            platform: self.platform,
            message: e.to_string(),
        })
    }

    /// `base` にパスセグメントとクエリを付けたURLを組み立てる
    ///
    /// 各セグメントはパーセントエンコードされるので、`team/sub` のような
    /// GitLabのグループパスは `team%2Fsub` になる。
    pub fn endpoint(&self, base: &str, segments: &[&str], query: &[(&str, String)]) -> Result<String, PlatformError> {
        build_endpoint(base, segments, query).ok_or_else(|| {
            PlatformError::invalid_request(self.platform, "api_base", format!("'{}' is not a usable base URL", base))
        })
    }
}

fn build_endpoint(base: &str, segments: &[&str], query: &[(&str, String)]) -> Option<String> {
    let mut url = Url::parse(base).ok()?;
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Some(url.into())
}

/// URLのホスト部分（ポート付き）
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
