use super::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::time::Duration;

/// A real HTTP transport backed by reqwest.
///
/// Every request is bounded by the client-wide timeout; an elapsed timeout is
/// reported as [`HttpError::Timeout`] rather than a generic transport error.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repomigrator/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            // without_url keeps query strings out of error messages
            HttpError::Transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (k, v) in request.headers {
            builder = builder.header(&k, &v);
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let resp = builder.send().await.map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let mut headers: HttpHeaders = Vec::new();
        for (name, value) in resp.headers().iter() {
            headers.push((
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            ));
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
