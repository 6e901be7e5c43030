//! Pre-configured backend clients
//!
//! Two reqwest clients share one backend: `backend` is rooted at the origin,
//! `api` at the `/api` prefix. Both send JSON by default.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::info;

use crate::fetcher::{RequestOptions, RequestSender};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; anything else is joined onto the base.
    pub fn resolve(&self, url: &str) -> String {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }
}

#[async_trait]
impl RequestSender for ApiClient {
    type Response = reqwest::Response;
    type Error = reqwest::Error;

    async fn send(&self, url: &str, options: RequestOptions) -> Result<Self::Response, Self::Error> {
        let mut request = self
            .client
            .request(options.method, self.resolve(url))
            .headers(options.headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }
        request.send().await
    }
}

/// The `backend` and `api` clients of one session.
#[derive(Debug, Clone)]
pub struct ApiClients {
    pub backend: Arc<ApiClient>,
    pub api: Arc<ApiClient>,
}

impl ApiClients {
    /// Expects a normalized config (`api_url` filled in).
    pub fn from_config(cfg: &ApiConfig) -> Result<Self, reqwest::Error> {
        let timeout = cfg.request_timeout();
        let backend = ApiClient::new(&cfg.backend_url, timeout)?;
        let api = ApiClient::new(&cfg.api_url, timeout)?;
        info!(backend = %backend.base_url(), api = %api.base_url(), "api clients ready");
        Ok(Self { backend: Arc::new(backend), api: Arc::new(api) })
    }
}
