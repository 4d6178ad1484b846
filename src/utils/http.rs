//! HTTP utilities for making requests to search APIs

use crate::error::{SearchError, SearchResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Per-request timeout used when none is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

const USER_AGENT: &str = concat!("search-router/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper with search-specific error mapping
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> SearchResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_MS)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout_ms: u64) -> SearchResult<Self> {
        let timeout = Duration::from_millis(timeout_ms);
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::ConfigError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// POST a JSON body and parse the JSON response
    pub async fn post_json<B>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, String)],
    ) -> SearchResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = Url::parse(url)?;
        let request = self.client.post(url).json(body);
        self.send(with_headers(request, headers)).await
    }

    /// GET with query parameters and parse the JSON response
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> SearchResult<Value> {
        let url = build_url(url, query)?;
        let request = self.client.get(url);
        self.send(with_headers(request, headers)).await
    }

    async fn send(&self, request: RequestBuilder) -> SearchResult<Value> {
        let response = request.send().await.map_err(|e| self.send_error(e))?;
        self.handle_response_json(response).await
    }

    fn send_error(&self, error: reqwest::Error) -> SearchError {
        if error.is_timeout() {
            SearchError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            error.into()
        }
    }

    /// Handle HTTP response and parse the body as JSON
    async fn handle_response_json(&self, response: Response) -> SearchResult<Value> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            return Err(SearchError::HttpError {
                message: format!("Request failed with status: {status}"),
                status_code: Some(status.as_u16()),
                response_body: Some(text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            SearchError::ParseError(format!("response is not JSON ({e}): {preview}"))
        })
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, String)]) -> RequestBuilder {
    for (key, value) in headers {
        request = request.header(*key, value.as_str());
    }
    request
}

/// Build a URL with query parameters
pub fn build_url(base_url: &str, params: &[(&str, String)]) -> SearchResult<Url> {
    let mut url = Url::parse(base_url)?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}
