//! Brave Search API, used as the host application's official source

use super::{first_text, object_rows, with_url};
use crate::{
    config::MIN_TOP_K,
    error::{SearchError, SearchResult},
    host::HostSettings,
    types::{OfficialSearch, OfficialSource, SearchResult as SearchResultType, SourceId},
    utils::http::HttpClient,
};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const MAX_COUNT: u32 = 10;
const DEFAULT_COUNT: u32 = 5;

/// Brave Search provider keyed through the host settings
#[derive(Debug, Clone)]
pub struct BraveSource {
    http: HttpClient,
    host: HostSettings,
    base_url: String,
}

impl BraveSource {
    pub fn new(http: HttpClient, host: HostSettings) -> Self {
        Self {
            http,
            host,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set custom base URL (for testing)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

/// Map a Brave payload onto the common result shape
pub fn normalize(payload: &Value) -> Vec<SearchResultType> {
    let source = SourceId::Official(OfficialSource::Brave).to_string();
    let results = object_rows(payload, "/web/results")
        .map(|item| SearchResultType {
            title: first_text(item, &["title"]),
            url: first_text(item, &["url"]),
            snippet: first_text(item, &["description"]),
            source: source.clone(),
        })
        .collect();
    with_url(results)
}

#[async_trait::async_trait]
impl OfficialSearch for BraveSource {
    fn source(&self) -> OfficialSource {
        OfficialSource::Brave
    }

    async fn search(
        &self,
        query: &str,
        count: Option<u32>,
    ) -> SearchResult<Vec<SearchResultType>> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }
        let key = self
            .host
            .official_api_key()
            .ok_or_else(|| SearchError::MissingApiKey("official:brave".to_string()))?;

        let count = count.unwrap_or(DEFAULT_COUNT).clamp(MIN_TOP_K, MAX_COUNT);
        log::debug!("brave request: {} count={count}", self.base_url);

        let payload = self
            .http
            .get_json(
                &self.base_url,
                &[("q", query.to_string()), ("count", count.to_string())],
                &[
                    ("Accept", "application/json".to_string()),
                    ("X-Subscription-Token", key),
                ],
            )
            .await?;
        Ok(normalize(&payload))
    }
}
