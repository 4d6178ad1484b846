//! Tavily Search API provider
//!
//! Tavily is an AI-powered search API optimized for LLM agents. The key is
//! sent both in the body (`api_key`) and as a bearer token, which covers the
//! older and newer revisions of its API.

use super::{
    bearer, check_request, first_text, object_rows, resolve_count, with_url, ADAPTER_MAX_COUNT,
};
use crate::{
    config::AdapterConfig,
    error::SearchResult,
    types::{AdapterId, SearchAdapter, SearchResult as SearchResultType},
    utils::http::HttpClient,
};
use serde::Serialize;
use serde_json::Value;

/// Tavily search request structure
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: u32,
    api_key: &'a str,
}

/// Tavily Search API provider
#[derive(Debug, Clone)]
pub struct TavilyAdapter {
    http: HttpClient,
}

impl TavilyAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// Map a Tavily payload onto the common result shape
pub fn normalize(payload: &Value) -> Vec<SearchResultType> {
    let results = object_rows(payload, "/results")
        .map(|result| SearchResultType {
            title: first_text(result, &["title"]),
            url: first_text(result, &["url"]),
            snippet: first_text(result, &["content"]),
            source: AdapterId::Tavily.to_string(),
        })
        .collect();
    with_url(results)
}

#[async_trait::async_trait]
impl SearchAdapter for TavilyAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Tavily
    }

    async fn search(
        &self,
        config: &AdapterConfig,
        query: &str,
        count: Option<u32>,
    ) -> SearchResult<Vec<SearchResultType>> {
        check_request(self.id(), config, query)?;

        let api_key = config.api_key.trim();
        let request_body = TavilyRequest {
            query,
            max_results: resolve_count(count, config.top_k, ADAPTER_MAX_COUNT),
            api_key,
        };
        log::debug!(
            "tavily request: {} max_results={}",
            config.base_url,
            request_body.max_results
        );

        let payload = self
            .http
            .post_json(
                &config.base_url,
                &request_body,
                &[("Authorization", bearer(api_key))],
            )
            .await?;
        Ok(normalize(&payload))
    }
}
