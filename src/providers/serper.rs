//! Serper (Google results) provider

use super::{
    check_request, first_text, object_rows, resolve_count, with_url, ADAPTER_MAX_COUNT,
};
use crate::{
    config::AdapterConfig,
    error::SearchResult,
    types::{AdapterId, SearchAdapter, SearchResult as SearchResultType},
    utils::http::HttpClient,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Clone)]
pub struct SerperAdapter {
    http: HttpClient,
}

impl SerperAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// Map a Serper payload onto the common result shape
pub fn normalize(payload: &Value) -> Vec<SearchResultType> {
    let results = object_rows(payload, "/organic")
        .map(|item| SearchResultType {
            title: first_text(item, &["title"]),
            url: first_text(item, &["link"]),
            snippet: first_text(item, &["snippet"]),
            source: AdapterId::Serper.to_string(),
        })
        .collect();
    with_url(results)
}

#[async_trait::async_trait]
impl SearchAdapter for SerperAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Serper
    }

    async fn search(
        &self,
        config: &AdapterConfig,
        query: &str,
        count: Option<u32>,
    ) -> SearchResult<Vec<SearchResultType>> {
        check_request(self.id(), config, query)?;

        let body = SerperRequest {
            q: query,
            num: resolve_count(count, config.top_k, ADAPTER_MAX_COUNT),
        };
        log::debug!("serper request: {} num={}", config.base_url, body.num);

        let payload = self
            .http
            .post_json(
                &config.base_url,
                &body,
                &[("X-API-KEY", config.api_key.trim().to_string())],
            )
            .await?;
        Ok(normalize(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_maps_and_drops_missing_urls() {
        let payload = json!({
            "searchParameters": {"q": "openclaw"},
            "organic": [
                {"title": "A", "link": "https://a.com", "snippet": "sa", "position": 1},
                {"title": "B", "snippet": "no link"},
                {"title": "C", "link": ""},
                {"link": "https://d.com"}
            ]
        });

        let results = normalize(&payload);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "A");
        assert_eq!(results[0].url, "https://a.com");
        assert_eq!(results[0].snippet, "sa");
        assert_eq!(results[0].source, "serper");
        assert_eq!(results[1].title, "");
    }

    #[test]
    fn test_normalize_without_organic() {
        assert!(normalize(&json!({"credits": 1})).is_empty());
        assert!(normalize(&json!({"organic": null})).is_empty());
    }

    #[test]
    fn test_normalize_keeps_good_rows_next_to_malformed_ones() {
        let payload = json!({
            "organic": [
                null,
                {"title": 7, "link": "https://ok.com", "snippet": "kept"},
                {"title": "B", "link": "https://b.com"}
            ]
        });

        let results = normalize(&payload);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "");
        assert_eq!(results[0].url, "https://ok.com");
        assert_eq!(results[0].snippet, "kept");
        assert_eq!(results[1].title, "B");
    }
}
