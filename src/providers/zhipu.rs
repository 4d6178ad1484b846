//! Zhipu (BigModel) web search provider
//!
//! Zhipu responses have shipped the result list under several names. The
//! candidate field names are probed in a fixed order and the first array
//! found wins; row fields are resolved the same way.

use super::{
    bearer, check_request, first_text, resolve_count, with_url, ADAPTER_MAX_COUNT,
};
use crate::{
    config::AdapterConfig,
    error::SearchResult,
    types::{AdapterId, SearchAdapter, SearchResult as SearchResultType},
    utils::http::HttpClient,
};
use serde::Serialize;
use serde_json::Value;

/// Where the result rows may live, highest priority first
pub const RESULT_FIELDS: [&str; 3] = ["search_result", "results", "data"];
const URL_FIELDS: [&str; 2] = ["url", "link"];
const SNIPPET_FIELDS: [&str; 2] = ["content", "snippet"];

const SEARCH_ENGINE: &str = "search_std";

#[derive(Debug, Serialize)]
struct ZhipuRequest<'a> {
    search_query: &'a str,
    count: u32,
    search_engine: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ZhipuAdapter {
    http: HttpClient,
}

impl ZhipuAdapter {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// Map a Zhipu payload onto the common result shape
pub fn normalize(payload: &Value) -> Vec<SearchResultType> {
    let rows = RESULT_FIELDS
        .iter()
        .find_map(|field| payload.get(*field).and_then(Value::as_array));

    let results = rows
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
        .map(|item| SearchResultType {
            title: first_text(item, &["title"]),
            url: first_text(item, &URL_FIELDS),
            snippet: first_text(item, &SNIPPET_FIELDS),
            source: AdapterId::Zhipu.to_string(),
        })
        .collect();
    with_url(results)
}

#[async_trait::async_trait]
impl SearchAdapter for ZhipuAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Zhipu
    }

    async fn search(
        &self,
        config: &AdapterConfig,
        query: &str,
        count: Option<u32>,
    ) -> SearchResult<Vec<SearchResultType>> {
        check_request(self.id(), config, query)?;

        let model = config.model.trim();
        let body = ZhipuRequest {
            search_query: query,
            count: resolve_count(count, config.top_k, ADAPTER_MAX_COUNT),
            search_engine: SEARCH_ENGINE,
            model: (!model.is_empty()).then_some(model),
        };
        log::debug!("zhipu request: {} count={}", config.base_url, body.count);

        let payload = self
            .http
            .post_json(
                &config.base_url,
                &body,
                &[("Authorization", bearer(&config.api_key))],
            )
            .await?;
        Ok(normalize(&payload))
    }
}
