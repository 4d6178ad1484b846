//! Search provider implementations
//!
//! One adapter per third-party provider plus the first-party Brave source.
//! [`ProviderRegistry`] holds exactly one implementation per known id and is
//! the only place ids are turned into behavior.

pub mod brave;
pub mod serper;
pub mod tavily;
pub mod zhipu;

// Re-export providers for convenience
pub use brave::BraveSource;
pub use serper::SerperAdapter;
pub use tavily::TavilyAdapter;
pub use zhipu::ZhipuAdapter;

use crate::{
    config::{AdapterConfig, MIN_TOP_K},
    error::{SearchError, SearchResult},
    host::HostSettings,
    types::{
        AdapterId, OfficialSearch, OfficialSource, SearchAdapter,
        SearchResult as SearchResultType,
    },
    utils::http::HttpClient,
};
use serde_json::Value;
use std::collections::HashMap;

/// Largest count the third-party adapters accept
pub const ADAPTER_MAX_COUNT: u32 = 20;

/// Explicit per-call count wins over the stored default; both are clamped
pub fn resolve_count(explicit: Option<u32>, stored: u32, max: u32) -> u32 {
    explicit.unwrap_or(stored).clamp(MIN_TOP_K, max)
}

/// Reject calls that could never succeed before touching the network
fn check_request(id: AdapterId, config: &AdapterConfig, query: &str) -> SearchResult<()> {
    if query.trim().is_empty() {
        return Err(SearchError::InvalidInput(
            "Query cannot be empty".to_string(),
        ));
    }
    if !config.has_api_key() {
        return Err(SearchError::MissingApiKey(id.to_string()));
    }
    if config.base_url.trim().is_empty() {
        return Err(SearchError::ConfigError(format!("{id} missing base url")));
    }
    Ok(())
}

fn bearer(api_key: &str) -> String {
    format!("Bearer {}", api_key.trim())
}

/// Object rows of the array at `pointer`; a missing or non-array value reads
/// as no rows and non-object entries are skipped
fn object_rows<'a>(payload: &'a Value, pointer: &str) -> impl Iterator<Item = &'a Value> {
    payload
        .pointer(pointer)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

/// First non-empty string among `fields`, empty when none is a string
fn first_text(item: &Value, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|f| item.get(*f).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Drop rows that came back without a URL
fn with_url(results: Vec<SearchResultType>) -> Vec<SearchResultType> {
    results.into_iter().filter(|r| !r.url.is_empty()).collect()
}

/// Id-keyed lookup of provider implementations
#[derive(Debug)]
pub struct ProviderRegistry {
    adapters: HashMap<AdapterId, Box<dyn SearchAdapter>>,
    official: HashMap<OfficialSource, Box<dyn OfficialSearch>>,
}

impl ProviderRegistry {
    /// Registry with no implementations; use the `with_*` builders to fill it
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
            official: HashMap::new(),
        }
    }

    /// Registry wired to the live provider APIs
    pub fn standard(http: HttpClient, host: HostSettings) -> Self {
        Self::empty()
            .with_adapter(Box::new(SerperAdapter::new(http.clone())))
            .with_adapter(Box::new(TavilyAdapter::new(http.clone())))
            .with_adapter(Box::new(ZhipuAdapter::new(http.clone())))
            .with_official(Box::new(BraveSource::new(http, host)))
    }

    /// Install or replace the implementation for `adapter.id()`
    pub fn with_adapter(mut self, adapter: Box<dyn SearchAdapter>) -> Self {
        self.adapters.insert(adapter.id(), adapter);
        self
    }

    /// Install or replace the implementation for `source.source()`
    pub fn with_official(mut self, source: Box<dyn OfficialSearch>) -> Self {
        self.official.insert(source.source(), source);
        self
    }

    pub fn adapter(&self, id: AdapterId) -> SearchResult<&dyn SearchAdapter> {
        self.adapters
            .get(&id)
            .map(|a| a.as_ref())
            .ok_or_else(|| {
                SearchError::InvalidInput(format!("no implementation registered for {id}"))
            })
    }

    pub fn official(&self, source: OfficialSource) -> SearchResult<&dyn OfficialSearch> {
        self.official.get(&source).map(|s| s.as_ref()).ok_or_else(|| {
            SearchError::InvalidInput(format!(
                "unsupported official source for failover: official:{source}"
            ))
        })
    }
}
