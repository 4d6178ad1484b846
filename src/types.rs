//! Core types and traits for the search router

use crate::config::AdapterConfig;
use crate::error::{SearchError, SearchResult as Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Normalized search result returned by every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the web page
    pub title: String,
    /// URL of the search result, never empty
    pub url: String,
    /// Snippet/description of the web page
    pub snippet: String,
    /// Adapter or official id that produced the result
    pub source: String,
}

/// Third-party search adapters with persisted settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterId {
    Zhipu,
    Serper,
    Tavily,
}

impl AdapterId {
    pub const ALL: [AdapterId; 3] = [AdapterId::Zhipu, AdapterId::Serper, AdapterId::Tavily];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterId::Zhipu => "zhipu",
            AdapterId::Serper => "serper",
            AdapterId::Tavily => "tavily",
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            AdapterId::Zhipu => "Zhipu Web Search",
            AdapterId::Serper => "Serper",
            AdapterId::Tavily => "Tavily",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            AdapterId::Zhipu => "https://open.bigmodel.cn/api/paas/v4/web_search",
            AdapterId::Serper => "https://google.serper.dev/search",
            AdapterId::Tavily => "https://api.tavily.com/search",
        }
    }

    /// Conventional environment variable holding the provider key
    pub fn env_key(&self) -> &'static str {
        match self {
            AdapterId::Zhipu => "ZHIPU_API_KEY",
            AdapterId::Serper => "SERPER_API_KEY",
            AdapterId::Tavily => "TAVILY_API_KEY",
        }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zhipu" => Ok(AdapterId::Zhipu),
            "serper" => Ok(AdapterId::Serper),
            "tavily" => Ok(AdapterId::Tavily),
            other => Err(SearchError::InvalidInput(format!(
                "unsupported provider: {other}"
            ))),
        }
    }
}

/// First-party search capabilities of the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OfficialSource {
    Brave,
}

impl OfficialSource {
    pub const ALL: [OfficialSource; 1] = [OfficialSource::Brave];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfficialSource::Brave => "brave",
        }
    }
}

impl fmt::Display for OfficialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfficialSource {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "brave" => Ok(OfficialSource::Brave),
            other => Err(SearchError::InvalidInput(format!(
                "unsupported official source: {other}"
            ))),
        }
    }
}

/// Unified identifier: `official:<name>` or `adapter:<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Official(OfficialSource),
    Adapter(AdapterId),
}

impl SourceId {
    /// Adapter id when the source is backed by a third-party adapter
    pub fn adapter(&self) -> Option<AdapterId> {
        match self {
            SourceId::Adapter(id) => Some(*id),
            SourceId::Official(_) => None,
        }
    }
}

impl From<AdapterId> for SourceId {
    fn from(id: AdapterId) -> Self {
        SourceId::Adapter(id)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Official(name) => write!(f, "official:{name}"),
            SourceId::Adapter(id) => write!(f, "adapter:{id}"),
        }
    }
}

impl FromStr for SourceId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        match normalized.split_once(':') {
            Some(("official", name)) => Ok(SourceId::Official(name.parse()?)),
            Some(("adapter", id)) => Ok(SourceId::Adapter(id.parse()?)),
            _ => Err(SearchError::InvalidInput(format!(
                "invalid source: {normalized}"
            ))),
        }
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every source id a chain may reference, official sources first
pub fn available_sources() -> Vec<SourceId> {
    OfficialSource::ALL
        .into_iter()
        .map(SourceId::Official)
        .chain(AdapterId::ALL.into_iter().map(SourceId::Adapter))
        .collect()
}

/// Trait implemented by every third-party adapter
#[async_trait::async_trait]
pub trait SearchAdapter: Send + Sync + fmt::Debug {
    /// Adapter this implementation serves
    fn id(&self) -> AdapterId;

    /// Run one query with the stored settings. `count` overrides `topK`.
    async fn search(
        &self,
        config: &AdapterConfig,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>>;
}

/// Trait implemented by first-party sources, which carry no router settings
#[async_trait::async_trait]
pub trait OfficialSearch: Send + Sync + fmt::Debug {
    fn source(&self) -> OfficialSource;

    async fn search(&self, query: &str, count: Option<u32>) -> Result<Vec<SearchResult>>;
}
