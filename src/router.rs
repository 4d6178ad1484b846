//! Failover search across the configured provider chain

use crate::{
    chain::{resolve_provider_chain, resolve_source_chain},
    config::{ConfigStore, RouterConfig, DEFAULT_COOLDOWN_SECONDS},
    cooldown::{now_epoch, CooldownTracker, RateLimitClassifier},
    error::{SearchError, SearchResult as Result},
    host::HostSettings,
    providers::ProviderRegistry,
    types::{AdapterId, SearchResult, SourceId},
    utils::http::HttpClient,
};

/// Query used by [`SearchRouter::test_provider_connection`]
pub const PROBE_QUERY: &str = "OpenClaw";
pub const PROBE_COUNT: u32 = 3;

/// Which chain a walk follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainKind {
    /// Legacy adapter-only fields, cooldowns keyed by bare adapter id
    Providers,
    /// Unified source fields, cooldowns keyed by source id
    Sources,
}

impl ChainKind {
    fn scope(&self) -> &'static str {
        match self {
            ChainKind::Providers => "providers",
            ChainKind::Sources => "sources",
        }
    }

    fn key(&self, source: SourceId) -> String {
        match (self, source) {
            (ChainKind::Providers, SourceId::Adapter(id)) => id.to_string(),
            _ => source.to_string(),
        }
    }

    fn chain(&self, cfg: &RouterConfig) -> Vec<SourceId> {
        match self {
            ChainKind::Providers => resolve_provider_chain(cfg)
                .into_iter()
                .map(SourceId::Adapter)
                .collect(),
            ChainKind::Sources => resolve_source_chain(cfg),
        }
    }

    fn record_success(&self, cfg: &mut RouterConfig, source: SourceId) {
        if let SourceId::Adapter(id) = source {
            cfg.active = Some(id);
        }
        if *self == ChainKind::Sources {
            cfg.active_source = Some(source);
        }
    }
}

/// Routes one logical search through a prioritized chain of providers
///
/// The router owns its cooldown state and takes `&mut self` for searches;
/// callers sharing it between tasks must put it behind a mutex.
#[derive(Debug)]
pub struct SearchRouter {
    store: ConfigStore,
    registry: ProviderRegistry,
    cooldowns: CooldownTracker,
    classifier: RateLimitClassifier,
}

impl SearchRouter {
    pub fn new(store: ConfigStore, registry: ProviderRegistry) -> Self {
        Self {
            store,
            registry,
            cooldowns: CooldownTracker::new(),
            classifier: RateLimitClassifier::default(),
        }
    }

    /// Router over the live providers, configured from the environment
    pub fn from_env() -> Result<Self> {
        let registry = ProviderRegistry::standard(HttpClient::new()?, HostSettings::from_env());
        Ok(Self::new(ConfigStore::from_env(), registry))
    }

    pub fn with_classifier(mut self, classifier: RateLimitClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownTracker {
        &mut self.cooldowns
    }

    /// Drop all cooldowns; meant for test isolation
    pub fn reset_cooldown_state(&mut self) {
        self.cooldowns.reset();
    }

    /// Search the legacy adapter chain (`primary`, `fallbacks`)
    pub async fn search_with_provider_failover(
        &mut self,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        self.search_chain(ChainKind::Providers, query, count).await
    }

    /// Search the unified chain of official and adapter sources
    pub async fn search_with_unified_failover(
        &mut self,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        self.search_chain(ChainKind::Sources, query, count).await
    }

    /// One direct call to a single adapter with its stored settings
    pub async fn search_with_provider(
        &self,
        id: &str,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        let id: AdapterId = id.parse()?;
        let cfg = self.store.load();
        self.registry
            .adapter(id)?
            .search(&cfg.provider(id), query, count)
            .await
    }

    /// Run a fixed small query against one provider and describe the outcome
    ///
    /// Accepts a bare adapter id, `adapter:<id>` or `official:<name>`.
    /// Cooldown state is left untouched.
    pub async fn test_provider_connection(&self, id: &str) -> (bool, String) {
        let source = match parse_probe_target(id) {
            Ok(source) => source,
            Err(e) => return (false, e.to_string()),
        };
        let cfg = self.store.load();

        match self.attempt(&cfg, source, PROBE_QUERY, Some(PROBE_COUNT)).await {
            Ok(results) => (true, format!("ok ({} results)", results.len())),
            Err(error) => (false, describe_probe_failure(&error)),
        }
    }

    async fn attempt(
        &self,
        cfg: &RouterConfig,
        source: SourceId,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        match source {
            SourceId::Adapter(id) => {
                self.registry
                    .adapter(id)?
                    .search(&cfg.provider(id), query, count)
                    .await
            }
            SourceId::Official(name) => self.registry.official(name)?.search(query, count).await,
        }
    }

    fn cooldown_seconds(cfg: &RouterConfig, source: SourceId) -> u32 {
        match source {
            SourceId::Adapter(id) => cfg.provider(id).cooldown_seconds,
            SourceId::Official(_) => DEFAULT_COOLDOWN_SECONDS,
        }
    }

    async fn search_chain(
        &mut self,
        kind: ChainKind,
        query: &str,
        count: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        let mut cfg = self.store.load();
        let chain = kind.chain(&cfg);
        if chain.is_empty() {
            let what = match kind {
                ChainKind::Providers => "provider",
                ChainKind::Sources => "source",
            };
            return Err(SearchError::EmptyChain(what));
        }

        let now = now_epoch();
        let mut attempts = Vec::with_capacity(chain.len());

        for source in chain {
            let key = kind.key(source);

            if let Some(id) = source.adapter() {
                let settings = cfg.provider(id);
                if !settings.enabled {
                    log::debug!("skipping {key}: disabled");
                    attempts.push(format!("{key}:disabled"));
                    continue;
                }
                if !settings.has_api_key() {
                    log::debug!("skipping {key}: missing key");
                    attempts.push(format!("{key}:missing-key"));
                    continue;
                }
            }
            if self.cooldowns.is_on_cooldown(&key, now) {
                log::debug!(
                    "skipping {key}: cooling down for {}s",
                    self.cooldowns.remaining(&key, now)
                );
                attempts.push(format!("{key}:cooldown"));
                continue;
            }

            log::debug!("trying {key}");
            match self.attempt(&cfg, source, query, count).await {
                Ok(results) => {
                    log::info!("{key} served {} results", results.len());
                    kind.record_success(&mut cfg, source);
                    if let Err(e) = self.store.save(&cfg) {
                        log::warn!("could not record {key} as active: {e}");
                    }
                    return Ok(results);
                }
                Err(error) => {
                    if self.classifier.is_rate_limitish(&error) {
                        let seconds = Self::cooldown_seconds(&cfg, source);
                        self.cooldowns
                            .mark_rate_limited(&key, seconds as i64, now_epoch());
                    }
                    log::warn!("{key} failed: {error}");
                    attempts.push(format!("{key}:{error}"));
                }
            }
        }

        Err(SearchError::Exhausted {
            scope: kind.scope(),
            attempts,
        })
    }
}

fn parse_probe_target(id: &str) -> Result<SourceId> {
    if id.contains(':') {
        id.parse()
    } else {
        id.parse::<AdapterId>().map(SourceId::Adapter)
    }
}

fn describe_probe_failure(error: &SearchError) -> String {
    match error {
        SearchError::HttpError {
            status_code: Some(code),
            ..
        } => format!("http {code}"),
        SearchError::NetworkError(reason) => format!("network error: {reason}"),
        SearchError::Timeout { .. } => format!("network error: {error}"),
        other => other.to_string(),
    }
}
