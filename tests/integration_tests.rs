//! Failover integration tests
//!
//! These tests drive the router end to end against a real config file in a
//! temp directory, with scripted providers standing in for the network.

use async_trait::async_trait;
use search_router::{
    cooldown::now_epoch, AdapterConfig, AdapterId, AdapterUpdate, ConfigStore, OfficialSearch,
    OfficialSource, ProviderRegistry, SearchAdapter, SearchError, SearchResult, SearchRouter,
    SourceId,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum TestBehavior {
    Success(Vec<SearchResult>),
    Error(SearchError),
}

impl TestBehavior {
    fn run(&self) -> search_router::Result<Vec<SearchResult>> {
        match self {
            TestBehavior::Success(results) => Ok(results.clone()),
            TestBehavior::Error(error) => Err(error.clone()),
        }
    }
}

// Adapter that replays a fixed outcome and counts calls
#[derive(Debug, Clone)]
struct TestAdapter {
    id: AdapterId,
    behavior: TestBehavior,
    call_count: Arc<Mutex<usize>>,
}

impl TestAdapter {
    fn success(id: AdapterId, results: Vec<SearchResult>) -> Self {
        Self {
            id,
            behavior: TestBehavior::Success(results),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    fn error(id: AdapterId, message: &str) -> Self {
        Self {
            id,
            behavior: TestBehavior::Error(SearchError::NetworkError(message.to_string())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl SearchAdapter for TestAdapter {
    fn id(&self) -> AdapterId {
        self.id
    }

    async fn search(
        &self,
        _config: &AdapterConfig,
        _query: &str,
        _count: Option<u32>,
    ) -> search_router::Result<Vec<SearchResult>> {
        *self.call_count.lock().unwrap() += 1;
        self.behavior.run()
    }
}

#[derive(Debug, Clone)]
struct TestOfficial {
    behavior: TestBehavior,
    call_count: Arc<Mutex<usize>>,
}

impl TestOfficial {
    fn new(behavior: TestBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(Mutex::new(0)),
        }
    }
}

#[async_trait]
impl OfficialSearch for TestOfficial {
    fn source(&self) -> OfficialSource {
        OfficialSource::Brave
    }

    async fn search(
        &self,
        _query: &str,
        _count: Option<u32>,
    ) -> search_router::Result<Vec<SearchResult>> {
        *self.call_count.lock().unwrap() += 1;
        self.behavior.run()
    }
}

fn result(url: &str, source: &str) -> SearchResult {
    SearchResult {
        title: format!("{source} result"),
        url: url.to_string(),
        snippet: String::new(),
        source: source.to_string(),
    }
}

fn setup() -> (TempDir, ConfigStore) {
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("search_adapters.json"));
    (dir, store)
}

fn enable(store: &ConfigStore, id: &str, key: &str) {
    store
        .update_provider(
            id,
            &AdapterUpdate {
                enabled: Some(true),
                api_key: Some(key.to_string()),
                ..Default::default()
            },
        )
        .unwrap();
}

fn legacy_chain(store: &ConfigStore) {
    enable(store, "serper", "a");
    enable(store, "tavily", "b");
    store.set_primary_provider("serper").unwrap();
    store.set_fallback_providers(&["tavily"]).unwrap();
}

fn router(store: &ConfigStore, adapters: Vec<TestAdapter>) -> SearchRouter {
    let mut registry = ProviderRegistry::empty();
    for adapter in adapters {
        registry = registry.with_adapter(Box::new(adapter));
    }
    SearchRouter::new(store.clone(), registry)
}

#[tokio::test]
async fn test_failover_on_rate_limit() {
    let (_dir, store) = setup();
    legacy_chain(&store);

    let serper = TestAdapter::error(AdapterId::Serper, "429 Too Many Requests");
    let tavily = TestAdapter::success(AdapterId::Tavily, vec![result("https://ok.com", "tavily")]);
    let mut router = router(&store, vec![serper.clone(), tavily.clone()]);

    let results = router
        .search_with_provider_failover("OpenClaw", Some(3))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://ok.com");

    let cooldown = store.load().provider(AdapterId::Serper).cooldown_seconds as i64;
    let now = now_epoch();
    assert!(router.cooldowns().is_on_cooldown("serper", now));
    assert!(router.cooldowns().is_on_cooldown("serper", now + cooldown - 5));
    assert!(!router.cooldowns().is_on_cooldown("tavily", now));
    assert_eq!(store.load().active, Some(AdapterId::Tavily));

    // Second call skips serper without invoking it
    router
        .search_with_provider_failover("OpenClaw", Some(3))
        .await
        .unwrap();
    assert_eq!(serper.call_count(), 1);
    assert_eq!(tavily.call_count(), 2);
}

#[tokio::test]
async fn test_all_candidates_fail() {
    let (_dir, store) = setup();
    legacy_chain(&store);

    let mut router = router(
        &store,
        vec![
            TestAdapter::error(AdapterId::Serper, "429 rate limit"),
            TestAdapter::error(AdapterId::Tavily, "429 rate limit"),
        ],
    );

    let err = router
        .search_with_provider_failover("OpenClaw", Some(3))
        .await
        .unwrap_err();
    match &err {
        SearchError::Exhausted { scope, attempts } => {
            assert_eq!(*scope, "providers");
            assert_eq!(attempts.len(), 2);
        }
        other => panic!("Expected Exhausted, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("serper:"));
    assert!(message.contains("tavily:"));
    assert!(message.contains(" | "));
}

#[tokio::test]
async fn test_cooldown_skip() {
    let (_dir, store) = setup();
    legacy_chain(&store);

    let serper = TestAdapter::success(AdapterId::Serper, vec![result("https://s.com", "serper")]);
    let tavily = TestAdapter::error(AdapterId::Tavily, "invalid api key");
    let mut router = router(&store, vec![serper.clone(), tavily.clone()]);
    router
        .cooldowns_mut()
        .mark_rate_limited("serper", 60, now_epoch() - 10);

    let err = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("serper:cooldown"), "{message}");
    assert!(message.contains("tavily:Network error: invalid api key"), "{message}");
    assert_eq!(serper.call_count(), 0);
    assert_eq!(tavily.call_count(), 1);

    // Non rate-limit failures leave cooldown state alone
    assert!(!router.cooldowns().is_on_cooldown("tavily", now_epoch()));

    router.reset_cooldown_state();
    let results = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap();
    assert_eq!(results[0].url, "https://s.com");
    assert_eq!(serper.call_count(), 1);
}

#[tokio::test]
async fn test_skips_disabled_and_keyless_adapters() {
    let (_dir, store) = setup();
    enable(&store, "zhipu", "z");
    store
        .update_provider(
            "tavily",
            &AdapterUpdate {
                enabled: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    store.set_primary_provider("serper").unwrap();
    store.set_fallback_providers(&["tavily", "zhipu"]).unwrap();

    let serper = TestAdapter::success(AdapterId::Serper, vec![result("https://s.com", "serper")]);
    let tavily = TestAdapter::success(AdapterId::Tavily, vec![result("https://t.com", "tavily")]);
    let zhipu = TestAdapter::error(AdapterId::Zhipu, "upstream 500");
    let mut router = router(&store, vec![serper.clone(), tavily.clone(), zhipu]);

    let err = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "all providers failed: serper:disabled | tavily:missing-key | zhipu:Network error: upstream 500"
    );
    assert_eq!(serper.call_count(), 0);
    assert_eq!(tavily.call_count(), 0);
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let (_dir, store) = setup();
    legacy_chain(&store);

    let serper = TestAdapter::success(AdapterId::Serper, vec![result("https://s.com", "serper")]);
    let tavily = TestAdapter::success(AdapterId::Tavily, vec![result("https://t.com", "tavily")]);
    let mut router = router(&store, vec![serper.clone(), tavily.clone()]);

    let results = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap();
    assert_eq!(results[0].source, "serper");
    assert_eq!(tavily.call_count(), 0);
    assert_eq!(store.load().active, Some(AdapterId::Serper));
}

#[tokio::test]
async fn test_empty_chain_fails_immediately() {
    let (_dir, store) = setup();
    let mut router = router(&store, vec![]);

    let err = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no primary/fallback provider configured");

    let err = router
        .search_with_unified_failover("OpenClaw", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no primary/fallback source configured");
}

#[tokio::test]
async fn test_unified_official_to_adapter_switch() {
    let (_dir, store) = setup();
    enable(&store, "tavily", "k");
    store.set_primary_source("official:brave").unwrap();
    store.set_fallback_sources(&["adapter:tavily"]).unwrap();

    let official = TestOfficial::new(TestBehavior::Error(SearchError::HttpError {
        message: "Request failed with status: 429 Too Many Requests".to_string(),
        status_code: Some(429),
        response_body: None,
    }));
    let tavily = TestAdapter::success(AdapterId::Tavily, vec![result("https://x.com", "tavily")]);
    let registry = ProviderRegistry::empty()
        .with_official(Box::new(official.clone()))
        .with_adapter(Box::new(tavily));
    let mut router = SearchRouter::new(store.clone(), registry);

    let results = router
        .search_with_unified_failover("OpenClaw", Some(3))
        .await
        .unwrap();
    assert_eq!(results[0].url, "https://x.com");

    let cfg = store.load();
    assert_eq!(cfg.active_source, Some(SourceId::Adapter(AdapterId::Tavily)));
    assert_eq!(cfg.active, Some(AdapterId::Tavily));
    assert!(router.cooldowns().is_on_cooldown("official:brave", now_epoch()));
    assert_eq!(*official.call_count.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_unified_official_success_persists_active_source() {
    let (_dir, store) = setup();
    store.set_primary_source("official:brave").unwrap();
    store.set_fallback_sources(&["adapter:tavily"]).unwrap();

    let official = TestOfficial::new(TestBehavior::Success(vec![result(
        "https://x.com",
        "official:brave",
    )]));
    let registry = ProviderRegistry::empty().with_official(Box::new(official));
    let mut router = SearchRouter::new(store.clone(), registry);

    let results = router
        .search_with_unified_failover("OpenClaw", Some(3))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        store.load().active_source,
        Some(SourceId::Official(OfficialSource::Brave))
    );
}

#[tokio::test]
async fn test_unified_uses_source_keyed_cooldowns() {
    let (_dir, store) = setup();
    legacy_chain(&store);

    let serper = TestAdapter::error(AdapterId::Serper, "quota exceeded");
    let tavily = TestAdapter::success(AdapterId::Tavily, vec![result("https://t.com", "tavily")]);
    let mut router = router(&store, vec![serper, tavily]);

    router
        .search_with_unified_failover("OpenClaw", None)
        .await
        .unwrap();
    let now = now_epoch();
    assert!(router.cooldowns().is_on_cooldown("adapter:serper", now));
    assert!(!router.cooldowns().is_on_cooldown("serper", now));
    assert_eq!(
        store.load().active_source,
        Some(SourceId::Adapter(AdapterId::Tavily))
    );
}

#[tokio::test]
async fn test_unified_skips_disabled_adapter_source() {
    let (_dir, store) = setup();
    store.set_primary_source("adapter:zhipu").unwrap();
    store.set_fallback_sources(&["official:brave"]).unwrap();

    let zhipu = TestAdapter::success(AdapterId::Zhipu, vec![result("https://z.cn", "zhipu")]);
    let official = TestOfficial::new(TestBehavior::Error(SearchError::MissingApiKey(
        "official:brave".to_string(),
    )));
    let registry = ProviderRegistry::empty()
        .with_adapter(Box::new(zhipu.clone()))
        .with_official(Box::new(official));
    let mut router = SearchRouter::new(store.clone(), registry);

    let err = router
        .search_with_unified_failover("OpenClaw", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "all sources failed: adapter:zhipu:disabled | official:brave:official:brave missing api key"
    );
    assert_eq!(zhipu.call_count(), 0);
}

#[tokio::test]
async fn test_search_with_provider_rejects_unknown_id() {
    let (_dir, store) = setup();
    let router = router(&store, vec![]);
    match router.search_with_provider("bing", "q", None).await.unwrap_err() {
        SearchError::InvalidInput(msg) => assert!(msg.contains("bing")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

// Adapter that swaps the config file for a non-empty directory before
// answering, so recording the active provider afterwards cannot succeed
#[derive(Debug)]
struct ConfigClobberingAdapter {
    config_path: std::path::PathBuf,
}

#[async_trait]
impl SearchAdapter for ConfigClobberingAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Serper
    }

    async fn search(
        &self,
        _config: &AdapterConfig,
        _query: &str,
        _count: Option<u32>,
    ) -> search_router::Result<Vec<SearchResult>> {
        std::fs::remove_file(&self.config_path)?;
        std::fs::create_dir(&self.config_path)?;
        std::fs::write(self.config_path.join("occupied"), "x")?;
        Ok(vec![result("https://kept.com", "serper")])
    }
}

#[tokio::test]
async fn test_failed_active_save_keeps_results() {
    let (_dir, store) = setup();
    enable(&store, "serper", "a");
    store.set_primary_provider("serper").unwrap();

    let registry = ProviderRegistry::empty().with_adapter(Box::new(ConfigClobberingAdapter {
        config_path: store.path().to_path_buf(),
    }));
    let mut router = SearchRouter::new(store.clone(), registry);

    let results = router
        .search_with_provider_failover("OpenClaw", None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://kept.com");
    assert!(store.path().is_dir());
}
