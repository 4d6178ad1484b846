//! Persisted router configuration
//!
//! The configuration file holds the adapter settings together with two
//! overlapping chain descriptions: the legacy adapter-only fields
//! (`active`, `primary`, `fallbacks`) and the unified source fields
//! (`activeSource`, `primarySource`, `fallbackSources`). Both are kept on
//! disk so older readers of the file keep working.
//!
//! Loading never fails. A missing, unreadable or corrupt file is replaced by
//! defaults, and a valid file is merged field by field into the default
//! skeleton so that unknown ids and badly typed values fall away.
//!
//! Every mutation is a whole-file load, change and save. Nothing coordinates
//! writers in different processes; the last writer wins.

use crate::error::{SearchError, SearchResult as Result};
use crate::types::{AdapterId, SourceId};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "OPENCLAW_SEARCH_ADAPTERS_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "/root/.openclaw/easyclaw/search_adapters.json";

pub const DEFAULT_TOP_K: u32 = 5;
pub const MIN_TOP_K: u32 = 1;
pub const MAX_TOP_K: u32 = 20;

pub const DEFAULT_COOLDOWN_SECONDS: u32 = 60;
pub const MIN_COOLDOWN_SECONDS: u32 = 5;
pub const MAX_COOLDOWN_SECONDS: u32 = 3600;

/// Clamp a result count into `[1, 20]`
pub fn clamp_top_k(value: i64) -> u32 {
    value.clamp(MIN_TOP_K as i64, MAX_TOP_K as i64) as u32
}

/// Clamp a cooldown window into `[5, 3600]` seconds
pub fn clamp_cooldown(value: i64) -> u32 {
    value.clamp(MIN_COOLDOWN_SECONDS as i64, MAX_COOLDOWN_SECONDS as i64) as u32
}

/// Settings of one third-party adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    /// Provider specific model, empty when unused
    pub model: String,
    pub top_k: u32,
    pub cooldown_seconds: u32,
}

impl AdapterConfig {
    pub fn defaults(id: AdapterId) -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            base_url: id.default_base_url().to_string(),
            model: String::new(),
            top_k: DEFAULT_TOP_K,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn merge_from(&mut self, src: &Map<String, Value>) {
        if let Some(enabled) = src.get("enabled").and_then(Value::as_bool) {
            self.enabled = enabled;
        }
        if let Some(key) = src.get("apiKey").and_then(Value::as_str) {
            self.api_key = key.to_string();
        }
        if let Some(url) = src.get("baseUrl").and_then(Value::as_str) {
            self.base_url = url.to_string();
        }
        if let Some(model) = src.get("model").and_then(Value::as_str) {
            self.model = model.to_string();
        }
        if let Some(top_k) = int_value(src.get("topK")) {
            self.top_k = clamp_top_k(top_k);
        }
        if let Some(cooldown) = int_value(src.get("cooldownSeconds")) {
            self.cooldown_seconds = clamp_cooldown(cooldown);
        }
    }

    fn apply(&mut self, update: &AdapterUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(key) = &update.api_key {
            self.api_key = key.trim().to_string();
        }
        if let Some(url) = &update.base_url {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Some(model) = &update.model {
            self.model = model.trim().to_string();
        }
        if let Some(top_k) = update.top_k {
            self.top_k = clamp_top_k(top_k);
        }
        if let Some(cooldown) = update.cooldown_seconds {
            self.cooldown_seconds = clamp_cooldown(cooldown);
        }
    }
}

/// Partial change applied by [`ConfigStore::update_provider`]
#[derive(Debug, Clone, Default)]
pub struct AdapterUpdate {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    /// An empty value keeps the current URL
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub top_k: Option<i64>,
    pub cooldown_seconds: Option<i64>,
}

/// Root of the persisted configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    #[serde(serialize_with = "id_or_empty")]
    pub active: Option<AdapterId>,
    #[serde(serialize_with = "id_or_empty")]
    pub primary: Option<AdapterId>,
    pub fallbacks: Vec<AdapterId>,
    #[serde(serialize_with = "id_or_empty")]
    pub primary_source: Option<SourceId>,
    pub fallback_sources: Vec<SourceId>,
    #[serde(serialize_with = "id_or_empty")]
    pub active_source: Option<SourceId>,
    pub providers: BTreeMap<AdapterId, AdapterConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            active: None,
            primary: None,
            fallbacks: Vec::new(),
            primary_source: None,
            fallback_sources: Vec::new(),
            active_source: None,
            providers: AdapterId::ALL
                .into_iter()
                .map(|id| (id, AdapterConfig::defaults(id)))
                .collect(),
        }
    }
}

impl RouterConfig {
    /// Settings for `id`, falling back to defaults if the entry is absent
    pub fn provider(&self, id: AdapterId) -> AdapterConfig {
        self.providers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| AdapterConfig::defaults(id))
    }

    /// Copy safe for display, with API keys masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for provider in copy.providers.values_mut() {
            if provider.has_api_key() {
                provider.api_key = "***".to_string();
            }
        }
        copy
    }

    /// Merge a parsed document into the default skeleton
    fn merged(data: &Map<String, Value>) -> Self {
        let mut cfg = Self::default();
        cfg.active = id_value(data.get("active"));
        cfg.primary = id_value(data.get("primary")).or(cfg.active);
        cfg.fallbacks = id_list(data.get("fallbacks"));
        cfg.primary_source = id_value(data.get("primarySource"));
        cfg.fallback_sources = id_list(data.get("fallbackSources"));
        cfg.active_source = id_value(data.get("activeSource"));

        if let Some(stored) = data.get("providers").and_then(Value::as_object) {
            for (id, provider) in cfg.providers.iter_mut() {
                if let Some(src) = stored.get(id.as_str()).and_then(Value::as_object) {
                    provider.merge_from(src);
                }
            }
        }
        cfg
    }
}

fn id_or_empty<T, S>(id: &Option<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    match id {
        Some(id) => serializer.collect_str(id),
        None => serializer.serialize_str(""),
    }
}

fn id_value<T: FromStr>(value: Option<&Value>) -> Option<T> {
    value.and_then(Value::as_str).and_then(|s| s.parse().ok())
}

/// Known ids from a JSON array, deduplicated in first-seen order
fn id_list<T: FromStr + PartialEq>(value: Option<&Value>) -> Vec<T> {
    let mut out = Vec::new();
    for item in value.and_then(Value::as_array).into_iter().flatten() {
        if let Some(id) = id_value::<T>(Some(item)) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

fn int_value(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Empty input clears the field, anything else must name a known id
fn parse_optional<T: FromStr<Err = SearchError>>(raw: &str) -> Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

fn parse_all<T, I, S>(raw: I) -> Result<Vec<T>>
where
    T: FromStr<Err = SearchError> + PartialEq,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for item in raw {
        let item = item.as_ref().trim();
        if item.is_empty() {
            continue;
        }
        let id: T = item.parse()?;
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// File-backed store for [`RouterConfig`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$OPENCLAW_SEARCH_ADAPTERS_PATH`, or the default location
    pub fn from_env() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, writing defaults when the file is missing or corrupt
    pub fn load(&self) -> RouterConfig {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("cannot read {}: {e}; using defaults", self.path.display());
                }
                return self.reset_to_defaults();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(data)) => RouterConfig::merged(&data),
            _ => {
                log::warn!(
                    "{} is not a JSON object; rewriting with defaults",
                    self.path.display()
                );
                self.reset_to_defaults()
            }
        }
    }

    fn reset_to_defaults(&self) -> RouterConfig {
        let cfg = RouterConfig::default();
        if let Err(e) = self.save(&cfg) {
            log::warn!("failed to persist default config: {e}");
        }
        cfg
    }

    /// Write the configuration through a temp file renamed over the target
    pub fn save(&self, cfg: &RouterConfig) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let body = serde_json::to_string_pretty(cfg)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| {
            SearchError::ConfigError(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;
        Ok(())
    }

    fn mutate(&self, change: impl FnOnce(&mut RouterConfig)) -> Result<()> {
        let mut cfg = self.load();
        change(&mut cfg);
        self.save(&cfg)
    }

    /// Set the legacy `active` and `primary` adapter
    pub fn set_active_provider(&self, id: &str) -> Result<()> {
        let id: Option<AdapterId> = parse_optional(id)?;
        self.mutate(|cfg| {
            cfg.active = id;
            cfg.primary = id;
        })
    }

    /// Set the primary adapter, mirroring it into the unified fields
    pub fn set_primary_provider(&self, id: &str) -> Result<()> {
        let id: Option<AdapterId> = parse_optional(id)?;
        self.mutate(|cfg| {
            cfg.primary = id;
            cfg.active = id;
            if let Some(id) = id {
                cfg.primary_source = Some(SourceId::Adapter(id));
                cfg.active_source = Some(SourceId::Adapter(id));
            }
        })
    }

    /// Replace the legacy fallback list; a non-empty list also replaces `fallbackSources`
    pub fn set_fallback_providers<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let ids: Vec<AdapterId> = parse_all(ids)?;
        self.mutate(|cfg| {
            if !ids.is_empty() {
                cfg.fallback_sources = ids.iter().copied().map(SourceId::Adapter).collect();
            }
            cfg.fallbacks = ids;
        })
    }

    /// Set the primary source; adapter sources are mirrored into the legacy fields
    pub fn set_primary_source(&self, source: &str) -> Result<()> {
        let source: Option<SourceId> = parse_optional(source)?;
        self.mutate(|cfg| {
            cfg.primary_source = source;
            cfg.active_source = source;
            if let Some(SourceId::Adapter(id)) = source {
                cfg.primary = Some(id);
                cfg.active = Some(id);
            }
        })
    }

    pub fn set_fallback_sources<S: AsRef<str>>(&self, sources: &[S]) -> Result<()> {
        let sources: Vec<SourceId> = parse_all(sources)?;
        self.mutate(|cfg| cfg.fallback_sources = sources)
    }

    pub fn update_provider(&self, id: &str, update: &AdapterUpdate) -> Result<()> {
        let id: AdapterId = id.parse()?;
        self.mutate(|cfg| {
            cfg.providers
                .entry(id)
                .or_insert_with(|| AdapterConfig::defaults(id))
                .apply(update);
        })
    }
}
