//! Read-only view of the host application's settings
//!
//! The router needs exactly one thing from its host: the API key of the
//! first-party Brave source. It is taken from `tools.web.search.apiKey` in
//! the host config file, then from an environment variable.

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable overriding the host config location
pub const HOST_CONFIG_PATH_ENV: &str = "OPENCLAW_CONFIG_PATH";
pub const DEFAULT_HOST_CONFIG_PATH: &str = "/root/.openclaw/openclaw.json";
pub const BRAVE_API_KEY_ENV: &str = "BRAVE_API_KEY";

const SEARCH_KEY_POINTER: &str = "/tools/web/search/apiKey";

#[derive(Debug, Clone)]
pub struct HostSettings {
    config_path: PathBuf,
    key_env: String,
}

impl HostSettings {
    pub fn new(config_path: impl Into<PathBuf>, key_env: &str) -> Self {
        Self {
            config_path: config_path.into(),
            key_env: key_env.to_string(),
        }
    }

    pub fn from_env() -> Self {
        let path = std::env::var(HOST_CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST_CONFIG_PATH.to_string());
        Self::new(path, BRAVE_API_KEY_ENV)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Key for the official search source, if the host has one
    pub fn official_api_key(&self) -> Option<String> {
        self.key_from_config().or_else(|| {
            std::env::var(&self.key_env)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
    }

    fn key_from_config(&self) -> Option<String> {
        let text = std::fs::read_to_string(&self.config_path).ok()?;
        let doc: Value = serde_json::from_str(&text).ok()?;
        doc.pointer(SEARCH_KEY_POINTER)
            .and_then(Value::as_str)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}
