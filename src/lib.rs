//! # Search Router
//!
//! Route one logical web search through a prioritized, persisted chain of
//! search providers. Providers that are disabled, unconfigured or cooling
//! down after a rate limit are skipped; the first provider that answers wins
//! and every provider's response is normalized into one [`SearchResult`]
//! shape.
//!
//! Supported sources:
//!
//! * third-party adapters: `zhipu`, `serper`, `tavily` (settings persisted in
//!   the router's JSON config file)
//! * the host application's official source: `official:brave` (key read from
//!   the host's own config, then `BRAVE_API_KEY`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_router::{AdapterUpdate, SearchRouter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = SearchRouter::from_env()?;
//!
//!     router.store().update_provider(
//!         "tavily",
//!         &AdapterUpdate {
//!             enabled: Some(true),
//!             api_key: Some("tvly-...".to_string()),
//!             ..Default::default()
//!         },
//!     )?;
//!     router.store().set_primary_source("official:brave")?;
//!     router.store().set_fallback_sources(&["adapter:tavily"])?;
//!
//!     let results = router
//!         .search_with_unified_failover("Rust programming language", Some(5))
//!         .await?;
//!     for result in results {
//!         println!("{}: {}", result.title, result.url);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod host;
pub mod providers;
pub mod router;
pub mod types;
pub mod utils;

// Re-export common types
pub use chain::{resolve_provider_chain, resolve_source_chain};
pub use config::{AdapterConfig, AdapterUpdate, ConfigStore, RouterConfig};
pub use cooldown::{CooldownTracker, RateLimitClassifier};
pub use error::{SearchError, SearchResult as Result};
pub use host::HostSettings;
pub use providers::ProviderRegistry;
pub use router::SearchRouter;
pub use types::{
    available_sources, AdapterId, OfficialSearch, OfficialSource, SearchAdapter, SearchResult,
    SourceId,
};
