//! Chain resolution
//!
//! Both resolvers are pure functions of a loaded [`RouterConfig`]. The
//! unified resolver prefers the `*Source` fields and falls back to the
//! legacy adapter fields, prefixed as `adapter:` sources, when they are empty.

use crate::config::RouterConfig;
use crate::types::{AdapterId, SourceId};

/// Adapter-only chain from the legacy fields
pub fn resolve_provider_chain(cfg: &RouterConfig) -> Vec<AdapterId> {
    let mut chain = Vec::new();
    let head = cfg.primary.or(cfg.active);
    for id in head.into_iter().chain(cfg.fallbacks.iter().copied()) {
        push_unique(&mut chain, id);
    }
    chain
}

/// Unified chain over official and adapter sources
pub fn resolve_source_chain(cfg: &RouterConfig) -> Vec<SourceId> {
    let head = cfg
        .primary_source
        .or_else(|| cfg.primary.or(cfg.active).map(SourceId::Adapter));

    let fallbacks: Vec<SourceId> = if cfg.fallback_sources.is_empty() {
        cfg.fallbacks.iter().copied().map(SourceId::Adapter).collect()
    } else {
        cfg.fallback_sources.clone()
    };

    let mut chain = Vec::new();
    for id in head.into_iter().chain(fallbacks) {
        push_unique(&mut chain, id);
    }
    chain
}

fn push_unique<T: PartialEq>(chain: &mut Vec<T>, id: T) {
    if !chain.contains(&id) {
        chain.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OfficialSource;

    const BRAVE: SourceId = SourceId::Official(OfficialSource::Brave);

    #[test]
    fn test_provider_chain_primary_then_fallbacks() {
        let mut cfg = RouterConfig::default();
        cfg.primary = Some(AdapterId::Serper);
        cfg.fallbacks = vec![AdapterId::Serper, AdapterId::Tavily, AdapterId::Zhipu];
        assert_eq!(
            resolve_provider_chain(&cfg),
            vec![AdapterId::Serper, AdapterId::Tavily, AdapterId::Zhipu]
        );
    }

    #[test]
    fn test_provider_chain_uses_active_without_primary() {
        let mut cfg = RouterConfig::default();
        cfg.active = Some(AdapterId::Zhipu);
        assert_eq!(resolve_provider_chain(&cfg), vec![AdapterId::Zhipu]);
        assert!(resolve_provider_chain(&RouterConfig::default()).is_empty());
    }

    #[test]
    fn test_source_chain_unified_precedence() {
        let mut cfg = RouterConfig::default();
        cfg.primary_source = Some(BRAVE);
        cfg.fallback_sources = vec![SourceId::Adapter(AdapterId::Tavily)];
        let chain: Vec<String> = resolve_source_chain(&cfg).iter().map(|s| s.to_string()).collect();
        assert_eq!(chain, vec!["official:brave", "adapter:tavily"]);
    }

    #[test]
    fn test_source_chain_legacy_fallback() {
        let mut cfg = RouterConfig::default();
        cfg.primary = Some(AdapterId::Serper);
        cfg.fallbacks = vec![AdapterId::Tavily];
        let chain: Vec<String> = resolve_source_chain(&cfg).iter().map(|s| s.to_string()).collect();
        assert_eq!(chain, vec!["adapter:serper", "adapter:tavily"]);
    }

    #[test]
    fn test_source_chain_mixes_unified_head_with_legacy_fallbacks() {
        let mut cfg = RouterConfig::default();
        cfg.primary_source = Some(SourceId::Adapter(AdapterId::Tavily));
        cfg.primary = Some(AdapterId::Serper);
        cfg.fallbacks = vec![AdapterId::Tavily, AdapterId::Zhipu];
        assert_eq!(
            resolve_source_chain(&cfg),
            vec![
                SourceId::Adapter(AdapterId::Tavily),
                SourceId::Adapter(AdapterId::Zhipu)
            ]
        );
    }

    #[test]
    fn test_source_chain_dedups() {
        let mut cfg = RouterConfig::default();
        cfg.primary_source = Some(BRAVE);
        cfg.fallback_sources = vec![BRAVE, SourceId::Adapter(AdapterId::Serper), BRAVE];
        assert_eq!(
            resolve_source_chain(&cfg),
            vec![BRAVE, SourceId::Adapter(AdapterId::Serper)]
        );
        assert!(resolve_source_chain(&RouterConfig::default()).is_empty());
    }
}
