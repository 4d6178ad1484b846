//! Rate-limit cooldowns
//!
//! Cooldowns live only in process memory. A source that failed with a
//! rate-limit looking error is skipped until its expiry passes; expired
//! entries are simply ignored rather than swept.

use crate::config::clamp_cooldown;
use crate::error::SearchError;
use std::collections::HashMap;

/// Markers matched case-insensitively against an error's text
pub const DEFAULT_RATE_LIMIT_MARKERS: [&str; 6] = [
    "429",
    "rate limit",
    "too many requests",
    "quota",
    "限流",
    "配额",
];

/// Current time in epoch seconds
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Decides whether a failure should put its source on cooldown
#[derive(Debug, Clone)]
pub struct RateLimitClassifier {
    markers: Vec<String>,
}

impl Default for RateLimitClassifier {
    fn default() -> Self {
        Self {
            markers: DEFAULT_RATE_LIMIT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl RateLimitClassifier {
    /// Add an extra marker on top of the defaults
    pub fn with_marker(mut self, marker: &str) -> Self {
        let marker = marker.trim().to_lowercase();
        if !marker.is_empty() && !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn is_rate_limitish(&self, error: &SearchError) -> bool {
        if error.status_code() == Some(429) {
            return true;
        }
        let text = error.to_string().to_lowercase();
        self.markers.iter().any(|m| text.contains(m.as_str()))
    }
}

/// Source id (or bare adapter id) to cooldown expiry
#[derive(Debug, Default)]
pub struct CooldownTracker {
    until: HashMap<String, i64>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on_cooldown(&self, id: &str, now: i64) -> bool {
        self.until.get(id).is_some_and(|&expiry| expiry > now)
    }

    /// Start a cooldown of `cooldown_seconds`, clamped to `[5, 3600]`
    pub fn mark_rate_limited(&mut self, id: &str, cooldown_seconds: i64, now: i64) {
        let expiry = now + clamp_cooldown(cooldown_seconds) as i64;
        log::info!("{id} rate limited, cooling down until {expiry}");
        self.until.insert(id.to_string(), expiry);
    }

    /// Seconds of cooldown left, zero when inactive
    pub fn remaining(&self, id: &str, now: i64) -> u64 {
        self.until
            .get(id)
            .map(|&expiry| (expiry - now).max(0) as u64)
            .unwrap_or(0)
    }

    /// Forget every cooldown
    pub fn reset(&mut self) {
        self.until.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(msg: &str) -> SearchError {
        SearchError::NetworkError(msg.to_string())
    }

    #[test]
    fn test_cooldown_window() {
        let mut tracker = CooldownTracker::new();
        assert!(!tracker.is_on_cooldown("serper", 1_000));

        tracker.mark_rate_limited("serper", 60, 1_000);
        assert!(tracker.is_on_cooldown("serper", 1_000));
        assert!(tracker.is_on_cooldown("serper", 1_059));
        assert!(!tracker.is_on_cooldown("serper", 1_060));
        assert_eq!(tracker.remaining("serper", 1_010), 50);
        assert_eq!(tracker.remaining("serper", 2_000), 0);
        assert!(!tracker.is_on_cooldown("adapter:serper", 1_010));
    }

    #[test]
    fn test_cooldown_is_clamped() {
        let mut tracker = CooldownTracker::new();
        tracker.mark_rate_limited("a", 1, 0);
        tracker.mark_rate_limited("b", 100_000, 0);
        assert_eq!(tracker.remaining("a", 0), 5);
        assert_eq!(tracker.remaining("b", 0), 3600);
    }

    #[test]
    fn test_reset_clears_entries() {
        let mut tracker = CooldownTracker::new();
        tracker.mark_rate_limited("tavily", 60, 0);
        tracker.reset();
        assert!(!tracker.is_on_cooldown("tavily", 1));
    }

    #[test]
    fn test_rate_limit_classification() {
        let classifier = RateLimitClassifier::default();
        let cases = vec![
            (failure("429 Too Many Requests"), true),
            (failure("Rate Limit exceeded"), true),
            (failure("monthly QUOTA used up"), true),
            (failure("请求过于频繁，已限流"), true),
            (failure("账户配额不足"), true),
            (failure("invalid api key"), false),
        ];
        for (error, expected) in cases {
            assert_eq!(classifier.is_rate_limitish(&error), expected, "{error}");
        }

        let status_only = SearchError::HttpError {
            message: "upstream refused".to_string(),
            status_code: Some(429),
            response_body: None,
        };
        assert!(classifier.is_rate_limitish(&status_only));
    }

    #[test]
    fn test_classifier_extra_marker() {
        let classifier = RateLimitClassifier::default().with_marker(" Throttled ");
        assert!(classifier.is_rate_limitish(&failure("request throttled")));
        assert_eq!(classifier.markers().len(), 7);
    }
}
