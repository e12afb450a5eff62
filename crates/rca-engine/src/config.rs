//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cached read results
    pub cache_capacity: u64,
    /// Optional time-to-live of cached read results, in seconds
    pub cache_ttl_secs: Option<u64>,
    /// Deepest hierarchy walked by tree building and cascade deletion
    pub max_hierarchy_depth: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With cache time-to-live, rounded up to whole seconds
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        let partial = u64::from(ttl.subsec_nanos() > 0);
        self.cache_ttl_secs = Some(ttl.as_secs().saturating_add(partial));
        self
    }

    /// With maximum hierarchy depth
    #[inline]
    #[must_use]
    pub fn with_max_hierarchy_depth(mut self, depth: usize) -> Self {
        self.max_hierarchy_depth = depth;
        self
    }

    /// Cache time-to-live, if configured
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
            cache_ttl_secs: None,
            max_hierarchy_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.cache_capacity, 10_000);
        assert_eq!(config.cache_ttl(), None);
        assert_eq!(config.max_hierarchy_depth, 64);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_cache_capacity(5)
            .with_cache_ttl(Duration::from_secs(30))
            .with_max_hierarchy_depth(3);

        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_hierarchy_depth, 3);
    }

    #[test]
    fn sub_second_ttl_rounds_up() {
        let config = EngineConfig::new().with_cache_ttl(Duration::from_millis(250));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(1)));

        let config = EngineConfig::new().with_cache_ttl(Duration::from_millis(2_001));
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_hierarchy_depth": 8}"#).unwrap();
        assert_eq!(config.max_hierarchy_depth, 8);
        assert_eq!(config.cache_capacity, 10_000);
    }
}
