//! Cache configuration

use std::time::Duration;

/// What happens when a bounded cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Drop the entry that was looked up least recently
    #[default]
    LeastRecentlyUsed,
    /// Refuse nothing and evict nothing; entries leave by TTL or tag only
    Never,
}

/// Configuration for a [`super::TaggedCache`]
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Entry limit; `None` means unbounded
    pub max_entries: Option<usize>,
    /// TTL for entries inserted without one of their own
    pub default_ttl: Option<Duration>,
    pub eviction_policy: EvictionPolicy,
    /// Count hits, misses, evictions and invalidations
    pub track_metrics: bool,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Unbounded cache whose entries expire after `duration`
    pub fn ttl(duration: Duration) -> Self {
        Self { default_ttl: Some(duration), eviction_policy: EvictionPolicy::Never, ..Self::default() }
    }
}

/// Fluent builder for [`CacheConfig`]
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn max_entries(mut self, limit: usize) -> Self {
        self.config.max_entries = Some(limit);
        self
    }

    pub fn default_ttl(mut self, duration: Duration) -> Self {
        self.config.default_ttl = Some(duration);
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction_policy = policy;
        self
    }

    pub fn track_metrics(mut self, enabled: bool) -> Self {
        self.config.track_metrics = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_preset_is_unbounded() {
        let config = CacheConfig::ttl(Duration::from_secs(30));
        assert_eq!(config.default_ttl, Some(Duration::from_secs(30)));
        assert_eq!(config.eviction_policy, EvictionPolicy::Never);
        assert!(config.max_entries.is_none());
        assert!(!config.track_metrics);
    }

    #[test]
    fn builder_defaults_to_lru() {
        let config = CacheConfig::builder().max_entries(16).track_metrics(true).build();

        assert_eq!(config.max_entries, Some(16));
        assert_eq!(config.eviction_policy, EvictionPolicy::LeastRecentlyUsed);
        assert!(config.default_ttl.is_none());
        assert!(config.track_metrics);
    }
}
