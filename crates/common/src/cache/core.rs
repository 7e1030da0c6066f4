//! Core tagged cache implementation
//!
//! Entries expire when their own TTL elapses and can be dropped in bulk by
//! tag. Expired entries are removed lazily on access and by
//! [`TaggedCache::cleanup_expired`].

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::config::{CacheConfig, EvictionPolicy};
use super::stats::{CacheStats, Counter, MetricsCollector};
use crate::time::{Clock, SystemClock};

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    Hit(V),
    Miss,
}

impl<V> CacheLookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn outcome(&self) -> CacheOutcome {
        match self {
            Self::Hit(_) => CacheOutcome::Hit,
            Self::Miss => CacheOutcome::Miss,
        }
    }

    pub fn into_option(self) -> Option<V> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss => None,
        }
    }
}

/// Whether a value came from the cache or was freshly computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Entry stored in the cache with its expiry and tag metadata
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Option<Duration>,
    tags: HashSet<String>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.duration_since(self.inserted_at) >= ttl)
    }
}

/// Internal storage for cache entries
#[derive(Debug)]
struct CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    entries: HashMap<K, CacheEntry<V>>,
    /// Oldest first; lookups move a key to the back under LRU
    access_order: Vec<K>,
}

impl<K, V> CacheStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self { entries: HashMap::new(), access_order: Vec::new() }
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.access_order.retain(|k| k != key);
        self.entries.remove(key)
    }
}

/// Thread-safe cache with per-entry TTL and tag-based invalidation
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for time-based operations (defaults to `SystemClock`)
pub struct TaggedCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    storage: Arc<RwLock<CacheStorage<K, V>>>,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> TaggedCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache with the given configuration using system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TaggedCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    /// Create a new cache with a custom clock (useful for testing)
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            storage: Arc::new(RwLock::new(CacheStorage::new())),
            config,
            metrics: MetricsCollector::default(),
            clock,
        }
    }

    /// Insert an untagged value using the default TTL
    pub fn insert(&self, key: K, value: V) {
        self.insert_tagged(key, value, None, std::iter::empty::<String>());
    }

    /// Insert a value with an explicit TTL (or the default) and a tag set
    ///
    /// Re-inserting an existing key replaces its value, TTL and tags.
    pub fn insert_tagged<I, T>(&self, key: K, value: V, ttl: Option<Duration>, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut storage = self.storage.write();

        if let Some(limit) = self.config.max_entries {
            if storage.entries.len() >= limit && !storage.entries.contains_key(&key) {
                self.evict_one(&mut storage);
            }
        }

        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
            ttl: ttl.or(self.config.default_ttl),
            tags: tags.into_iter().map(Into::into).collect(),
        };
        storage.entries.insert(key.clone(), entry);
        storage.access_order.retain(|k| k != &key);
        storage.access_order.push(key);
        self.count(Counter::Insert, 1);
    }

    /// Look a key up, reporting an explicit hit or miss
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn lookup(&self, key: &K) -> CacheLookup<V> {
        let mut storage = self.storage.write();
        let now = self.clock.now();

        let value = match storage.entries.get(key) {
            Some(entry) if entry.is_expired(now) => None,
            Some(entry) => Some(entry.value.clone()),
            None => {
                self.count(Counter::Miss, 1);
                return CacheLookup::Miss;
            }
        };

        let Some(value) = value else {
            storage.remove(key);
            self.count(Counter::Expiration, 1);
            self.count(Counter::Miss, 1);
            return CacheLookup::Miss;
        };

        if self.config.eviction_policy == EvictionPolicy::LeastRecentlyUsed {
            storage.access_order.retain(|k| k != key);
            storage.access_order.push(key.clone());
        }
        self.count(Counter::Hit, 1);
        CacheLookup::Hit(value)
    }

    /// Convenience wrapper over [`Self::lookup`]
    pub fn get(&self, key: &K) -> Option<V> {
        self.lookup(key).into_option()
    }

    /// Return the cached value, or compute, insert and return a fresh one
    pub fn get_or_insert_with<I, T, F>(
        &self,
        key: K,
        ttl: Option<Duration>,
        tags: I,
        compute: F,
    ) -> (V, CacheOutcome)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: FnOnce() -> V,
    {
        if let CacheLookup::Hit(value) = self.lookup(&key) {
            return (value, CacheOutcome::Hit);
        }

        let value = compute();
        self.insert_tagged(key, value.clone(), ttl, tags);
        (value, CacheOutcome::Miss)
    }

    /// `exists ∧ age < ttl`; invalidated entries no longer exist.
    ///
    /// Does not touch access order or metrics.
    pub fn is_valid(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.storage.read().entries.get(key).is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove every entry whose tag set contains `tag`
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut storage = self.storage.write();
        let doomed: Vec<K> = storage
            .entries
            .iter()
            .filter(|(_, entry)| entry.tags.contains(tag))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            storage.remove(key);
        }

        self.count(Counter::Invalidation, doomed.len() as u64);
        debug!(tag, removed = doomed.len(), "cache tag invalidated");
        doomed.len()
    }

    /// Remove a value from the cache
    pub fn remove(&self, key: &K) -> Option<V> {
        self.storage.write().remove(key).map(|entry| entry.value)
    }

    /// Clear all entries and reset metrics
    pub fn clear(&self) {
        let mut storage = self.storage.write();
        storage.entries.clear();
        storage.access_order.clear();

        if self.config.track_metrics {
            self.metrics.reset();
        }
    }

    /// Get the current number of entries (expired ones included until swept)
    pub fn len(&self) -> usize {
        self.storage.read().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired entries
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut storage = self.storage.write();

        let expired: Vec<K> = storage
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            storage.remove(key);
        }
        self.count(Counter::Expiration, expired.len() as u64);

        expired.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len(), self.config.max_entries)
    }

    fn count(&self, counter: Counter, n: u64) {
        if self.config.track_metrics && n > 0 {
            self.metrics.add(counter, n);
        }
    }

    /// Evict one entry based on the configured policy
    fn evict_one(&self, storage: &mut CacheStorage<K, V>) {
        let victim = match self.config.eviction_policy {
            EvictionPolicy::LeastRecentlyUsed => storage.access_order.first().cloned(),
            EvictionPolicy::Never => None,
        };

        if let Some(key) = victim {
            storage.remove(&key);
            self.count(Counter::Eviction, 1);
        }
    }
}

impl<K, V, C> Clone for TaggedCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock + Clone,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use super::*;
    use crate::time::MockClock;

    fn ttl_cache(clock: &MockClock) -> TaggedCache<String, i32, MockClock> {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(10))
            .eviction_policy(EvictionPolicy::Never)
            .track_metrics(true)
            .build();
        TaggedCache::with_clock(config, clock.clone())
    }

    #[test]
    fn test_lookup_reports_hit_and_miss() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);

        cache.insert("a".to_string(), 1);

        assert_eq!(cache.lookup(&"a".to_string()), CacheLookup::Hit(1));
        assert_eq!(cache.lookup(&"b".to_string()), CacheLookup::Miss);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
    }

    #[test]
    fn test_default_ttl_expiration() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);

        cache.insert("key".to_string(), 42);
        clock.advance(Duration::from_secs(9));
        assert!(cache.is_valid(&"key".to_string()));

        clock.advance(Duration::from_secs(1));
        assert!(!cache.is_valid(&"key".to_string()));
        assert_eq!(cache.lookup(&"key".to_string()), CacheLookup::Miss);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_per_entry_ttl_overrides_default() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);

        cache.insert_tagged("short".to_string(), 1, Some(Duration::from_secs(2)), ["x"]);
        cache.insert_tagged("long".to_string(), 2, Some(Duration::from_secs(60)), ["x"]);

        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.get(&"long".to_string()), Some(2));
    }

    #[test]
    fn test_invalidate_tag_only_touches_tagged_entries() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);

        cache.insert_tagged("team-5".to_string(), 5, None, ["team:5", "company"]);
        cache.insert_tagged("team-6".to_string(), 6, None, ["team:6", "company"]);
        cache.insert_tagged("sprint".to_string(), 1, None, ["sprint"]);

        assert_eq!(cache.invalidate_tag("team:5"), 1);
        assert!(!cache.is_valid(&"team-5".to_string()));
        assert!(cache.is_valid(&"team-6".to_string()));
        assert!(cache.is_valid(&"sprint".to_string()));

        assert_eq!(cache.invalidate_tag("company"), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn test_invalidate_unknown_tag_is_noop() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);
        cache.insert_tagged("a".to_string(), 1, None, ["team:1"]);

        assert_eq!(cache.invalidate_tag("team:10"), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reinsert_replaces_tags() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);

        cache.insert_tagged("a".to_string(), 1, None, ["old"]);
        cache.insert_tagged("a".to_string(), 2, None, ["new"]);

        assert_eq!(cache.invalidate_tag("old"), 0);
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn test_get_or_insert_with_reports_outcome() {
        let clock = MockClock::new();
        let cache = ttl_cache(&clock);
        let mut calls = 0;

        let (first, outcome) = cache.get_or_insert_with("k".to_string(), None, ["t"], || {
            calls += 1;
            10
        });
        assert_eq!((first, outcome), (10, CacheOutcome::Miss));

        let (second, outcome) = cache.get_or_insert_with("k".to_string(), None, ["t"], || {
            calls += 1;
            20
        });
        assert_eq!((second, outcome), (10, CacheOutcome::Hit));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_lru_eviction_respects_access_order() {
        let cache: TaggedCache<String, i32> = TaggedCache::new(CacheConfig::builder().max_entries(2).build());

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        let _ = cache.lookup(&"a".to_string());
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn test_clone_shares_storage() {
        let cache1: TaggedCache<String, i32> = TaggedCache::new(CacheConfig::default());
        let cache2 = cache1.clone();

        cache1.insert_tagged("k".to_string(), 1, None, ["team:1"]);
        assert_eq!(cache2.invalidate_tag("team:1"), 1);
        assert!(cache1.is_empty());
    }
}
