//! Counters reported by [`super::TaggedCache::stats`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time view of cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: Option<usize>,
    pub hits: u64,
    /// Lookups that found nothing, or found an expired entry
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Entries removed by tag invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache, 0.0 before the first lookup
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter {
    Hit,
    Miss,
    Insert,
    Eviction,
    Expiration,
    Invalidation,
}

/// Atomic counters shared by every clone of a cache
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsCollector {
    counters: Arc<[AtomicU64; 6]>,
}

impl MetricsCollector {
    pub(crate) fn add(&self, counter: Counter, count: u64) {
        self.counters[counter as usize].fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record(&self, counter: Counter) {
        self.add(counter, 1);
    }

    fn load(&self, counter: Counter) -> u64 {
        self.counters[counter as usize].load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self, entries: usize, max_entries: Option<usize>) -> CacheStats {
        CacheStats {
            entries,
            max_entries,
            hits: self.load(Counter::Hit),
            misses: self.load(Counter::Miss),
            inserts: self.load(Counter::Insert),
            evictions: self.load(Counter::Eviction),
            expirations: self.load(Counter::Expiration),
            invalidations: self.load(Counter::Invalidation),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in self.counters.iter() {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_without_lookups_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn collector_snapshot_and_reset() {
        let collector = MetricsCollector::default();
        collector.record(Counter::Hit);
        collector.record(Counter::Hit);
        collector.record(Counter::Miss);
        collector.add(Counter::Invalidation, 3);

        let stats = collector.snapshot(4, Some(10));
        assert_eq!((stats.hits, stats.misses, stats.invalidations), (2, 1, 3));
        assert_eq!(stats.max_entries, Some(10));
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-10);

        collector.reset();
        assert_eq!(collector.snapshot(0, None), CacheStats::default());
    }
}
