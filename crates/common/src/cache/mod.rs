//! Tagged TTL cache for derived aggregates
//!
//! Entries carry their own time-to-live and a set of string tags. A lookup
//! reports an explicit [`CacheLookup::Hit`] or [`CacheLookup::Miss`], and
//! [`TaggedCache::invalidate_tag`] drops every entry sharing a tag, which is
//! how dependent aggregates are cleared when their inputs change.
//!
//! # Features
//!
//! - **Thread-safe**: `Arc<RwLock<>>` storage, clones share entries
//! - **Per-entry TTL**: falls back to the configured default TTL
//! - **Tag invalidation**: bulk removal by label (e.g. `team:5`)
//! - **Bounded**: optional entry limit with LRU eviction
//! - **Metrics tracking**: hit/miss/insert/eviction/expiration/invalidation
//! - **Testable**: Clock abstraction for deterministic time-based testing
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use sprintsync_common::cache::{CacheConfig, CacheLookup, TaggedCache};
//!
//! let cache: TaggedCache<String, u32> = TaggedCache::new(CacheConfig::ttl(Duration::from_secs(60)));
//! cache.insert_tagged("team-5".to_string(), 80, None, ["team:5", "company"]);
//!
//! assert_eq!(cache.lookup(&"team-5".to_string()), CacheLookup::Hit(80));
//! assert_eq!(cache.invalidate_tag("team:5"), 1);
//! assert_eq!(cache.lookup(&"team-5".to_string()), CacheLookup::Miss);
//! ```

mod config;
mod core;
mod stats;

pub use self::config::{CacheConfig, CacheConfigBuilder, EvictionPolicy};
pub use self::core::{CacheLookup, CacheOutcome, TaggedCache};
pub use self::stats::CacheStats;
