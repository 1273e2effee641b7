// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! TTL-keyed response cache
//!
//! Entries expire lazily: validity is checked on read and there is no background
//! timer. When a write pushes the entry count past the soft limit, a sweep removes
//! entries whose expiry has already passed. Unexpired entries are never evicted, so
//! the limit is advisory rather than a hard capacity.

use std::{
    fmt::{self, Display},
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use market_types::{CreatorPage, ProductPage, SortBy, VideoPage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

const DEFAULT_TTL_SECONDS: u64 = 300;
const DEFAULT_SOFT_LIMIT: usize = 200;

/// A cached value with its expiry instant
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// Instant after which the entry is stale
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Create an entry expiring `ttl` from now
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// An entry is valid iff `now < expires_at`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Generic TTL cache with opportunistic expiry sweeps
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    soft_limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    expired: AtomicU64,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    /// Create a cache with a 300s TTL and a soft limit of 200 entries
    pub fn new() -> Self {
        Self::with_settings(
            Duration::from_secs(DEFAULT_TTL_SECONDS),
            DEFAULT_SOFT_LIMIT,
        )
    }

    /// Create a cache with custom settings
    pub fn with_settings(ttl: Duration, soft_limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            soft_limit,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    /// Default TTL applied by [`TtlCache::set`]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a value, dropping it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_valid_at(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(cache_key = %key, "cache hit");
                return Some(entry.value.clone());
            }
            // the shard lock must be released before removing
            drop(entry);

            if self
                .entries
                .remove_if(key, |_, entry| !entry.is_valid_at(Instant::now()))
                .is_some()
            {
                self.expired.fetch_add(1, Ordering::Relaxed);
                debug!(cache_key = %key, "expired cache entry removed");
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value with the default TTL
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.ttl);
    }

    /// Store a value, overwriting any previous entry for the key
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        trace!(cache_key = %key, ttl_ms = ttl.as_millis(), "storing cache entry");
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stores.fetch_add(1, Ordering::Relaxed);

        if self.entries.len() > self.soft_limit {
            self.cleanup_expired();
        }
    }

    /// Remove every entry whose expiry has passed, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid_at(now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            self.expired.fetch_add(removed as u64, Ordering::Relaxed);
            info!(
                removed_entries = removed,
                remaining_entries = self.entries.len(),
                soft_limit = self.soft_limit,
                "swept expired cache entries"
            );
        }

        removed
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
        debug!("cleared response cache");
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.entries.len(),
            hits,
            misses,
            stores: self.stores.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            hit_rate,
            soft_limit: self.soft_limit,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub entry_count: usize,
    /// Reads answered from the cache
    pub hits: u64,
    /// Reads that found nothing valid
    pub misses: u64,
    /// Writes
    pub stores: u64,
    /// Entries removed because they expired
    pub expired: u64,
    /// Hit rate (0.0 to 1.0)
    pub hit_rate: f64,
    /// Entry count that triggers an expiry sweep
    pub soft_limit: usize,
    /// Default TTL in seconds
    pub ttl_seconds: u64,
}

/// Deterministic key of one downstream query, built from its effective parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Product ranking page
    Products {
        /// Market region
        region: String,
        /// Logical page
        page: u32,
        /// Requested page size
        page_size: u32,
        /// Resolved sort order
        sort_by: SortBy,
        /// Search keywords
        keywords: String,
    },
    /// Product video page
    Videos {
        /// Product identifier
        product_id: String,
        /// Day window, clamped to 1..=28
        date_type: u32,
        /// Page number
        page: u32,
        /// Page size, capped at 10
        page_size: u32,
    },
    /// Creator ranking page
    Creators {
        /// Market region
        region: String,
        /// Page number
        page: u32,
        /// Page size, capped at 10
        page_size: u32,
        /// Ranking period with its default applied
        date_type: String,
        /// Ranking period anchor, empty when absent
        date_value: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Products {
                region,
                page,
                page_size,
                sort_by,
                keywords,
            } => write!(f, "products:{region}:{page}:{page_size}:{sort_by}:{keywords}"),
            Self::Videos {
                product_id,
                date_type,
                page,
                page_size,
            } => write!(f, "videos:{product_id}:{date_type}:{page}:{page_size}"),
            Self::Creators {
                region,
                page,
                page_size,
                date_type,
                date_value,
            } => write!(
                f,
                "creators:{region}:{page}:{page_size}:{date_type}:{date_value}"
            ),
        }
    }
}

/// Cached downstream result
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPage {
    /// Result of a product search
    Products(ProductPage),
    /// Result of a product video lookup
    Videos(VideoPage),
    /// Result of a creator ranking lookup
    Creators(CreatorPage),
}

/// The cache shared by every aggregator operation
pub type ResponseCache = TtlCache<CacheKey, CachedPage>;

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn key(page: u32) -> CacheKey {
        CacheKey::Products {
            region: "JP".to_string(),
            page,
            page_size: 50,
            sort_by: SortBy::Day7Gmv,
            keywords: String::new(),
        }
    }

    fn page(total: u64) -> CachedPage {
        CachedPage::Products(ProductPage {
            total,
            products: vec![],
        })
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = ResponseCache::with_settings(Duration::from_secs(1), 200);
        cache.set(key(1), page(7));
        assert_eq!(cache.get(&key(1)), Some(page(7)));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = ResponseCache::with_settings(Duration::from_millis(10), 200);
        cache.set(key(1), page(7));
        assert!(cache.get(&key(1)).is_some());

        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&key(1)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = ResponseCache::new();
        cache.set(key(1), page(1));
        cache.set(key(1), page(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key(1)), Some(page(2)));
    }

    #[test]
    fn keys_differ_by_every_parameter() {
        let base = key(1);
        let other_sort = CacheKey::Products {
            region: "JP".to_string(),
            page: 1,
            page_size: 50,
            sort_by: SortBy::TotalGmv,
            keywords: String::new(),
        };
        let other_keywords = CacheKey::Products {
            region: "JP".to_string(),
            page: 1,
            page_size: 50,
            sort_by: SortBy::Day7Gmv,
            keywords: "lipstick".to_string(),
        };

        assert_ne!(base, key(2));
        assert_ne!(base, other_sort);
        assert_ne!(base, other_keywords);
        assert_eq!(base.to_string(), "products:JP:1:50:day7_gmv:");
    }

    #[test]
    fn sweep_over_soft_limit_removes_only_expired_entries() {
        let cache = ResponseCache::with_settings(Duration::from_secs(60), 3);

        cache.set_with_ttl(key(1), page(1), Duration::from_millis(5));
        cache.set_with_ttl(key(2), page(2), Duration::from_millis(5));
        cache.set(key(3), page(3));
        thread::sleep(Duration::from_millis(15));

        // fourth write exceeds the soft limit and triggers the sweep
        cache.set(key(4), page(4));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(3)), Some(page(3)));
        assert_eq!(cache.get(&key(4)), Some(page(4)));
    }

    #[test]
    fn soft_limit_is_advisory_for_unexpired_entries() {
        let cache = ResponseCache::with_settings(Duration::from_secs(60), 2);
        for index in 0..5 {
            cache.set(key(index), page(u64::from(index)));
        }

        assert_eq!(cache.len(), 5);
        for index in 0..5 {
            assert!(cache.get(&key(index)).is_some());
        }
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = ResponseCache::new();
        assert_eq!(cache.get(&key(1)), None);
        cache.set(key(1), page(1));
        assert!(cache.get(&key(1)).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stores, 1);
        assert_eq!(stats.soft_limit, 200);
        assert_eq!(stats.ttl_seconds, 300);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_drops_everything() {
        let cache = ResponseCache::new();
        cache.set(key(1), page(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
