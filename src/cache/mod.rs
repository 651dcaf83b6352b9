//! Listing result cache.
//!
//! Short-TTL memoization of listing results for the server variant. The
//! cache is an injected component, not ambient global state, so the CLI can
//! run with [`NoopCache`] and the listing logic stays identical.
//!
//! Any successful create or delete clears the whole map: an insertion or
//! removal shifts filename-derived ordering and every pagination window
//! with it, so per-key invalidation would serve wrong pages. A reader
//! racing a write may serve a result stale by at most one TTL; that bound
//! is accepted.

use crate::models::NoteListing;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default time-to-live for cached listings.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

const DEFAULT_CAPACITY: usize = 64;

/// Cache keyed by `(page, limit)`.
pub trait ListingCache: Send + Sync {
    /// Returns the cached listing for the window, if present and fresh.
    fn get(&self, page: u32, limit: usize) -> Option<NoteListing>;

    /// Stores a listing for the window.
    fn put(&self, page: u32, limit: usize, listing: &NoteListing);

    /// Drops every entry.
    fn invalidate_all(&self);

    /// Number of live entries (expired entries may be counted until probed).
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Slot {
    listing: NoteListing,
    stored_at: Instant,
}

/// LRU-bounded TTL cache for listing results.
///
/// # Thread Safety
///
/// The map sits behind a `Mutex`; `get` needs exclusive access anyway to
/// refresh LRU order and evict expired slots. Lock poisoning is handled
/// fail-open: a poisoned cache misses, it never blocks an operation.
pub struct TtlCache {
    inner: Mutex<LruCache<(u32, usize), Slot>>,
    ttl: Duration,
}

impl TtlCache {
    /// Creates a cache with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingCache for TtlCache {
    fn get(&self, page: u32, limit: usize) -> Option<NoteListing> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let key = (page, limit);
        let fresh = map
            .get(&key)
            .is_some_and(|slot| slot.stored_at.elapsed() < self.ttl);
        if !fresh {
            map.pop(&key);
            return None;
        }
        map.get(&key).map(|slot| slot.listing.clone())
    }

    fn put(&self, page: u32, limit: usize, listing: &NoteListing) {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.put(
            (page, limit),
            Slot {
                listing: listing.clone(),
                stored_at: Instant::now(),
            },
        );
    }

    fn invalidate_all(&self) {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        map.clear();
    }

    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

/// Cache that stores nothing, for the CLI and library paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl ListingCache for NoopCache {
    fn get(&self, _page: u32, _limit: usize) -> Option<NoteListing> {
        None
    }

    fn put(&self, _page: u32, _limit: usize, _listing: &NoteListing) {}

    fn invalidate_all(&self) {}

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(total: usize) -> NoteListing {
        NoteListing {
            notes: Vec::new(),
            pagination: crate::models::Pagination::compute(1, 5, total),
        }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new();
        cache.put(1, 5, &listing(3));
        let hit = cache.get(1, 5);
        assert!(hit.is_some_and(|l| l.pagination.total == 3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss_on_other_key() {
        let cache = TtlCache::new();
        cache.put(1, 5, &listing(3));
        assert!(cache.get(2, 5).is_none());
        assert!(cache.get(1, 10).is_none());
    }

    #[test]
    fn test_expired_entry_evicted_on_probe() {
        let cache = TtlCache::with_ttl(Duration::ZERO);
        cache.put(1, 5, &listing(3));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1, 5).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_invalidate_all_clears_every_key() {
        let cache = TtlCache::new();
        cache.put(1, 5, &listing(3));
        cache.put(2, 5, &listing(3));
        assert_eq!(cache.len(), 2);
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.get(1, 5).is_none());
    }

    #[test]
    fn test_noop_cache_never_stores() {
        let cache = NoopCache;
        cache.put(1, 5, &listing(3));
        assert!(cache.get(1, 5).is_none());
        assert_eq!(cache.len(), 0);
    }
}
