//! Short-lived memoization of listing results.
//!
//! Entries live for a fixed TTL and are dropped lazily on expired access.
//! When an insert pushes the map over capacity, one eviction pass (serialized
//! by a mutex) removes expired entries and then the soonest-to-expire ones
//! until the map is back at capacity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use super::types::{ListingQuery, ListingResult};

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for expiry tests.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[derive(Debug)]
struct CachedListing {
    result: Arc<ListingResult>,
    expires_at: Instant,
}

/// TTL-bounded, size-capped listing cache keyed by the full query.
pub struct ResultCache {
    entries: DashMap<ListingQuery, CachedListing>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    eviction: Mutex<()>,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl ResultCache {
    /// Cache using the system clock.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    /// Cache with an injected clock.
    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
            clock,
            eviction: Mutex::new(()),
        }
    }

    /// Look up a live result. Expired entries are removed on access.
    pub fn get(&self, query: &ListingQuery) -> Option<Arc<ListingResult>> {
        let now = self.clock.now();
        let entry = self.entries.get(query)?;
        if now < entry.expires_at {
            return Some(Arc::clone(&entry.result));
        }
        drop(entry);
        self.entries
            .remove_if(query, |_, cached| now >= cached.expires_at);
        trace!(subfolder = %query.subfolder, "Listing cache entry expired");
        None
    }

    /// Store a result, evicting if the cache grows past capacity.
    pub fn put(&self, query: ListingQuery, result: Arc<ListingResult>) {
        if self.capacity == 0 || self.ttl.is_zero() {
            return;
        }
        let expires_at = self.clock.now() + self.ttl;
        self.entries
            .insert(query, CachedListing { result, expires_at });

        if self.entries.len() > self.capacity {
            self.evict();
        }
    }

    fn evict(&self) {
        let _guard = self.eviction.lock();
        let now = self.clock.now();
        self.entries.retain(|_, cached| now < cached.expires_at);

        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }

        let mut by_expiry: Vec<(Instant, ListingQuery)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().expires_at, entry.key().clone()))
            .collect();
        by_expiry.sort_by_key(|(expires_at, _)| *expires_at);

        for (_, query) in by_expiry.into_iter().take(excess) {
            self.entries.remove(&query);
        }
        trace!(evicted = excess, "Listing cache over capacity");
    }

    /// Number of stored entries, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(subfolder: &str) -> ListingQuery {
        ListingQuery::new("/media", subfolder)
    }

    fn result() -> Arc<ListingResult> {
        Arc::new(ListingResult::new(Vec::new(), &query(""), 0))
    }

    #[test]
    fn test_hit_within_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(Duration::from_secs(3), 8, clock.clone());
        let stored = result();
        cache.put(query("a"), Arc::clone(&stored));

        clock.advance(Duration::from_secs(2));
        let hit = cache.get(&query("a")).unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(Duration::from_secs(3), 8, clock.clone());
        cache.put(query("a"), result());

        clock.advance(Duration::from_secs(3));
        assert!(cache.get(&query("a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_bust_varies_key() {
        let cache = ResultCache::new(Duration::from_secs(3), 8);
        cache.put(query("a"), result());

        let mut busted = query("a");
        busted.cache_bust = Some("123".into());
        assert!(cache.get(&busted).is_none());
        assert!(cache.get(&query("a")).is_some());
    }

    #[test]
    fn test_evicts_soonest_expiring() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(Duration::from_secs(10), 2, clock.clone());

        cache.put(query("oldest"), result());
        clock.advance(Duration::from_secs(1));
        cache.put(query("middle"), result());
        clock.advance(Duration::from_secs(1));
        cache.put(query("newest"), result());

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&query("oldest")).is_none());
        assert!(cache.get(&query("middle")).is_some());
        assert!(cache.get(&query("newest")).is_some());
    }

    #[test]
    fn test_eviction_prefers_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(Duration::from_secs(2), 2, clock.clone());

        cache.put(query("a"), result());
        cache.put(query("b"), result());
        clock.advance(Duration::from_secs(5));
        cache.put(query("c"), result());

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&query("c")).is_some());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ResultCache::new(Duration::from_secs(3), 0);
        cache.put(query("a"), result());
        assert!(cache.get(&query("a")).is_none());
    }
}
