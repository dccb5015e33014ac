//! FIFO-with-replacement result cache.

use echoip_core::{AddressInfo, AddressKey, EchoipError, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use tracing::{debug, info};

use crate::CacheStats;

/// Bounded cache from address to its enrichment result.
///
/// Entries live in an arena ordered by insertion sequence number, with a
/// key index pointing into it. The smallest sequence number is always the
/// oldest entry and is the one evicted. Reading an entry does not change its
/// position, so this is not an LRU.
///
/// A capacity of 0 disables caching: `set` is a no-op and `get` always misses.
#[derive(Debug, Default)]
pub struct ResultCache {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    capacity: usize,
    index: HashMap<AddressKey, u64>,
    order: BTreeMap<u64, Entry>,
    next_seq: u64,
    evictions: u64,
}

#[derive(Debug)]
struct Entry {
    key: AddressKey,
    info: AddressInfo,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                capacity,
                ..Inner::default()
            }),
        }
    }

    /// Look up the cached result for an address
    pub fn get(&self, ip: IpAddr) -> Option<AddressInfo> {
        let key = AddressKey::of(ip);
        let inner = self.inner.read();
        let seq = inner.index.get(&key)?;
        inner.order.get(seq).map(|entry| entry.info.clone())
    }

    /// Store the result for an address.
    ///
    /// A new address arriving at capacity evicts the oldest entries first.
    /// An address already present is replaced and becomes the newest entry.
    pub fn set(&self, ip: IpAddr, info: AddressInfo) {
        let key = AddressKey::of(ip);
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if inner.capacity == 0 {
            return;
        }

        if let Some(old_seq) = inner.index.remove(&key) {
            inner.order.remove(&old_seq);
        } else {
            let evicted = inner.evict_to(inner.capacity - 1);
            if evicted > 0 {
                debug!(%ip, evicted, "evicted oldest cache entries");
            }
            inner.evictions += evicted;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.index.insert(key, seq);
        inner.order.insert(seq, Entry { key, info });
    }

    /// Change the capacity.
    ///
    /// Shrinking evicts the oldest entries down to the new capacity right
    /// away. The eviction counter is reset to zero afterwards, so the shrink
    /// itself is not counted. Negative capacities are rejected without
    /// touching the cache.
    pub fn resize(&self, capacity: i64) -> Result<()> {
        let capacity = usize::try_from(capacity)
            .map_err(|_| EchoipError::InvalidArgument(format!("invalid capacity: {capacity}")))?;

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let previous = inner.capacity;
        inner.capacity = capacity;
        let dropped = inner.evict_to(capacity);
        inner.evictions = 0;

        info!(previous, capacity, dropped, "resized result cache");
        Ok(())
    }

    /// Snapshot of capacity, size and evictions
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            capacity: inner.capacity,
            size: inner.index.len(),
            evictions: inner.evictions,
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured maximum number of entries
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }
}

impl Inner {
    /// Remove oldest entries until at most `limit` remain; returns how many went.
    fn evict_to(&mut self, limit: usize) -> u64 {
        let mut evicted = 0;
        while self.index.len() > limit {
            let Some((_, entry)) = self.order.pop_first() else {
                break;
            };
            self.index.remove(&entry.key);
            evicted += 1;
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn nth(i: usize) -> IpAddr {
        ip(&format!("192.0.2.{i}"))
    }

    fn info(ip: IpAddr) -> AddressInfo {
        AddressInfo::new(ip)
    }

    fn fill(cache: &ResultCache, count: usize) {
        for i in 0..count {
            cache.set(nth(i), info(nth(i)));
        }
    }

    /// Index and order must describe the same set of entries.
    fn assert_consistent(cache: &ResultCache) {
        let inner = cache.inner.read();
        assert_eq!(inner.index.len(), inner.order.len());
        for (key, seq) in &inner.index {
            assert_eq!(inner.order.get(seq).map(|e| e.key), Some(*key));
        }
    }

    #[test]
    fn test_capacity() {
        // (added, capacity, size, evictions)
        let cases = [(1, 0, 0, 0), (1, 2, 1, 0), (2, 2, 2, 0), (3, 2, 2, 1), (10, 5, 5, 5)];
        for (added, capacity, size, evictions) in cases {
            let cache = ResultCache::new(capacity);
            fill(&cache, added);

            let stats = cache.stats();
            assert_eq!(stats.size, size, "size for {added} into {capacity}");
            assert_eq!(stats.evictions, evictions, "evictions for {added} into {capacity}");
            assert_consistent(&cache);

            if capacity > 0 && added > capacity {
                assert!(cache.get(nth(added - 1)).is_some());
                assert!(cache.get(nth(0)).is_none());
            }
        }
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let cache = ResultCache::new(3);
        for i in 0..50 {
            cache.set(nth(i % 7), info(nth(i % 7)));
            assert!(cache.len() <= 3);
        }
        assert_consistent(&cache);
    }

    #[test]
    fn test_eviction_order() {
        let cache = ResultCache::new(4);
        fill(&cache, 5);
        assert!(cache.get(nth(0)).is_none());
        for i in 1..5 {
            assert!(cache.get(nth(i)).is_some(), "192.0.2.{i} should be cached");
        }
    }

    #[test]
    fn test_duplicate_key() {
        let cache = ResultCache::new(10);
        let addr = ip("192.0.2.1");
        cache.set(addr, info(addr));

        let mut updated = info(addr);
        updated.country = Some("Elbonia".into());
        cache.set(addr, updated);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(cache.inner.read().order.len(), 1);
        assert_eq!(cache.get(addr).unwrap().country.as_deref(), Some("Elbonia"));
    }

    #[test]
    fn test_duplicate_key_at_capacity_does_not_evict() {
        let cache = ResultCache::new(2);
        fill(&cache, 2);
        cache.set(nth(0), info(nth(0)));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 0);
        assert!(cache.get(nth(1)).is_some());
    }

    #[test]
    fn test_reinsert_moves_to_newest() {
        let cache = ResultCache::new(2);
        fill(&cache, 2);
        // Refresh the oldest, so the other one becomes oldest.
        cache.set(nth(0), info(nth(0)));
        cache.set(nth(2), info(nth(2)));

        assert!(cache.get(nth(0)).is_some());
        assert!(cache.get(nth(1)).is_none());
        assert!(cache.get(nth(2)).is_some());
        assert_consistent(&cache);
    }

    #[test]
    fn test_fifo_not_lru() {
        let (a, b, c, d) = (ip("192.0.2.1"), ip("192.0.2.2"), ip("192.0.2.3"), ip("192.0.2.4"));
        let cache = ResultCache::new(2);
        cache.set(a, info(a));
        cache.set(b, info(b));
        cache.set(c, info(c));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 1);
        assert!(cache.get(a).is_none());
        assert!(cache.get(c).is_some());

        // Reading B must not protect it: it is still the oldest insert.
        assert!(cache.get(b).is_some());
        cache.set(d, info(d));

        assert!(cache.get(b).is_none());
        assert!(cache.get(c).is_some());
        assert!(cache.get(d).is_some());
    }

    #[test]
    fn test_zero_capacity_is_noop() {
        let cache = ResultCache::new(0);
        fill(&cache, 10);
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.get(nth(3)).is_none());
        assert!(!cache.stats().is_enabled());
    }

    #[test]
    fn test_resize_resets_evictions_and_shrinks() {
        let cache = ResultCache::new(10);
        for i in 1..=20 {
            cache.set(nth(i), info(nth(i)));
        }
        assert_eq!(cache.stats().size, 10);
        assert_eq!(cache.stats().evictions, 10);

        cache.resize(5).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.size, 5);
        assert_eq!(stats.evictions, 0);
        // The newest five survive the shrink.
        assert!(cache.get(nth(15)).is_none());
        for i in 16..=20 {
            assert!(cache.get(nth(i)).is_some());
        }
        assert_consistent(&cache);

        let extra = ip("192.0.2.42");
        cache.set(extra, info(extra));
        assert_eq!(cache.stats().size, 5);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_resize_grow_keeps_entries() {
        let cache = ResultCache::new(2);
        fill(&cache, 3);
        cache.resize(4).unwrap();
        fill(&cache, 4);

        let stats = cache.stats();
        assert_eq!(stats.size, 4);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_resize_to_zero_clears() {
        let cache = ResultCache::new(3);
        fill(&cache, 3);
        cache.resize(0).unwrap();
        assert!(cache.is_empty());
        cache.set(nth(1), info(nth(1)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resize_rejects_negative() {
        let cache = ResultCache::new(3);
        fill(&cache, 4);
        let before = cache.stats();

        let err = cache.resize(-1).unwrap_err();
        assert!(matches!(err, EchoipError::InvalidArgument(_)));
        assert_eq!(cache.stats(), before);
        assert!(cache.get(nth(3)).is_some());
    }

    #[test]
    fn test_ipv4_mapped_hits_same_entry() {
        let cache = ResultCache::new(4);
        let plain = ip("203.0.113.7");
        cache.set(plain, info(plain));
        assert!(cache.get(ip("::ffff:203.0.113.7")).is_some());
    }

    #[test]
    fn test_stats_serialization() {
        let cache = ResultCache::new(2);
        fill(&cache, 3);
        let json = serde_json::to_value(cache.stats()).unwrap();
        assert_eq!(json["capacity"], 2);
        assert_eq!(json["size"], 2);
        assert_eq!(json["evictions"], 1);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(ResultCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let addr = nth((t * 31 + i) % 250);
                        cache.set(addr, info(addr));
                        if let Some(found) = cache.get(addr) {
                            assert_eq!(found.ip, addr);
                        }
                        assert!(cache.len() <= 16);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
        assert_consistent(&cache);
    }
}
