// SPDX-License-Identifier: AGPL-3.0-or-later
//! [`ResponseCache`]: a bounded, size-accounted LRU keyed by a
//! content-addressed fingerprint of the request. Shared process-wide
//! behind a lock; `Get`/`Set` are atomic with respect to each other.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// 128-bit content-addressed hash of a canonicalised request, excluding
/// credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u128);

impl Fingerprint {
    pub fn of(canonical_bytes: &[u8]) -> Self {
        let hash = blake3::hash(canonical_bytes);
        let bytes = hash.as_bytes();
        Self(u128::from_le_bytes(bytes[..16].try_into().unwrap()))
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub metadata_json: Vec<u8>,
    pub data_parts: Vec<Vec<u8>>,
}

impl CacheEntry {
    pub fn size_bytes(&self) -> u64 {
        (self.metadata_json.len() + self.data_parts.iter().map(Vec::len).sum::<usize>()) as u64
    }
}

struct Node {
    entry: CacheEntry,
    size: u64,
    prev: Option<Fingerprint>,
    next: Option<Fingerprint>,
}

/// Intrusive doubly-linked LRU list over an [`FxHashMap`], most-recently-used
/// at the head. Hand-rolled rather than pulled from a crate because the
/// eviction policy needs to reason about cumulative byte size, not entry
/// count.
struct Lru {
    nodes: FxHashMap<Fingerprint, Node>,
    head: Option<Fingerprint>,
    tail: Option<Fingerprint>,
    total_bytes: u64,
    capacity_bytes: u64,
}

impl Lru {
    fn new(capacity_bytes: u64) -> Self {
        Self {
            nodes: FxHashMap::default(),
            head: None,
            tail: None,
            total_bytes: 0,
            capacity_bytes,
        }
    }

    fn detach(&mut self, key: Fingerprint) {
        let (prev, next) = {
            let node = &self.nodes[&key];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes.get_mut(&p).unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes.get_mut(&n).unwrap().prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, key: Fingerprint) {
        let old_head = self.head;
        if let Some(node) = self.nodes.get_mut(&key) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.nodes.get_mut(&h).unwrap().prev = Some(key);
        }
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }

    fn touch(&mut self, key: Fingerprint) {
        if self.head == Some(key) {
            return;
        }
        self.detach(key);
        self.push_front(key);
    }

    fn get(&mut self, key: &Fingerprint) -> Option<&CacheEntry> {
        if self.nodes.contains_key(key) {
            self.touch(*key);
            self.nodes.get(key).map(|n| &n.entry)
        } else {
            None
        }
    }

    /// Returns the number of evictions performed to admit `entry`.
    fn set(&mut self, key: Fingerprint, entry: CacheEntry) -> usize {
        let size = entry.size_bytes();
        if size > self.capacity_bytes {
            // Too large to ever fit; skip admission entirely.
            return 0;
        }
        if let Some(existing) = self.nodes.get(&key) {
            self.total_bytes -= existing.size;
            self.detach(key);
        }
        let mut evictions = 0;
        while self.total_bytes + size > self.capacity_bytes {
            if let Some(lru_key) = self.tail {
                self.detach(lru_key);
                if let Some(removed) = self.nodes.remove(&lru_key) {
                    self.total_bytes -= removed.size;
                }
                evictions += 1;
            } else {
                break;
            }
        }
        let _ = self.nodes.insert(
            key,
            Node {
                entry,
                size,
                prev: None,
                next: None,
            },
        );
        self.total_bytes += size;
        self.push_front(key);
        evictions
    }
}

/// Bounded LRU keyed by request fingerprint, holding (metadata-json,
/// data-parts) pairs. Shared via `Arc` across reader threads.
pub struct ResponseCache {
    inner: Mutex<Lru>,
}

impl ResponseCache {
    pub fn new(capacity_bytes: u64) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Lru::new(capacity_bytes)),
        })
    }

    /// Only to be called once the caller has established that `key`'s
    /// connection is authorised to read this cube — the cache never makes
    /// that decision itself, it only enforces that the bit is supplied.
    pub fn get_authorised(&self, key: &Fingerprint, authorised: bool) -> Option<CacheEntry> {
        if !authorised {
            return None;
        }
        self.inner.lock().get(key).cloned()
    }

    /// Returns `true` if admitting `entry` required evicting more than one
    /// existing entry. Logs a `log::warn!` in that case — a single entry
    /// whose own admission displaces several others usually means the
    /// cache capacity is undersized for the working set.
    pub fn set(&self, key: Fingerprint, entry: CacheEntry) -> bool {
        let evictions = self.inner.lock().set(key, entry);
        let storm = evictions > 1;
        if storm {
            log::warn!("cache eviction storm: admitting one entry evicted {evictions} others");
        }
        storm
    }

    pub fn len(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(bytes: usize) -> CacheEntry {
        CacheEntry {
            metadata_json: vec![0u8; bytes],
            data_parts: vec![],
        }
    }

    #[test]
    fn evicts_lru_when_over_capacity() {
        let cache = ResponseCache::new(10);
        let a = Fingerprint(1);
        let b = Fingerprint(2);
        let c = Fingerprint(3);
        assert!(!cache.set(a, entry(5)));
        assert!(!cache.set(b, entry(5)));
        // admitting c (5 bytes) must evict a (oldest) to fit under cap 10.
        assert!(!cache.set(c, entry(5)));
        assert!(cache.get_authorised(&a, true).is_none());
        assert!(cache.get_authorised(&b, true).is_some());
        assert!(cache.get_authorised(&c, true).is_some());
    }

    #[test]
    fn unauthorised_get_returns_none_even_on_hit() {
        let cache = ResponseCache::new(10);
        let key = Fingerprint(1);
        let _ = cache.set(key, entry(5));
        assert!(cache.get_authorised(&key, false).is_none());
        assert!(cache.get_authorised(&key, true).is_some());
    }

    #[test]
    fn get_bumps_recency() {
        let cache = ResponseCache::new(10);
        let a = Fingerprint(1);
        let b = Fingerprint(2);
        let c = Fingerprint(3);
        let _ = cache.set(a, entry(5));
        let _ = cache.set(b, entry(5));
        // touch a so b becomes the LRU victim instead.
        assert!(cache.get_authorised(&a, true).is_some());
        let _ = cache.set(c, entry(5));
        assert!(cache.get_authorised(&a, true).is_some());
        assert!(cache.get_authorised(&b, true).is_none());
    }
}
