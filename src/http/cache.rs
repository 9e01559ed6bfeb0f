//! Byte-range LRU cache module
//!
//! Bounded key→buffer store for recently served file ranges, keyed by
//! `path:start-end`. Enforces both a maximum entry count and a maximum
//! total byte budget, evicting from the least-recently-used end. Recency
//! is tracked with a `HashMap` into an arena-backed doubly linked list,
//! so `get` promotion and eviction are both O(1) without unsafe code.

use hyper::body::Bytes;
use std::collections::HashMap;
use std::path::Path;

/// Maximum number of cached ranges.
pub const MAX_ENTRIES: usize = 200;

/// Maximum total bytes held by the cache.
pub const MAX_BYTES: usize = 32 * 1024 * 1024;

/// Ranges longer than this are never offered to the cache; they are always
/// served by a direct positional read.
pub const MAX_CACHEABLE_RANGE: u64 = 2 * 1024 * 1024;

/// Sentinel for null links in the recency list.
const NIL: usize = usize::MAX;

/// A node in the arena-backed recency list.
struct Node {
    key: String,
    data: Option<Bytes>,
    prev: usize,
    next: usize,
}

/// Cache hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
}

/// Build the cache key for a file range.
#[must_use]
pub fn cache_key(path: &Path, start: u64, end: u64) -> String {
    format!("{}:{start}-{end}", path.display())
}

/// Count- and byte-bounded LRU cache of file ranges.
///
/// The key map, the recency list, and the running byte total form one unit;
/// callers that share a cache across tasks must wrap it in a mutex so that
/// `get` promotion and the `put` eviction loop stay atomic.
pub struct RangeCache {
    max_entries: usize,
    max_bytes: usize,
    map: HashMap<String, usize>,
    arena: Vec<Node>,
    /// Most-recently-used node
    head: usize,
    /// Least-recently-used node
    tail: usize,
    /// Free-list head for recycling evicted slots
    free_head: usize,
    total_bytes: usize,
    stats: CacheStats,
}

impl RangeCache {
    /// Create a cache with explicit limits.
    ///
    /// # Panics
    /// Panics if `max_entries` is 0.
    #[must_use]
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        assert!(max_entries > 0, "RangeCache max_entries must be > 0");
        Self {
            max_entries,
            max_bytes,
            map: HashMap::new(),
            arena: Vec::new(),
            head: NIL,
            tail: NIL,
            free_head: NIL,
            total_bytes: 0,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache with the default limits (200 entries, 32 MiB).
    #[must_use]
    pub fn with_default_limits() -> Self {
        Self::new(MAX_ENTRIES, MAX_BYTES)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total bytes currently held across all entries.
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Look up a range buffer. A hit promotes the key to the
    /// most-recently-used position; this is the only mutation the read
    /// path performs.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        let Some(&idx) = self.map.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        self.detach(idx);
        self.attach_front(idx);
        self.stats.hits += 1;
        self.arena[idx].data.clone()
    }

    /// Insert a range buffer, evicting from the least-recently-used end
    /// until both limits hold.
    ///
    /// When the eviction loop has emptied the cache and the incoming entry
    /// alone exceeds the byte budget, it is admitted anyway; the budget is
    /// transiently exceeded until a later insertion evicts it.
    pub fn put(&mut self, key: String, data: Bytes) {
        // Replacing an existing key: drop the old entry first so the loop
        // below sees accurate counts.
        if let Some(&idx) = self.map.get(&key) {
            self.detach(idx);
            self.remove_slot(idx);
        }

        let incoming = data.len();
        while self.map.len() >= self.max_entries
            || (self.total_bytes + incoming > self.max_bytes && !self.map.is_empty())
        {
            self.evict_lru();
        }

        let idx = self.alloc_node(key.clone(), data);
        self.attach_front(idx);
        self.map.insert(key, idx);
        self.total_bytes += incoming;
        self.stats.insertions += 1;
    }

    /// Remove the least-recently-used entry.
    fn evict_lru(&mut self) {
        let idx = self.tail;
        if idx == NIL {
            return;
        }
        self.detach(idx);
        self.remove_slot(idx);
        self.stats.evictions += 1;
    }

    /// Release a detached node: drop its buffer, unmap its key, and push
    /// the slot onto the free list.
    fn remove_slot(&mut self, idx: usize) {
        if let Some(data) = self.arena[idx].data.take() {
            self.total_bytes -= data.len();
        }
        let key = std::mem::take(&mut self.arena[idx].key);
        self.map.remove(&key);
        self.arena[idx].next = self.free_head;
        self.free_head = idx;
    }

    /// Unlink a node from the recency list.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.arena[idx].prev, self.arena[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.arena[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.arena[next].prev = prev;
        }
        self.arena[idx].prev = NIL;
        self.arena[idx].next = NIL;
    }

    /// Link a node at the most-recently-used end.
    fn attach_front(&mut self, idx: usize) {
        self.arena[idx].prev = NIL;
        self.arena[idx].next = self.head;
        if self.head != NIL {
            self.arena[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    /// Take a slot from the free list or grow the arena.
    fn alloc_node(&mut self, key: String, data: Bytes) -> usize {
        let node = Node {
            key,
            data: Some(data),
            prev: NIL,
            next: NIL,
        };
        if self.free_head == NIL {
            self.arena.push(node);
            self.arena.len() - 1
        } else {
            let idx = self.free_head;
            self.free_head = self.arena[idx].next;
            self.arena[idx] = node;
            idx
        }
    }

    /// Walk the recency list and cross-check every structural invariant:
    /// list and map agree, the byte total matches the sum of entry sizes.
    #[cfg(test)]
    fn check_invariants(&self) {
        let mut seen = 0;
        let mut bytes = 0;
        let mut idx = self.head;
        let mut prev = NIL;
        while idx != NIL {
            let node = &self.arena[idx];
            assert_eq!(node.prev, prev, "broken back-link at {idx}");
            assert_eq!(
                self.map.get(&node.key),
                Some(&idx),
                "key {:?} not mapped to its node",
                node.key
            );
            bytes += node.data.as_ref().map_or(0, Bytes::len);
            seen += 1;
            prev = idx;
            idx = node.next;
        }
        assert_eq!(self.tail, prev, "tail does not match last list node");
        assert_eq!(seen, self.map.len(), "recency list and key map disagree");
        assert_eq!(bytes, self.total_bytes, "byte total out of sync");
    }
}
