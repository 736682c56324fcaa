//! Bounded least-recently-used caches.
//!
//! [`LruCache`] is the single-threaded core: an index map into a slab of
//! nodes linked in recency order, O(1) for `get`, `put` and eviction.
//! [`SynchronizedCache`] wraps it behind a mutex so that pipeline workers can
//! share one instance without any locking of their own.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Sentinel for null links in the slab list.
const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Counters kept by every cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Key/value cache contract shared by the caches in this module.
pub trait Cache<K, V>: Send + Sync {
    /// Look up a key, promoting it to most-recently-used on hit.
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or replace an entry, evicting the least-recently-used one when full.
    fn put(&self, key: K, value: V);

    fn size(&self) -> usize;

    fn stats(&self) -> CacheStats;
}

/// Slab-based LRU cache. Not thread-safe; see [`SynchronizedCache`].
pub struct LruCache<K, V> {
    index: HashMap<K, usize>,
    slab: Vec<Node<K, V>>,
    free: Vec<usize>,
    /// Most recently used.
    head: usize,
    /// Least recently used.
    tail: usize,
    capacity: usize,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            index: HashMap::with_capacity(capacity),
            slab: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&slot) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        self.stats.hits += 1;
        self.detach(slot);
        self.push_front(slot);
        Some(&self.slab[slot].value)
    }

    /// Returns the evicted entry, if the insert pushed one out.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            self.slab[slot].value = value;
            self.detach(slot);
            self.push_front(slot);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(free) => {
                self.slab[free] = node;
                free
            }
            None => {
                self.slab.push(node);
                self.slab.len() - 1
            }
        };

        self.index.insert(key, slot);
        self.push_front(slot);
        evicted
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while cursor != NIL {
            keys.push(self.slab[cursor].key.clone());
            cursor = self.slab[cursor].next;
        }
        keys
    }

    fn evict_tail(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let slot = self.tail;
        self.detach(slot);
        let node = &self.slab[slot];
        self.index.remove(&node.key);
        self.free.push(slot);
        self.stats.evictions += 1;
        Some((node.key.clone(), node.value.clone()))
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.slab[slot].prev, self.slab[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.slab[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slab[next].prev = prev;
        }
        self.slab[slot].prev = NIL;
        self.slab[slot].next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        self.slab[slot].next = self.head;
        if self.head != NIL {
            self.slab[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }
}

/// Thread-safe wrapper around [`LruCache`].
///
/// The lock is held only for the duration of a single `get` or `put`, never
/// across the caller's work between them.
pub struct SynchronizedCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> SynchronizedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Cache<K, V> for SynchronizedCache<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        self.lock().put(key, value);
    }

    fn size(&self) -> usize {
        self.lock().len()
    }

    fn stats(&self) -> CacheStats {
        self.lock().stats()
    }
}
