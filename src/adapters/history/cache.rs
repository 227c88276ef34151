//! Sale History Cache
//!
//! Bounded LRU cache with a fixed TTL for per-item sale history.
//! - Entries older than the TTL are never returned
//! - Inserting a new key at capacity evicts the least recently used entry
//! - Internally synchronized; share it behind an `Arc`
//!
//! Recency is kept in a doubly linked list threaded through a slab of
//! nodes, so every operation is O(1) apart from the record clone on a hit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::{ItemKey, SaleRecord};

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: ItemKey,
    records: Vec<SaleRecord>,
    inserted_at: Instant,
    /// Towards the most recently used end
    prev: usize,
    /// Towards the least recently used end
    next: usize,
}

#[derive(Debug, Default)]
struct LruState {
    index: HashMap<ItemKey, usize>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    stats: CacheStats,
}

impl LruState {
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        if prev == NIL {
            self.head = (next != NIL).then_some(next);
        } else {
            self.nodes[prev].next = next;
        }

        if next == NIL {
            self.tail = (prev != NIL).then_some(prev);
        } else {
            self.nodes[next].prev = prev;
        }

        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head.unwrap_or(NIL);

        if let Some(old_head) = self.head {
            self.nodes[old_head].prev = idx;
        }
        self.head = Some(idx);

        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn allocate(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn remove_at(&mut self, idx: usize) -> Vec<SaleRecord> {
        self.unlink(idx);
        self.index.remove(&self.nodes[idx].key);
        self.free.push(idx);
        std::mem::take(&mut self.nodes[idx].records)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }
}

/// TTL + LRU cache mapping an item to its sale history
#[derive(Debug)]
pub struct HistoryCache {
    ttl: Duration,
    capacity: usize,
    state: Mutex<LruState>,
}

impl HistoryCache {
    /// Default TTL for cached history (10 minutes)
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
    /// Default max cache entries
    pub const DEFAULT_MAX_ENTRIES: usize = 4096;

    /// Create a new cache with default settings
    pub fn with_defaults() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            state: Mutex::new(LruState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a copy of the cached history if it is younger than the TTL.
    ///
    /// A hit becomes the most recently used entry. An expired entry is
    /// dropped on the spot.
    pub fn get(&self, key: &ItemKey) -> Option<Vec<SaleRecord>> {
        let mut state = self.lock();

        let Some(&idx) = state.index.get(key) else {
            state.stats.misses += 1;
            return None;
        };

        if state.nodes[idx].inserted_at.elapsed() >= self.ttl {
            state.remove_at(idx);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            return None;
        }

        state.touch(idx);
        state.stats.hits += 1;
        Some(state.nodes[idx].records.clone())
    }

    /// Insert or overwrite the history for `key`.
    ///
    /// Overwriting resets the entry's age and makes it most recently used.
    pub fn put(&self, key: ItemKey, records: Vec<SaleRecord>) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.lock();

        if let Some(&idx) = state.index.get(&key) {
            state.nodes[idx].records = records;
            state.nodes[idx].inserted_at = Instant::now();
            state.touch(idx);
            return;
        }

        if state.index.len() >= self.capacity {
            if let Some(lru) = state.tail {
                state.remove_at(lru);
                state.stats.evictions += 1;
            }
        }

        let idx = state.allocate(Node {
            key: key.clone(),
            records,
            inserted_at: Instant::now(),
            prev: NIL,
            next: NIL,
        });
        state.index.insert(key, idx);
        state.push_front(idx);
    }

    /// Check if a valid entry exists (does not affect recency)
    pub fn contains(&self, key: &ItemKey) -> bool {
        let state = self.lock();
        state
            .index
            .get(key)
            .is_some_and(|&idx| state.nodes[idx].inserted_at.elapsed() < self.ttl)
    }

    /// Remove an entry from the cache
    pub fn remove(&self, key: &ItemKey) -> Option<Vec<SaleRecord>> {
        let mut state = self.lock();
        let idx = *state.index.get(key)?;
        Some(state.remove_at(idx))
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut state = self.lock();
        let expired: Vec<usize> = state
            .index
            .values()
            .copied()
            .filter(|&idx| state.nodes[idx].inserted_at.elapsed() >= self.ttl)
            .collect();

        for &idx in &expired {
            state.remove_at(idx);
        }
        state.stats.expirations += expired.len() as u64;
        expired.len()
    }

    /// Get the number of entries (including expired ones not yet dropped)
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.lock().index.is_empty()
    }

    /// Keys ordered from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<ItemKey> {
        let state = self.lock();
        let mut keys = Vec::with_capacity(state.index.len());
        let mut cursor = state.head;
        while let Some(idx) = cursor {
            keys.push(state.nodes[idx].key.clone());
            cursor = (state.nodes[idx].next != NIL).then_some(state.nodes[idx].next);
        }
        keys
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.index.len(),
            ..state.stats.clone()
        }
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}
