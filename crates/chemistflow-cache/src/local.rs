//! Per-node TTL'd cache tier.
//!
//! A thread-safe mapping `K -> (V, Instant)` with a recency-based size
//! bound. Four independent instances exist at runtime, one per cached
//! object kind. Expiry is lazy: `get` refuses entries older than the TTL
//! but leaves them in place until [`LocalCache::clean_expired`] sweeps
//! them or the LRU bound pushes them out.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

/// Local-tier settings.
#[derive(Debug, Clone)]
pub struct LocalCacheConfig {
    /// Entry lifetime.
    pub ttl: Duration,
    /// Size bound; the least recently used entry is evicted beyond it.
    pub max_entries: usize,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 1000,
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe TTL'd map with an LRU bound.
pub struct LocalCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl: Duration,
}

impl<K: Hash + Eq + Clone, V: Clone> LocalCache<K, V> {
    pub fn new(config: LocalCacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            ttl: config.ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<K, Entry<V>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value iff an entry exists and is younger than
    /// the TTL. Expired entries are reported as absent but not removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut map = self.lock();
        let entry = map.get(key)?;
        if entry.inserted_at.elapsed() <= self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Unconditionally inserts with a fresh timestamp, evicting the least
    /// recently used entry when the bound is exceeded.
    pub fn put(&self, key: K, value: V) {
        let mut map = self.lock();
        map.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Inserts only when no entry exists for the key. An expired entry
    /// still counts as present for this check.
    ///
    /// Returns `true` when the value was inserted.
    pub fn create_if_absent(&self, key: K, value: V) -> bool {
        let mut map = self.lock();
        if map.contains(&key) {
            return false;
        }
        map.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Targeted invalidation of one key.
    pub fn remove(&self, key: &K) {
        let mut map = self.lock();
        map.pop(key);
    }

    /// Drops every entry older than the TTL.
    ///
    /// LRU order is recency, not age, so this is a full scan rather than
    /// a pop-from-the-tail loop.
    pub fn clean_expired(&self) {
        let mut map = self.lock();
        let ttl = self.ttl;
        let stale: Vec<_> = map
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() > ttl)
            .map(|(key, _)| key)
            .cloned()
            .collect();
        for key in stale {
            map.pop(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
