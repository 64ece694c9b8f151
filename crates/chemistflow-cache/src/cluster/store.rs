//! Versioned in-memory replica with last-write-wins merge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// The four replicated object kinds, one logical map each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKind {
    Reaction,
    ReactionDetails,
    Mechanism,
    MechanismDetails,
}

/// Write version: a per-node Lamport counter plus the writing node's
/// identity.
///
/// The derived ordering (counter first, node id as tiebreak) *is* the
/// conflict rule: the greater version wins everywhere, so every replica
/// converges to the same value for a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub counter: u64,
    pub node: String,
}

/// One replicated entry: the opaque JSON value and the version that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedEntry {
    pub value: serde_json::Value,
    pub version: Version,
}

/// The local replica of the cluster maps.
///
/// Thread-safe; writes stamp a fresh version from the node's Lamport
/// clock, and every observed remote version advances that clock so local
/// writes always order after everything this node has seen.
pub struct ReplicaStore {
    node: String,
    clock: AtomicU64,
    maps: RwLock<HashMap<CacheKind, HashMap<i64, VersionedEntry>>>,
}

impl ReplicaStore {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            clock: AtomicU64::new(0),
            maps: RwLock::new(HashMap::new()),
        }
    }

    /// This node's identity as stamped into versions.
    pub fn node(&self) -> &str {
        &self.node
    }

    fn next_version(&self) -> Version {
        Version {
            counter: self.clock.fetch_add(1, Ordering::SeqCst) + 1,
            node: self.node.clone(),
        }
    }

    /// Advances the Lamport clock past an observed remote version.
    fn observe(&self, version: &Version) {
        self.clock.fetch_max(version.counter, Ordering::SeqCst);
    }

    /// Stamps and applies a local write, returning the entry to replicate.
    pub fn local_put(&self, kind: CacheKind, key: i64, value: serde_json::Value) -> VersionedEntry {
        let entry = VersionedEntry {
            value,
            version: self.next_version(),
        };
        let mut maps = self
            .maps
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        maps.entry(kind).or_default().insert(key, entry.clone());
        entry
    }

    /// Merges a (possibly remote) entry into the replica.
    ///
    /// Returns `true` when the entry won and was applied; `false` when the
    /// replica already holds a greater or equal version.
    pub fn apply(&self, kind: CacheKind, key: i64, entry: VersionedEntry) -> bool {
        self.observe(&entry.version);
        let mut maps = self
            .maps
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let map = maps.entry(kind).or_default();
        match map.get(&key) {
            Some(existing) if existing.version >= entry.version => false,
            _ => {
                map.insert(key, entry);
                true
            }
        }
    }

    pub fn get(&self, kind: CacheKind, key: i64) -> Option<VersionedEntry> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&kind)?.get(&key).cloned()
    }

    /// Number of entries held for one kind.
    pub fn len(&self, kind: CacheKind) -> usize {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(&kind).map(|m| m.len()).unwrap_or(0)
    }
}
