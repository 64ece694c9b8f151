//! Two-tier facade: local tier in front, replicated tier behind.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use chemistflow_common::error::CacheError;

use crate::cluster::{CacheKind, ReplicatedCache};
use crate::local::{LocalCache, LocalCacheConfig};

/// One cached object kind seen through both tiers.
///
/// Reads go local → replicated and backfill the local tier on a
/// replicated hit. Writes go replicated → local; a replicated failure is
/// logged but the local write still happens, so callers on this node
/// read their own writes. Typed values cross into the replicated tier as
/// opaque JSON.
pub struct TwoTierCache<V: Clone> {
    kind: CacheKind,
    local: LocalCache<i64, V>,
    replicated: Arc<ReplicatedCache>,
}

impl<V> TwoTierCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    pub fn new(
        kind: CacheKind,
        local_config: LocalCacheConfig,
        replicated: Arc<ReplicatedCache>,
    ) -> Self {
        Self {
            kind,
            local: LocalCache::new(local_config),
            replicated,
        }
    }

    /// Local tier, then replicated tier with local backfill.
    pub async fn get(&self, id: i64) -> Option<V> {
        if let Some(value) = self.local.get(&id) {
            return Some(value);
        }
        let raw = self.replicated.get(self.kind, id).await?;
        match serde_json::from_value::<V>(raw) {
            Ok(value) => {
                self.local.put(id, value.clone());
                Some(value)
            }
            Err(e) => {
                // a replica holding an undecodable value is treated as a miss
                warn!(kind = ?self.kind, id, error = %e, "replicated entry failed to decode");
                None
            }
        }
    }

    /// Local tier only; no replicated round-trip.
    pub fn local_get(&self, id: i64) -> Option<V> {
        self.local.get(&id)
    }

    /// Replicated put, then local put.
    pub async fn put(&self, id: i64, value: V) {
        match serde_json::to_value(&value) {
            Ok(raw) => self.replicated.put(self.kind, id, raw).await,
            Err(e) => {
                warn!(kind = ?self.kind, id, error = %e, "value not representable as JSON, replicated tier skipped");
            }
        }
        self.local.put(id, value);
    }

    /// Fails when either tier already observes the id.
    ///
    /// Not globally atomic across the cluster: two nodes can win their
    /// local race and last-write-wins settles the replicated value. The
    /// authoritative create already happened upstream, so this only
    /// affects cache contents.
    pub async fn create(&self, id: i64, value: V) -> Result<(), CacheError> {
        if self.get(id).await.is_some() {
            return Err(CacheError::AlreadyExists(id));
        }
        self.put(id, value).await;
        Ok(())
    }

    /// Targeted local invalidation; the replicated tier keeps its entry.
    pub fn invalidate_local(&self, id: i64) {
        self.local.remove(&id);
    }

    /// Sweeps the local tier; the replicated tier has no expiry.
    pub fn clean_expired(&self) {
        self.local.clean_expired();
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }
}
