//! Cache-first proxy over the Preprocessor's reaction resource.

use std::sync::Arc;

use tracing::{debug, info};

use chemistflow_cache::TwoTierCache;
use chemistflow_client::PreprocessorClient;
use chemistflow_common::domain::{Reaction, ReactionDetails, ReactionId};
use chemistflow_common::error::ResourceError;

/// Proxies reaction reads and writes, keeping both cache maps warm: the
/// details map for read-through, the summary map for freshly created
/// reactions.
pub struct ReactionService {
    client: Arc<PreprocessorClient>,
    details: TwoTierCache<ReactionDetails>,
    summaries: TwoTierCache<Reaction>,
}

impl ReactionService {
    pub fn new(
        client: Arc<PreprocessorClient>,
        details: TwoTierCache<ReactionDetails>,
        summaries: TwoTierCache<Reaction>,
    ) -> Self {
        Self {
            client,
            details,
            summaries,
        }
    }

    /// Cache-first read of a reaction's details.
    ///
    /// A reaction created through this node and still warm in the local
    /// summary tier is served without an upstream round-trip: it has no
    /// reagents, products or conditions linked yet, so its details are
    /// the bare summary. Only the local tier is consulted for that
    /// short-circuit, which keeps delete's local invalidation effective.
    pub async fn get(&self, id: ReactionId) -> Result<ReactionDetails, ResourceError> {
        if let Some(details) = self.details.get(id).await {
            debug!(id, "reaction details served from cache");
            return Ok(details);
        }
        if let Some(summary) = self.summaries.local_get(id) {
            debug!(id, "reaction served from freshly created summary");
            return Ok(ReactionDetails::bare(summary));
        }

        let fetched = self.client.fetch_reaction(id).await?;
        self.details.put(id, fetched.clone()).await;
        Ok(fetched)
    }

    /// Passthrough create with write-through of the created object.
    pub async fn create(&self, reaction: Reaction) -> Result<Reaction, ResourceError> {
        let created = self.client.create_reaction(&reaction).await?;
        info!(id = created.reaction_id, "reaction created upstream");
        self.summaries.put(created.reaction_id, created.clone()).await;
        Ok(created)
    }

    /// Passthrough delete; on success the local tier forgets the id so
    /// the next read round-trips to the Preprocessor.
    pub async fn delete(&self, id: ReactionId) -> Result<bool, ResourceError> {
        self.client.delete_reaction(id).await?;
        info!(id, "reaction deleted upstream, invalidating local tier");
        self.details.invalidate_local(id);
        self.summaries.invalidate_local(id);
        Ok(true)
    }

    /// Sweeps expired local entries for both maps.
    pub fn clean_expired(&self) {
        self.details.clean_expired();
        self.summaries.clean_expired();
    }
}
