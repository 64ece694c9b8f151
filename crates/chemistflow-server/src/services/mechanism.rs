//! Cache-first proxy over the Preprocessor's mechanism resource.

use std::sync::Arc;

use tracing::{debug, info};

use chemistflow_cache::TwoTierCache;
use chemistflow_client::PreprocessorClient;
use chemistflow_common::domain::{Mechanism, MechanismDetails, MechanismId};
use chemistflow_common::error::ResourceError;

/// Same proxy shape as the reaction service. Mechanism details cannot be
/// synthesized from a bare summary (the context narrative only exists
/// upstream), so get never consults the summary map.
pub struct MechanismService {
    client: Arc<PreprocessorClient>,
    details: TwoTierCache<MechanismDetails>,
    summaries: TwoTierCache<Mechanism>,
}

impl MechanismService {
    pub fn new(
        client: Arc<PreprocessorClient>,
        details: TwoTierCache<MechanismDetails>,
        summaries: TwoTierCache<Mechanism>,
    ) -> Self {
        Self {
            client,
            details,
            summaries,
        }
    }

    pub async fn get(&self, id: MechanismId) -> Result<MechanismDetails, ResourceError> {
        if let Some(details) = self.details.get(id).await {
            debug!(id, "mechanism details served from cache");
            return Ok(details);
        }
        let fetched = self.client.fetch_mechanism(id).await?;
        self.details.put(id, fetched.clone()).await;
        Ok(fetched)
    }

    pub async fn create(&self, mechanism: Mechanism) -> Result<Mechanism, ResourceError> {
        let created = self.client.create_mechanism(&mechanism).await?;
        info!(id = created.mechanism_id, "mechanism created upstream");
        self.summaries
            .put(created.mechanism_id, created.clone())
            .await;
        Ok(created)
    }

    pub async fn delete(&self, id: MechanismId) -> Result<bool, ResourceError> {
        self.client.delete_mechanism(id).await?;
        info!(id, "mechanism deleted upstream, invalidating local tier");
        self.details.invalidate_local(id);
        self.summaries.invalidate_local(id);
        Ok(true)
    }

    pub fn clean_expired(&self) {
        self.details.clean_expired();
        self.summaries.clean_expired();
    }
}
