//! Client for the Preprocessor, the authoritative store of reactions
//! and mechanisms.
//!
//! Routes follow `{base_uri}/{reaction|mechanism}[/{id}]` with JSON
//! bodies mirroring the domain types. Status mapping:
//!
//! - GET: 2xx decodes to the details type, 404 is `NotFound`, any other
//!   status is `HttpError`, an undecodable body is `DecodingError`, a
//!   transport failure is `NetworkError`.
//! - POST: 2xx decodes to the created object, anything else is
//!   `CreationError`.
//! - DELETE: 204 succeeds, anything else is `DeletionError`.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use chemistflow_common::config::ClientConfig;
use chemistflow_common::domain::{
    Mechanism, MechanismDetails, MechanismId, Reaction, ReactionDetails, ReactionId,
};
use chemistflow_common::error::ResourceError;

use crate::retry::RetryPolicy;

pub struct PreprocessorClient {
    http: reqwest::Client,
    base_uri: String,
    retry: RetryPolicy,
}

impl PreprocessorClient {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            retry: RetryPolicy::with_retries(config.retries),
        }
    }

    pub async fn fetch_reaction(&self, id: ReactionId) -> Result<ReactionDetails, ResourceError> {
        self.fetch("reaction", id).await
    }

    pub async fn fetch_mechanism(
        &self,
        id: MechanismId,
    ) -> Result<MechanismDetails, ResourceError> {
        self.fetch("mechanism", id).await
    }

    pub async fn create_reaction(&self, reaction: &Reaction) -> Result<Reaction, ResourceError> {
        self.create("reaction", reaction).await
    }

    pub async fn create_mechanism(
        &self,
        mechanism: &Mechanism,
    ) -> Result<Mechanism, ResourceError> {
        self.create("mechanism", mechanism).await
    }

    pub async fn delete_reaction(&self, id: ReactionId) -> Result<(), ResourceError> {
        self.delete("reaction", id).await
    }

    pub async fn delete_mechanism(&self, id: MechanismId) -> Result<(), ResourceError> {
        self.delete("mechanism", id).await
    }

    /// Idempotent GET with retries.
    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: i64,
    ) -> Result<T, ResourceError> {
        let url = format!("{}/{}/{}", self.base_uri, resource, id);
        self.retry
            .run(resource, || self.fetch_once(&url, id))
            .await
    }

    async fn fetch_once<T: DeserializeOwned>(
        &self,
        url: &str,
        id: i64,
    ) -> Result<T, ResourceError> {
        debug!(%url, "preprocessor GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResourceError::NotFound(id));
        }
        if !status.is_success() {
            return Err(ResourceError::Http {
                status: status.as_u16(),
                reason: read_reason(response).await,
            });
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body).map_err(|e| ResourceError::Decoding(e.to_string()))
    }

    /// POST; never retried.
    async fn create<T>(&self, resource: &str, body: &T) -> Result<T, ResourceError>
    where
        T: Serialize + DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_uri, resource);
        debug!(%url, "preprocessor POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResourceError::Creation {
                status: status.as_u16(),
                reason: read_reason(response).await,
            });
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body).map_err(|e| ResourceError::Decoding(e.to_string()))
    }

    /// DELETE; never retried.
    async fn delete(&self, resource: &str, id: i64) -> Result<(), ResourceError> {
        let url = format!("{}/{}/{}", self.base_uri, resource, id);
        debug!(%url, "preprocessor DELETE");
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(ResourceError::Deletion {
                status: status.as_u16(),
                reason: read_reason(response).await,
            })
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> ResourceError {
    ResourceError::Network(e.to_string())
}

/// Best-effort reason for a failed response: the body when there is one,
/// the canonical status text otherwise.
async fn read_reason(response: reqwest::Response) -> String {
    let canonical = response
        .status()
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string();
    match response.text().await {
        Ok(body) if !body.is_empty() => body,
        _ => canonical,
    }
}
