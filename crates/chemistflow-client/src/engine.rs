//! Client for the Engine (Reaktoro), the thermodynamics solver.

use reqwest::StatusCode;
use tracing::debug;

use chemistflow_common::config::ClientConfig;
use chemistflow_common::domain::{SystemProps, SystemState};
use chemistflow_common::error::EngineFault;

/// Message used for every Engine failure that is not a 400: the solver's
/// diagnostics are not actionable for callers, the slot just failed.
const ENGINE_FAILURE: &str = "Failed to compute SystemProps";

pub struct EngineClient {
    http: reqwest::Client,
    base_uri: String,
}

impl EngineClient {
    pub fn new(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
        }
    }

    /// Submits one system state.
    ///
    /// 2xx decodes to [`SystemProps`]; a 400 body is a human-readable
    /// explanation of why the state was rejected; any other status or a
    /// transport failure collapses to the generic engine fault.
    pub async fn compute(&self, state: &SystemState) -> Result<SystemProps, EngineFault> {
        let url = format!("{}/reaction", self.base_uri);
        debug!(%url, temperature = state.temperature, pressure = state.pressure, "engine POST");

        let response = self
            .http
            .post(&url)
            .json(state)
            .send()
            .await
            .map_err(|_| EngineFault::Engine(ENGINE_FAILURE.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineFault::BadRequest(body));
        }
        if !status.is_success() {
            return Err(EngineFault::Engine(ENGINE_FAILURE.to_string()));
        }
        response
            .json::<SystemProps>()
            .await
            .map_err(|_| EngineFault::Engine(ENGINE_FAILURE.to_string()))
    }
}
