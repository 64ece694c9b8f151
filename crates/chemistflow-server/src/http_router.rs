//! HTTP surface: CRUD and compute routes under `/api`.
//!
//! The surface stays thin: parse, delegate to a service, shape the
//! response. Every error leaves as the uniform envelope
//! `{"error": "<Kind>", "message": "<detail>"}`; Engine sub-request
//! failures are not errors here, they ride inside the 200 result vector.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use chemistflow_common::domain::{
    ComputeOutcome, ComputePropsRequest, MechanismDetails, Reaction, ReactionDetails,
};
use chemistflow_common::error::{ErrorEnvelope, ResourceError};

use crate::services::{MechanismService, ReactionService, ReaktoroService};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub reactions: Arc<ReactionService>,
    pub mechanisms: Arc<MechanismService>,
    pub reaktoro: Arc<ReaktoroService>,
}

/// Builds the `/api` router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/reaction/{id}",
            get(get_reaction).delete(delete_reaction),
        )
        .route("/api/reaction", post(create_reaction))
        .route("/api/mechanism/{id}", get(get_mechanism))
        .route("/api/system/properties", post(compute_properties))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// An error leaving the HTTP surface: status plus envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    envelope: ErrorEnvelope,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            envelope: ErrorEnvelope::new("BadRequest", message),
        }
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match &err {
            ResourceError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                envelope: ErrorEnvelope::from(&err),
            },
            ResourceError::Creation { .. } | ResourceError::Deletion { .. } => Self {
                status: StatusCode::BAD_REQUEST,
                envelope: ErrorEnvelope::from(&err),
            },
            ResourceError::Decoding(_)
            | ResourceError::Http { .. }
            | ResourceError::Network(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                envelope: ErrorEnvelope::new("InternalError", err.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Path ids must be integers; anything else is a 400 with an envelope
/// body rather than a bare rejection.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("id '{}' is not an integer", raw)))
}

async fn get_reaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReactionDetails>, ApiError> {
    let id = parse_id(&id)?;
    let details = state.reactions.get(id).await?;
    Ok(Json(details))
}

async fn create_reaction(
    State(state): State<AppState>,
    Json(reaction): Json<Reaction>,
) -> Result<(StatusCode, Json<Reaction>), ApiError> {
    let created = state.reactions.create(reaction).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_reaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.reactions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_mechanism(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MechanismDetails>, ApiError> {
    let id = parse_id(&id)?;
    let details = state.mechanisms.get(id).await?;
    Ok(Json(details))
}

async fn compute_properties(
    State(state): State<AppState>,
    Json(request): Json<ComputePropsRequest>,
) -> Result<Json<Vec<ComputeOutcome>>, ApiError> {
    let outcomes = state.reaktoro.compute(request).await?;
    Ok(Json(outcomes))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
