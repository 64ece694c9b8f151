//! Error taxonomy for the remote-resource families and the uniform HTTP
//! error envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from proxying a Preprocessor resource (reaction or mechanism).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("resource {0} was not found upstream")]
    NotFound(i64),

    #[error("creation rejected upstream ({status}): {reason}")]
    Creation { status: u16, reason: String },

    #[error("deletion rejected upstream ({status}): {reason}")]
    Deletion { status: u16, reason: String },

    #[error("failed to decode upstream body: {0}")]
    Decoding(String),

    #[error("unexpected upstream status {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("transport failure: {0}")]
    Network(String),
}

impl ResourceError {
    /// Envelope kind string for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceError::NotFound(_) => "NotFound",
            ResourceError::Creation { .. } => "CreationError",
            ResourceError::Deletion { .. } => "DeletionError",
            ResourceError::Decoding(_) => "DecodingError",
            ResourceError::Http { .. } => "HttpError",
            ResourceError::Network(_) => "NetworkError",
        }
    }

    /// Whether an idempotent request may be retried after this error.
    ///
    /// Transient transport failures and upstream 5xx responses are
    /// retryable; everything else is a permanent answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResourceError::Network(_) => true,
            ResourceError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from one Engine sub-request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineFault {
    /// The Engine rejected the system state with a 400 and a
    /// human-readable explanation in the body.
    #[error("{0}")]
    BadRequest(String),

    /// Any other Engine failure: non-success status or transport error.
    #[error("{0}")]
    Engine(String),
}

impl EngineFault {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineFault::BadRequest(_) => "BadRequest",
            EngineFault::Engine(_) => "EngineError",
        }
    }
}

/// Errors from the two-tier cache facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("entry {0} already exists in the cache")]
    AlreadyExists(i64),
}

/// Errors from the cluster replication layer.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("frame too large: {0} bytes (max {1} bytes)")]
    FrameTooLarge(usize, usize),

    #[error("peer timed out after {0}ms")]
    Timeout(u64),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Uniform error body returned by the HTTP surface and embedded in
/// failed compute slots: `{"error": "<Kind>", "message": "<detail>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&ResourceError> for ErrorEnvelope {
    fn from(err: &ResourceError) -> Self {
        ErrorEnvelope::new(err.kind(), err.to_string())
    }
}

impl From<&EngineFault> for ErrorEnvelope {
    fn from(fault: &EngineFault) -> Self {
        ErrorEnvelope::new(fault.kind(), fault.to_string())
    }
}
