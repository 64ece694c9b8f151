//! ChemistFlow Upstream Clients
//!
//! Thin, typed HTTP clients for the two upstreams:
//!
//! - [`PreprocessorClient`]: the authoritative store of reactions and
//!   mechanisms (GET/POST/DELETE, JSON bodies mirroring the domain
//!   types).
//! - [`EngineClient`]: the thermodynamics solver (`POST /reaction` with a
//!   system state, properties or a human-readable 400 back).
//!
//! Both share a process-wide `reqwest::Client` per upstream so the
//! connection pool is reused across every request; constructing a client
//! per request is forbidden. Idempotent GETs retry with exponential
//! backoff and jitter; writes never retry.

pub mod engine;
pub mod http;
pub mod preprocessor;
pub mod retry;

pub use engine::EngineClient;
pub use http::build_http_client;
pub use preprocessor::PreprocessorClient;
pub use retry::RetryPolicy;
