//! ChemistFlow Server
//!
//! The middle tier itself: cache-first proxy services over the
//! Preprocessor, the parallel compute fan-out against the Engine, the
//! axum HTTP surface, and the bootstrap wiring that ties clients, the
//! cluster node, caches and services together.
//!
//! # Request flows
//!
//! - *Read*: HTTP → service.get(id) → cache.get → on miss → Preprocessor
//!   GET → cache.put → response.
//! - *Write*: HTTP → service.create(obj) → Preprocessor POST → on success
//!   → cache.put → response.
//! - *Compute*: HTTP → ReaktoroService.compute → ReactionService.get →
//!   expand conditions into system states → parallel Engine POSTs →
//!   positional result vector.

pub mod bootstrap;
pub mod http_router;
pub mod http_server;
pub mod services;

pub use bootstrap::{App, BootstrapError};
pub use http_router::{api_router, AppState};
pub use http_server::HttpServer;
pub use services::{MechanismService, ReactionService, ReaktoroService};
