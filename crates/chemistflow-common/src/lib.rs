//! ChemistFlow Common Types
//!
//! This crate provides the shared vocabulary of the ChemistFlow system:
//!
//! - **Domain model**: reactions, mechanisms, molecules, system states and
//!   the other value types exchanged with the Preprocessor and the Engine.
//!   All of them serialize as JSON at system boundaries.
//! - **Error taxonomy**: structured error kinds for each remote-resource
//!   family, plus the uniform HTTP error envelope.
//! - **Configuration**: the recognized options for the HTTP surface, the
//!   upstream clients, the two cache tiers, and cluster membership.
//!
//! Domain values are treated as immutable snapshots: the system never
//! mutates a cached value in place, it replaces it with a new one.

pub mod config;
pub mod domain;
pub mod error;

pub use config::*;
pub use domain::*;
pub use error::*;
