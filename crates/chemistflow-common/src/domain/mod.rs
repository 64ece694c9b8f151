//! Domain model carried through the system.
//!
//! The Preprocessor is the source of truth for these shapes; ChemistFlow
//! carries them opaquely except for the id fields and, for reactions, the
//! `conditions` list that drives compute fan-out. Pair sequences encode as
//! two-element JSON arrays and tagged unions use a `"tag"`/`"contents"`
//! discriminator, matching the upstream wire format.

pub mod compute;
pub mod mechanism;
pub mod reaction;

pub use compute::*;
pub use mechanism::*;
pub use reaction::*;
