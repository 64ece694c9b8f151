//! Mechanism-side domain types.

use serde::{Deserialize, Serialize};

use super::reaction::{Accelerate, Catalyst, Molecule, ProductFrom, Reaction, ReagentIn};

/// Identifier of a mechanism, minted by the Preprocessor.
pub type MechanismId = i64;

/// Identifier of a mechanism stage.
pub type StageId = i64;

/// A mechanism summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mechanism {
    pub mechanism_id: MechanismId,
    pub mechanism_name: String,
    pub mechanism_type: String,
    pub activation_energy: f64,
}

/// Narrative attached to a mechanism context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub description: String,
}

/// One stage of a mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub stage_id: StageId,
    pub stage_name: String,
    pub stage_description: String,
}

/// Anything that can take part in a mechanism stage.
///
/// Wire form is a tagged discriminator object:
/// `{"tag": "IMolecule", "contents": {...}}`. An unknown tag fails to
/// decode, which surfaces as a decoding error at the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "contents")]
pub enum Interactant {
    IMolecule(Molecule),
    ICatalyst(Catalyst),
    IAccelerate(Accelerate),
    IProductFrom(ProductFrom),
    IReagentIn(ReagentIn),
    IReaction(Reaction),
}

/// Full detail of a mechanism as served by the Preprocessor.
///
/// `stage_interactants` is an ordered sequence; order is preserved
/// verbatim through the cache and the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanismDetails {
    pub mechanism_context: (Mechanism, Follow),
    pub stage_interactants: Vec<(Stage, Vec<Interactant>)>,
}
