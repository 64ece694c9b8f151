//! Reaction-side domain types.

use serde::{Deserialize, Serialize};

/// Identifier of a reaction, minted by the Preprocessor.
///
/// Identifiers carry no domain semantics beyond equality and hashability;
/// ChemistFlow never generates them.
pub type ReactionId = i64;

/// Identifier of a molecule, minted by the Preprocessor.
pub type MoleculeId = i64;

/// Identifier of a catalyst, minted by the Preprocessor.
pub type CatalystId = i64;

/// A reaction summary: the id plus a display name.
///
/// # Example
///
/// ```
/// use chemistflow_common::domain::Reaction;
///
/// let r: Reaction = serde_json::from_str(
///     r#"{"reactionId":42,"reactionName":"Haber process"}"#,
/// ).unwrap();
/// assert_eq!(r.reaction_id, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub reaction_id: ReactionId,
    pub reaction_name: String,
}

impl Reaction {
    pub fn new(reaction_id: ReactionId, reaction_name: impl Into<String>) -> Self {
        Self {
            reaction_id,
            reaction_name: reaction_name.into(),
        }
    }
}

/// A molecule participating in a reaction.
///
/// Field-level semantics (SMILES string, IUPAC name) are the
/// Preprocessor's concern; ChemistFlow only relies on the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Molecule {
    pub molecule_id: MoleculeId,
    pub molecule_smiles: String,
    pub molecule_iupac_name: String,
}

/// A catalyst attached to a reaction condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalyst {
    pub catalyst_id: CatalystId,
    pub catalyst_smiles: String,
    pub catalyst_name: String,
}

/// Stoichiometric amount of an inbound reagent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReagentIn {
    pub amount: f64,
}

/// Stoichiometric amount of an outbound product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFrom {
    pub amount: f64,
}

/// A reaction condition: parallel arrays of temperatures and pressures.
///
/// The arrays pair positionally when the condition is expanded into
/// system states; when their lengths differ the shorter one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accelerate {
    pub temperature: Vec<f64>,
    pub pressure: Vec<f64>,
}

/// Full detail of a reaction as served by the Preprocessor.
///
/// The order of `inbound_reagents`, `outbound_products` and `conditions`
/// is significant: it defines positional pairing with client-supplied
/// amount vectors, and the condition order fixes the slot order of
/// compute results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDetails {
    pub reaction: Reaction,
    pub inbound_reagents: Vec<(ReagentIn, Molecule)>,
    pub outbound_products: Vec<(ProductFrom, Molecule)>,
    pub conditions: Vec<(Accelerate, Catalyst)>,
}

impl ReactionDetails {
    /// Details of a freshly created reaction: no reagents, products or
    /// conditions have been linked to it yet.
    pub fn bare(reaction: Reaction) -> Self {
        Self {
            reaction,
            inbound_reagents: Vec::new(),
            outbound_products: Vec::new(),
            conditions: Vec::new(),
        }
    }
}
