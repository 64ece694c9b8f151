//! Compute-side domain types: system states sent to the Engine and the
//! per-slot results coming back.

use serde::{Deserialize, Serialize};

use super::reaction::{Molecule, ReactionId};
use crate::error::{EngineFault, ErrorEnvelope};

/// Thermodynamic database the Engine should resolve species against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub name: String,
}

/// One fully parameterized state submitted to the Engine.
///
/// `molecule_amounts` is a pair list rather than a JSON object because
/// molecules are structured keys; the Engine consumes it positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub temperature: f64,
    pub pressure: f64,
    pub database: Database,
    pub molecule_amounts: Vec<(Molecule, f64)>,
}

/// Thermodynamic properties computed by the Engine.
///
/// The record is opaque to ChemistFlow: it is decoded only to prove the
/// body is JSON and forwarded verbatim, so it round-trips byte-equivalently
/// up to key ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemProps(pub serde_json::Value);

/// Client-supplied amount vectors, paired positionally with the reaction's
/// reagent and product sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeAmountList {
    pub inbound_reagent_amounts: Vec<f64>,
    pub outbound_product_amounts: Vec<f64>,
}

/// Body of `POST /api/system/properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputePropsRequest {
    pub reaction_id: ReactionId,
    pub database: Database,
    pub amounts: MoleculeAmountList,
}

/// Result of one Engine sub-request, in its slot of the response vector.
///
/// Encodes Either-shaped: `{"Left": {"error": ..., "message": ...}}` for a
/// failed slot, `{"Right": {...}}` for computed properties. A failing slot
/// never disturbs its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComputeOutcome {
    Left(ErrorEnvelope),
    Right(SystemProps),
}

impl ComputeOutcome {
    pub fn failure(fault: &EngineFault) -> Self {
        ComputeOutcome::Left(ErrorEnvelope::new(fault.kind(), fault.to_string()))
    }

    pub fn properties(props: SystemProps) -> Self {
        ComputeOutcome::Right(props)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ComputeOutcome::Left(_))
    }
}
