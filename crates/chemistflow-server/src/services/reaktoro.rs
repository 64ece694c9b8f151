//! Compute fan-out against the Engine.
//!
//! One compute request expands into `sum over conditions of
//! min(|temperature|, |pressure|)` system states, all dispatched to the
//! Engine concurrently. Results come back as a positional vector: slot i
//! always corresponds to state i in expansion order, no matter which
//! sub-request finished first, and a failed slot never cancels or
//! disturbs its siblings.

use std::sync::Arc;

use tracing::{debug, info};

use chemistflow_client::EngineClient;
use chemistflow_common::domain::{
    ComputeOutcome, ComputePropsRequest, Database, Molecule, MoleculeAmountList,
    ReactionDetails, SystemState,
};
use chemistflow_common::error::{EngineFault, ResourceError};

use super::reaction::ReactionService;

pub struct ReaktoroService {
    reactions: Arc<ReactionService>,
    engine: Arc<EngineClient>,
}

impl ReaktoroService {
    pub fn new(reactions: Arc<ReactionService>, engine: Arc<EngineClient>) -> Self {
        Self { reactions, engine }
    }

    /// Fetches the reaction, expands its conditions into system states
    /// and gathers one outcome per state.
    ///
    /// Fetch failures propagate to the caller (`NotFound` stays a 404 at
    /// the surface); only Engine sub-request failures occupy `Left`
    /// slots.
    pub async fn compute(
        &self,
        request: ComputePropsRequest,
    ) -> Result<Vec<ComputeOutcome>, ResourceError> {
        let details = self.reactions.get(request.reaction_id).await?;
        let amounts = pair_amounts(&details, &request.amounts);
        let states = expand_states(&details, &request.database, &amounts);
        info!(
            reaction_id = request.reaction_id,
            states = states.len(),
            "dispatching compute fan-out"
        );

        let handles: Vec<_> = states
            .into_iter()
            .map(|state| {
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move { engine.compute(&state).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let outcome = match handle.await {
                Ok(Ok(props)) => ComputeOutcome::properties(props),
                Ok(Err(fault)) => {
                    debug!(fault = %fault, "engine sub-request failed");
                    ComputeOutcome::failure(&fault)
                }
                Err(join_error) => {
                    debug!(error = %join_error, "engine sub-task died");
                    ComputeOutcome::failure(&EngineFault::Engine(
                        "Failed to compute SystemProps".to_string(),
                    ))
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

/// Pairs the reaction's reagent and product sequences with the client's
/// amount vectors, positionally. The shorter side wins on a length
/// mismatch.
fn pair_amounts(
    details: &ReactionDetails,
    amounts: &MoleculeAmountList,
) -> Vec<(Molecule, f64)> {
    let inbound = details
        .inbound_reagents
        .iter()
        .zip(amounts.inbound_reagent_amounts.iter())
        .map(|((_, molecule), amount)| (molecule.clone(), *amount));
    let outbound = details
        .outbound_products
        .iter()
        .zip(amounts.outbound_product_amounts.iter())
        .map(|((_, molecule), amount)| (molecule.clone(), *amount));
    inbound.chain(outbound).collect()
}

/// Expands every condition into system states, zipping its temperature
/// and pressure arrays (shorter wins) and flattening across conditions
/// in order.
fn expand_states(
    details: &ReactionDetails,
    database: &Database,
    amounts: &[(Molecule, f64)],
) -> Vec<SystemState> {
    details
        .conditions
        .iter()
        .flat_map(|(accelerate, _)| {
            accelerate
                .temperature
                .iter()
                .zip(accelerate.pressure.iter())
                .map(|(temperature, pressure)| SystemState {
                    temperature: *temperature,
                    pressure: *pressure,
                    database: database.clone(),
                    molecule_amounts: amounts.to_vec(),
                })
        })
        .collect()
}
