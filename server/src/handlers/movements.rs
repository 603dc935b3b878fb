//! Movement handlers - apply, correct and reverse.
//!
//! Request bodies are parsed here into engine types, so an unknown movement
//! kind is an engine validation error (400) rather than a body rejection.

use crate::error::Result;
use crate::ledger::{LedgerStore, StockService};
use crate::notify::ThresholdNotifier;
use serde::{Deserialize, Serialize};
use tally_engine::{Correction, Item, Movement, MovementKind, MovementRequest, Outcome, Quantity};

/// Request body for applying a movement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyMovementBody {
    /// `inbound`, `outbound` or `absolute`
    pub kind: String,
    pub magnitude: Quantity,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ApplyMovementBody {
    pub fn into_request(self) -> tally_engine::error::Result<MovementRequest> {
        let kind: MovementKind = self.kind.parse()?;
        Ok(MovementRequest {
            kind,
            magnitude: self.magnitude,
            reason: self.reason,
        })
    }
}

/// Request body for correcting a movement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectMovementBody {
    pub magnitude: Quantity,
    /// Replaces the stored reason; omitted clears it
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response for every movement operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    /// Item as committed
    pub item: Item,
    /// The created, corrected or removed movement
    pub movement: Movement,
}

impl From<Outcome> for MovementResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            item: outcome.item,
            movement: outcome.movement,
        }
    }
}

/// Apply a movement to an item.
pub async fn handle_apply_movement<S: LedgerStore, N: ThresholdNotifier>(
    stock: &StockService<S, N>,
    item_id: &str,
    body: ApplyMovementBody,
) -> Result<MovementResponse> {
    let request = body.into_request()?;
    let outcome = stock.apply_movement(item_id, request).await?;
    Ok(outcome.into())
}

/// Correct an inbound or outbound movement.
pub async fn handle_correct_movement<S: LedgerStore, N: ThresholdNotifier>(
    stock: &StockService<S, N>,
    movement_id: &str,
    body: CorrectMovementBody,
) -> Result<MovementResponse> {
    let correction = Correction::new(body.magnitude, body.reason);
    let outcome = stock.correct_movement(movement_id, correction).await?;
    Ok(outcome.into())
}

/// Reverse an inbound or outbound movement.
pub async fn handle_reverse_movement<S: LedgerStore, N: ThresholdNotifier>(
    stock: &StockService<S, N>,
    movement_id: &str,
) -> Result<MovementResponse> {
    let outcome = stock.reverse_movement(movement_id).await?;
    Ok(outcome.into())
}
