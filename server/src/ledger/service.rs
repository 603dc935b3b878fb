//! The async reconciliation engine.
//!
//! Each operation runs in its own unit of work:
//!
//! 1. Validate the caller's input (no locks taken yet)
//! 2. Lock the movement row (correct/reverse only), then the item row
//! 3. Plan the quantity transition with `tally_engine`
//! 4. Write item and movement log
//! 5. Commit, or roll back on any failure
//! 6. Notify on a threshold crossing, using the committed snapshot

use tally_engine::{
    error::Result, plan_apply, plan_correct, plan_reverse, Correction, Error, Item, Movement,
    MovementRequest, Outcome, Timestamp,
};

use super::{LedgerStore, UnitOfWork};
use crate::notify::ThresholdNotifier;

/// Applies, corrects and reverses stock movements.
#[derive(Debug)]
pub struct StockService<S, N> {
    store: S,
    notifier: N,
}

impl<S: LedgerStore, N: ThresholdNotifier> StockService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Record a new movement against an item.
    pub async fn apply_movement(&self, item_id: &str, request: MovementRequest) -> Result<Outcome> {
        request.validate()?;
        let movement_id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();

        let mut work = self.store.begin().await?;
        let result = apply_within(&mut work, item_id, movement_id, &request, now).await;
        let outcome = finish(work, result).await?;

        tracing::debug!(
            item_id = %item_id,
            movement_id = %outcome.movement.id,
            kind = %request.kind,
            magnitude = request.magnitude,
            before = outcome.transition.before,
            after = outcome.transition.after,
            "Movement applied"
        );
        self.announce(&outcome);
        Ok(outcome)
    }

    /// Change the magnitude and reason of an inbound or outbound movement.
    pub async fn correct_movement(
        &self,
        movement_id: &str,
        correction: Correction,
    ) -> Result<Outcome> {
        correction.validate()?;
        let now = now_millis();

        let mut work = self.store.begin().await?;
        let result = correct_within(&mut work, movement_id, &correction, now).await;
        let outcome = finish(work, result).await?;

        tracing::debug!(
            item_id = %outcome.item.id,
            movement_id = %movement_id,
            magnitude = correction.magnitude,
            before = outcome.transition.before,
            after = outcome.transition.after,
            "Movement corrected"
        );
        self.announce(&outcome);
        Ok(outcome)
    }

    /// Delete an inbound or outbound movement and undo its effect.
    pub async fn reverse_movement(&self, movement_id: &str) -> Result<Outcome> {
        let now = now_millis();

        let mut work = self.store.begin().await?;
        let result = reverse_within(&mut work, movement_id, now).await;
        let outcome = finish(work, result).await?;

        tracing::debug!(
            item_id = %outcome.item.id,
            movement_id = %movement_id,
            before = outcome.transition.before,
            after = outcome.transition.after,
            "Movement reversed"
        );
        self.announce(&outcome);
        Ok(outcome)
    }

    /// Delete an item and its movement log.
    pub async fn remove_item(&self, item_id: &str) -> Result<Item> {
        let mut work = self.store.begin().await?;
        let result = remove_within(&mut work, item_id).await;
        let item = finish(work, result).await?;

        tracing::info!(item_id = %item_id, "Item deleted");
        Ok(item)
    }

    /// Hand a committed snapshot to the notifier if it crossed the minimum.
    fn announce(&self, outcome: &Outcome) {
        if outcome.crossed_minimum() {
            self.notifier.notify(&outcome.item);
        }
    }
}

async fn apply_within<W: UnitOfWork>(
    work: &mut W,
    item_id: &str,
    movement_id: String,
    request: &MovementRequest,
    now: Timestamp,
) -> Result<Outcome> {
    let item = work
        .lock_item(item_id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;

    let transition = plan_apply(item.quantity, request.kind, request.magnitude);

    let item = work
        .update_quantity(item_id, transition.after, now)
        .await?
        .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;
    let movement = work
        .append_movement(&Movement::new(movement_id, item_id, request, now))
        .await?;

    Ok(Outcome {
        item,
        movement,
        transition,
    })
}

async fn correct_within<W: UnitOfWork>(
    work: &mut W,
    movement_id: &str,
    correction: &Correction,
    now: Timestamp,
) -> Result<Outcome> {
    let movement = work
        .lock_movement(movement_id)
        .await?
        .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
    movement.ensure_adjustable()?;

    let item = work
        .lock_item(&movement.item_id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(movement.item_id.clone()))?;

    let transition = plan_correct(item.quantity, &movement, correction)?;

    let item = work
        .update_quantity(&item.id, transition.after, now)
        .await?
        .ok_or_else(|| Error::ItemNotFound(movement.item_id.clone()))?;
    let movement = work
        .update_movement(movement_id, correction)
        .await?
        .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;

    Ok(Outcome {
        item,
        movement,
        transition,
    })
}

async fn reverse_within<W: UnitOfWork>(
    work: &mut W,
    movement_id: &str,
    now: Timestamp,
) -> Result<Outcome> {
    let movement = work
        .lock_movement(movement_id)
        .await?
        .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
    movement.ensure_adjustable()?;

    let item = work
        .lock_item(&movement.item_id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(movement.item_id.clone()))?;

    let transition = plan_reverse(item.quantity, &movement)?;

    let item = work
        .update_quantity(&item.id, transition.after, now)
        .await?
        .ok_or_else(|| Error::ItemNotFound(movement.item_id.clone()))?;
    if !work.delete_movement(movement_id).await? {
        return Err(Error::MovementNotFound(movement_id.to_string()));
    }

    Ok(Outcome {
        item,
        movement,
        transition,
    })
}

async fn remove_within<W: UnitOfWork>(work: &mut W, item_id: &str) -> Result<Item> {
    // Movement rows before the item row, as in correct and reverse.
    let locked = work.lock_item_movements(item_id).await?;
    let item = work
        .lock_item(item_id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;

    if !work.delete_item(item_id).await? {
        return Err(Error::ItemNotFound(item_id.to_string()));
    }
    tracing::debug!(item_id = %item_id, movements = locked, "Item and movements removed");
    Ok(item)
}

/// Commit on success, roll back on failure.
async fn finish<W: UnitOfWork, T>(work: W, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            work.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = work.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            tracing::warn!(error = %err, "Unit of work rolled back");
            Err(err)
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}
