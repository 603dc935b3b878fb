//! Quantity reconciliation rules.
//!
//! This module holds the arithmetic of the engine, independent of storage.
//! Storage layers lock the item row, read its quantity, ask this module for
//! the [`Transition`], and persist the result in the same unit of work.
//!
//! # Rules
//!
//! 1. `inbound` adds its magnitude, `outbound` subtracts it
//! 2. `absolute` replaces the quantity with its magnitude
//! 3. Corrections apply the difference between new and old magnitude
//! 4. Reversals apply the inverse of the original movement
//! 5. Every result is clamped at zero
//! 6. A transition alerts when it changes the quantity and lands at or
//!    below the item's minimum

use crate::{error::Result, Correction, Item, Movement, MovementKind, Quantity};
use serde::{Deserialize, Serialize};

/// A guarded quantity change `before -> after` for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Quantity read under the row lock
    pub before: Quantity,
    /// Quantity to persist, already clamped
    pub after: Quantity,
}

impl Transition {
    fn new(before: Quantity, unclamped: Quantity) -> Self {
        Self {
            before,
            after: clamp(unclamped),
        }
    }

    /// Whether the stored quantity actually changes.
    pub fn is_change(&self) -> bool {
        self.before != self.after
    }

    /// Whether this transition must raise a low-stock notification.
    ///
    /// Fires every time the new quantity differs from the old one and sits at
    /// or below `minimum`, including repeated moves further down. Never fires
    /// without a minimum.
    pub fn crosses_minimum(&self, minimum: Option<Quantity>) -> bool {
        match minimum {
            Some(m) => self.is_change() && self.after <= m,
            None => false,
        }
    }
}

/// Floor a computed quantity at zero.
pub fn clamp(quantity: Quantity) -> Quantity {
    quantity.max(0)
}

fn signed_delta(kind: MovementKind, magnitude: Quantity) -> Quantity {
    match kind {
        MovementKind::Inbound => magnitude,
        MovementKind::Outbound => magnitude.saturating_neg(),
        MovementKind::Absolute => 0,
    }
}

/// Plan the effect of a new movement on quantity `current`.
pub fn plan_apply(current: Quantity, kind: MovementKind, magnitude: Quantity) -> Transition {
    let unclamped = match kind {
        MovementKind::Absolute => magnitude,
        _ => current.saturating_add(signed_delta(kind, magnitude)),
    };
    Transition::new(current, unclamped)
}

/// Plan the effect of correcting `movement` to `correction` on quantity `current`.
///
/// Fails with `AbsoluteMovementLocked` for absolute movements.
pub fn plan_correct(
    current: Quantity,
    movement: &Movement,
    correction: &Correction,
) -> Result<Transition> {
    movement.ensure_adjustable()?;
    let delta = correction.magnitude.saturating_sub(movement.magnitude);
    let unclamped = current.saturating_add(signed_delta(movement.kind, delta));
    Ok(Transition::new(current, unclamped))
}

/// Plan the effect of deleting `movement` on quantity `current`.
///
/// Fails with `AbsoluteMovementLocked` for absolute movements: there is no
/// prior quantity to restore.
pub fn plan_reverse(current: Quantity, movement: &Movement) -> Result<Transition> {
    movement.ensure_adjustable()?;
    let unclamped = current.saturating_sub(signed_delta(movement.kind, movement.magnitude));
    Ok(Transition::new(current, unclamped))
}

/// Result of a reconciled operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// The item after the operation
    pub item: Item,
    /// The created, corrected, or removed movement
    pub movement: Movement,
    /// Quantity change applied to the item
    pub transition: Transition,
}

impl Outcome {
    /// Whether the operation crossed the item's low-stock threshold.
    pub fn crossed_minimum(&self) -> bool {
        self.transition.crosses_minimum(self.item.minimum)
    }
}
