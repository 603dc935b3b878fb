//! Movement types for recording quantity changes.
//!
//! Every change to an item's quantity is recorded as a movement. Movements are
//! append-only except through the correction and reversal paths, which are
//! only open to `inbound` and `outbound` movements.

use crate::{error::Result, Error, ItemId, MovementId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received; adds `magnitude`
    Inbound,
    /// Stock issued; removes `magnitude`
    Outbound,
    /// Stock count; `magnitude` is the new quantity
    Absolute,
}

impl MovementKind {
    /// Stable textual form, as stored and transmitted.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
            MovementKind::Absolute => "absolute",
        }
    }

    /// Whether movements of this kind may be corrected or reversed.
    pub fn is_adjustable(&self) -> bool {
        !matches!(self, MovementKind::Absolute)
    }

    /// Smallest magnitude a movement of this kind accepts.
    ///
    /// A stock count may legitimately be zero; deltas must be positive.
    pub fn min_magnitude(&self) -> Quantity {
        match self {
            MovementKind::Absolute => 0,
            MovementKind::Inbound | MovementKind::Outbound => 1,
        }
    }

    fn check_magnitude(&self, magnitude: Quantity) -> Result<()> {
        if magnitude < self.min_magnitude() {
            return Err(Error::InvalidMagnitude {
                kind: self.as_str().to_string(),
                magnitude,
            });
        }
        Ok(())
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inbound" => Ok(MovementKind::Inbound),
            "outbound" => Ok(MovementKind::Outbound),
            "absolute" => Ok(MovementKind::Absolute),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

/// A recorded quantity change against an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    /// Unique identifier for this movement
    pub id: MovementId,
    /// Item this movement belongs to
    pub item_id: ItemId,
    /// Kind of change
    pub kind: MovementKind,
    /// Requested magnitude (pre-clamp)
    pub magnitude: Quantity,
    /// Optional free-text reason
    pub reason: Option<String>,
    /// When the movement was recorded (milliseconds since epoch)
    pub created_at: Timestamp,
}

impl Movement {
    /// Create a movement from a validated request.
    pub fn new(
        id: impl Into<MovementId>,
        item_id: impl Into<ItemId>,
        request: &MovementRequest,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            kind: request.kind,
            magnitude: request.magnitude,
            reason: request.reason.clone(),
            created_at: timestamp,
        }
    }

    /// Fail with `AbsoluteMovementLocked` unless this movement may be adjusted.
    pub fn ensure_adjustable(&self) -> Result<()> {
        if self.kind.is_adjustable() {
            Ok(())
        } else {
            Err(Error::AbsoluteMovementLocked(self.id.clone()))
        }
    }
}

/// A caller's intent to move stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub kind: MovementKind,
    pub magnitude: Quantity,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MovementRequest {
    /// Create a new movement request.
    pub fn new(kind: MovementKind, magnitude: Quantity) -> Self {
        Self {
            kind,
            magnitude,
            reason: None,
        }
    }

    /// Attach a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Validate the request before any unit of work is opened.
    pub fn validate(&self) -> Result<()> {
        self.kind.check_magnitude(self.magnitude)
    }
}

/// A caller's edit of an existing movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub magnitude: Quantity,
    /// Replaces the stored reason; `None` clears it
    #[serde(default)]
    pub reason: Option<String>,
}

impl Correction {
    /// Create a new correction.
    pub fn new(magnitude: Quantity, reason: Option<String>) -> Self {
        Self { magnitude, reason }
    }

    /// Validate the correction before any unit of work is opened.
    ///
    /// Only inbound/outbound movements can be corrected, so the magnitude
    /// must be positive regardless of the stored kind.
    pub fn validate(&self) -> Result<()> {
        if self.magnitude <= 0 {
            return Err(Error::InvalidMagnitude {
                kind: "correction".to_string(),
                magnitude: self.magnitude,
            });
        }
        Ok(())
    }
}
