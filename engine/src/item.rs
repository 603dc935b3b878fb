//! Item types for tracked stock-keeping units.

use crate::{error::Result, Error, ItemId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};

/// A tracked stock-keeping unit.
///
/// `quantity` is never negative and only changes through the reconciliation
/// protocol; a freshly registered item starts at zero so its quantity always
/// equals the net effect of its movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier for this item
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Unit label ("pcs", "kg", ...)
    pub unit: String,
    /// Current quantity on hand
    pub quantity: Quantity,
    /// Low-stock threshold; `None` disables alerting
    pub minimum: Option<Quantity>,
    /// Last modification (milliseconds since epoch)
    pub updated_at: Timestamp,
}

impl Item {
    /// Create a new item with zero quantity.
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        unit: impl Into<String>,
        minimum: Option<Quantity>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            quantity: 0,
            minimum,
            updated_at: timestamp,
        }
    }

    /// Whether the current quantity sits at or below the configured minimum.
    pub fn is_low(&self) -> bool {
        self.minimum.is_some_and(|m| self.quantity <= m)
    }

    /// Store a new quantity produced by the engine.
    pub(crate) fn set_quantity(&mut self, quantity: Quantity, timestamp: Timestamp) {
        self.quantity = quantity;
        self.updated_at = timestamp;
    }
}

/// Fields supplied when registering a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub minimum: Option<Quantity>,
}

impl NewItem {
    /// Validate registration fields.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidField {
                field: "name".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.unit.trim().is_empty() {
            return Err(Error::InvalidField {
                field: "unit".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(minimum) = self.minimum {
            if minimum < 0 {
                return Err(Error::InvalidField {
                    field: "minimum".into(),
                    reason: format!("must not be negative, got {}", minimum),
                });
            }
        }
        Ok(())
    }

    /// Build the item this registration describes.
    pub fn into_item(self, id: impl Into<ItemId>, timestamp: Timestamp) -> Item {
        Item::new(id, self.name, self.unit, self.minimum, timestamp)
    }
}
