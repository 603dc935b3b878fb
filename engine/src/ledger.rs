//! Ledger - the in-memory inventory state container.
//!
//! The Ledger holds items and their movement histories and runs the full
//! reconciliation protocol against them. Exclusive access through `&mut self`
//! plays the role of the row lock; every operation validates and plans before
//! it mutates anything, so a failed operation leaves the ledger untouched.

use crate::{
    error::Result,
    reconcile::{plan_apply, plan_correct, plan_reverse, Outcome},
    Correction, Error, Item, ItemId, Movement, MovementId, MovementRequest, NewItem, Timestamp,
};
use std::collections::HashMap;

/// In-memory items and movements.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Items by ID
    items: HashMap<ItemId, Item>,
    /// Movements per item, in creation order
    movements: HashMap<ItemId, Vec<Movement>>,
    /// Owning item of each movement
    owners: HashMap<MovementId, ItemId>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new item with zero quantity.
    pub fn register(
        &mut self,
        id: impl Into<ItemId>,
        new_item: NewItem,
        timestamp: Timestamp,
    ) -> Result<&Item> {
        new_item.validate()?;
        let id = id.into();
        if self.items.contains_key(&id) {
            return Err(Error::ItemAlreadyExists(id));
        }

        let item = new_item.into_item(id.clone(), timestamp);
        self.movements.insert(id.clone(), Vec::new());
        Ok(self.items.entry(id).or_insert(item))
    }

    /// Delete an item together with all of its movements.
    pub fn remove_item(&mut self, id: &str) -> Result<Item> {
        let item = self
            .items
            .remove(id)
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;
        for movement in self.movements.remove(id).unwrap_or_default() {
            self.owners.remove(&movement.id);
        }
        Ok(item)
    }

    /// Get an item by ID.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Get a movement by ID.
    pub fn movement(&self, id: &str) -> Option<&Movement> {
        let owner = self.owners.get(id)?;
        self.movements.get(owner)?.iter().find(|m| m.id == id)
    }

    /// Movements of an item, oldest first.
    pub fn movements_for(&self, item_id: &str) -> &[Movement] {
        self.movements
            .get(item_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of registered items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Apply a new movement to an item.
    pub fn apply(
        &mut self,
        item_id: &str,
        movement_id: impl Into<MovementId>,
        request: MovementRequest,
        timestamp: Timestamp,
    ) -> Result<Outcome> {
        request.validate()?;
        let movement_id = movement_id.into();
        if self.owners.contains_key(&movement_id) {
            return Err(Error::MovementAlreadyExists(movement_id));
        }

        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;

        let transition = plan_apply(item.quantity, request.kind, request.magnitude);
        item.set_quantity(transition.after, timestamp);

        let movement = Movement::new(movement_id, item_id, &request, timestamp);
        self.owners
            .insert(movement.id.clone(), movement.item_id.clone());
        self.movements
            .entry(item_id.to_string())
            .or_default()
            .push(movement.clone());

        Ok(Outcome {
            item: item.clone(),
            movement,
            transition,
        })
    }

    /// Change the magnitude and reason of an inbound or outbound movement.
    pub fn correct(
        &mut self,
        movement_id: &str,
        correction: Correction,
        timestamp: Timestamp,
    ) -> Result<Outcome> {
        correction.validate()?;
        let (item_id, index) = self.locate(movement_id)?;

        let movements = self
            .movements
            .get_mut(&item_id)
            .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.clone()))?;

        let movement = &mut movements[index];
        let transition = plan_correct(item.quantity, movement, &correction)?;

        item.set_quantity(transition.after, timestamp);
        movement.magnitude = correction.magnitude;
        movement.reason = correction.reason;

        Ok(Outcome {
            item: item.clone(),
            movement: movement.clone(),
            transition,
        })
    }

    /// Delete an inbound or outbound movement and undo its effect.
    pub fn reverse(&mut self, movement_id: &str, timestamp: Timestamp) -> Result<Outcome> {
        let (item_id, index) = self.locate(movement_id)?;

        let movements = self
            .movements
            .get_mut(&item_id)
            .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.clone()))?;

        let transition = plan_reverse(item.quantity, &movements[index])?;

        item.set_quantity(transition.after, timestamp);
        let movement = movements.remove(index);
        self.owners.remove(movement_id);

        Ok(Outcome {
            item: item.clone(),
            movement,
            transition,
        })
    }

    fn locate(&self, movement_id: &str) -> Result<(ItemId, usize)> {
        let item_id = self
            .owners
            .get(movement_id)
            .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
        let index = self
            .movements_for(item_id)
            .iter()
            .position(|m| m.id == movement_id)
            .ok_or_else(|| Error::MovementNotFound(movement_id.to_string()))?;
        Ok((item_id.clone(), index))
    }
}
