//! In-memory implementation of the storage contracts, used by tests.
//!
//! Committed state lives behind a plain mutex that is never held across an
//! await. Row locks are per-key async mutexes kept in a `DashMap`, held by the
//! unit of work until it commits or rolls back. Writes are staged and applied
//! together on commit.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tally_engine::{
    error::Result, Correction, Error, Item, ItemId, Movement, MovementId, Quantity, Timestamp,
};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::{LedgerStore, UnitOfWork};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    Item(ItemId),
    Movement(MovementId),
}

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, Item>,
    movements: HashMap<MovementId, Movement>,
}

#[derive(Debug)]
struct Shared {
    tables: Mutex<Tables>,
    locks: DashMap<LockKey, Arc<RowLock<()>>>,
    lock_timeout: Duration,
    fail_next_append: AtomicBool,
}

/// Ledger held entirely in process memory.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    shared: Arc<Shared>,
}

impl MemoryLedger {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                locks: DashMap::new(),
                lock_timeout,
                fail_next_append: AtomicBool::new(false),
            }),
        }
    }

    /// Insert an item directly, bypassing the engine.
    pub fn insert_item(&self, item: Item) {
        let mut tables = self.shared.tables.lock().expect("tables poisoned");
        tables.items.insert(item.id.clone(), item);
    }

    /// Committed state of an item.
    pub fn item(&self, id: &str) -> Option<Item> {
        let tables = self.shared.tables.lock().expect("tables poisoned");
        tables.items.get(id).cloned()
    }

    /// Committed state of a movement.
    pub fn movement(&self, id: &str) -> Option<Movement> {
        let tables = self.shared.tables.lock().expect("tables poisoned");
        tables.movements.get(id).cloned()
    }

    /// Number of committed movements of an item.
    pub fn movement_count(&self, item_id: &str) -> usize {
        let tables = self.shared.tables.lock().expect("tables poisoned");
        tables
            .movements
            .values()
            .filter(|m| m.item_id == item_id)
            .count()
    }

    /// Make the next `append_movement` fail with a storage error.
    pub fn fail_next_append(&self) {
        self.shared.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// Hold the row lock of an item outside any unit of work.
    pub async fn hold_item_lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self.row_lock(&LockKey::Item(id.to_string()));
        lock.lock_owned().await
    }

    fn movement_ids_of(&self, item_id: &str) -> Vec<MovementId> {
        let tables = self.shared.tables.lock().expect("tables poisoned");
        let mut ids: Vec<_> = tables
            .movements
            .values()
            .filter(|m| m.item_id == item_id)
            .map(|m| m.id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn row_lock(&self, key: &LockKey) -> Arc<RowLock<()>> {
        Arc::clone(&self.shared.locks.entry(key.clone()).or_default())
    }
}

impl LedgerStore for MemoryLedger {
    type Work = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork> {
        Ok(MemoryUnitOfWork {
            ledger: self.clone(),
            guards: Vec::new(),
            held: HashSet::new(),
            items: HashMap::new(),
            movements: HashMap::new(),
            writes: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum Write {
    Quantity {
        id: ItemId,
        quantity: Quantity,
        timestamp: Timestamp,
    },
    Append(Movement),
    Amend {
        id: MovementId,
        magnitude: Quantity,
        reason: Option<String>,
    },
    Remove(MovementId),
    DropItem(ItemId),
}

/// Staged writes plus the row locks they were made under.
pub struct MemoryUnitOfWork {
    ledger: MemoryLedger,
    guards: Vec<OwnedMutexGuard<()>>,
    held: HashSet<LockKey>,
    /// This unit's view of locked items
    items: HashMap<ItemId, Option<Item>>,
    /// This unit's view of locked or appended movements
    movements: HashMap<MovementId, Option<Movement>>,
    writes: Vec<Write>,
}

impl MemoryUnitOfWork {
    async fn acquire(&mut self, key: LockKey) -> Result<()> {
        if self.held.contains(&key) {
            return Ok(());
        }

        let lock = self.ledger.row_lock(&key);
        let guard = tokio::time::timeout(self.ledger.shared.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| Error::TransactionFailed(format!("timed out waiting for {:?}", key)))?;

        self.guards.push(guard);
        self.held.insert(key);
        Ok(())
    }

    fn committed_item(&self, id: &str) -> Option<Item> {
        self.ledger.item(id)
    }

    fn current_item(&mut self, id: &str) -> Option<Item> {
        if !self.items.contains_key(id) {
            let committed = self.committed_item(id);
            self.items.insert(id.to_string(), committed);
        }
        self.items.get(id).cloned().flatten()
    }

    fn current_movement(&mut self, id: &str) -> Option<Movement> {
        if !self.movements.contains_key(id) {
            let committed = self.ledger.movement(id);
            self.movements.insert(id.to_string(), committed);
        }
        self.movements.get(id).cloned().flatten()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_item(&mut self, id: &str) -> Result<Option<Item>> {
        self.acquire(LockKey::Item(id.to_string())).await?;
        Ok(self.current_item(id))
    }

    async fn update_quantity(
        &mut self,
        id: &str,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Result<Option<Item>> {
        let Some(mut item) = self.current_item(id) else {
            return Ok(None);
        };
        item.quantity = quantity;
        item.updated_at = timestamp;

        self.items.insert(id.to_string(), Some(item.clone()));
        self.writes.push(Write::Quantity {
            id: id.to_string(),
            quantity,
            timestamp,
        });
        Ok(Some(item))
    }

    async fn append_movement(&mut self, movement: &Movement) -> Result<Movement> {
        if self
            .ledger
            .shared
            .fail_next_append
            .swap(false, Ordering::SeqCst)
        {
            return Err(Error::TransactionFailed("injected append failure".into()));
        }
        if self.current_movement(&movement.id).is_some() {
            return Err(Error::TransactionFailed(format!(
                "duplicate movement id {}",
                movement.id
            )));
        }

        self.movements
            .insert(movement.id.clone(), Some(movement.clone()));
        self.writes.push(Write::Append(movement.clone()));
        Ok(movement.clone())
    }

    async fn lock_movement(&mut self, id: &str) -> Result<Option<Movement>> {
        self.acquire(LockKey::Movement(id.to_string())).await?;
        Ok(self.current_movement(id))
    }

    async fn update_movement(
        &mut self,
        id: &str,
        correction: &Correction,
    ) -> Result<Option<Movement>> {
        let Some(mut movement) = self.current_movement(id) else {
            return Ok(None);
        };
        movement.magnitude = correction.magnitude;
        movement.reason = correction.reason.clone();

        self.movements.insert(id.to_string(), Some(movement.clone()));
        self.writes.push(Write::Amend {
            id: id.to_string(),
            magnitude: correction.magnitude,
            reason: correction.reason.clone(),
        });
        Ok(Some(movement))
    }

    async fn delete_movement(&mut self, id: &str) -> Result<bool> {
        if self.current_movement(id).is_none() {
            return Ok(false);
        }
        self.movements.insert(id.to_string(), None);
        self.writes.push(Write::Remove(id.to_string()));
        Ok(true)
    }

    async fn lock_item_movements(&mut self, item_id: &str) -> Result<usize> {
        let ids = self.ledger.movement_ids_of(item_id);
        for id in &ids {
            self.acquire(LockKey::Movement(id.clone())).await?;
        }
        Ok(ids.len())
    }

    async fn delete_item(&mut self, id: &str) -> Result<bool> {
        if self.current_item(id).is_none() {
            return Ok(false);
        }
        self.items.insert(id.to_string(), None);
        for movement_id in self.ledger.movement_ids_of(id) {
            self.movements.insert(movement_id, None);
        }
        self.writes.push(Write::DropItem(id.to_string()));
        Ok(true)
    }

    async fn commit(self) -> Result<()> {
        {
            let mut tables = self.ledger.shared.tables.lock().expect("tables poisoned");
            for write in self.writes {
                match write {
                    Write::Quantity {
                        id,
                        quantity,
                        timestamp,
                    } => {
                        if let Some(item) = tables.items.get_mut(&id) {
                            item.quantity = quantity;
                            item.updated_at = timestamp;
                        }
                    }
                    Write::Append(movement) => {
                        tables.movements.insert(movement.id.clone(), movement);
                    }
                    Write::Amend {
                        id,
                        magnitude,
                        reason,
                    } => {
                        if let Some(movement) = tables.movements.get_mut(&id) {
                            movement.magnitude = magnitude;
                            movement.reason = reason;
                        }
                    }
                    Write::Remove(id) => {
                        tables.movements.remove(&id);
                    }
                    Write::DropItem(id) => {
                        tables.movements.retain(|_, m| m.item_id != id);
                        tables.items.remove(&id);
                    }
                }
            }
        }
        drop(self.guards);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        drop(self.guards);
        Ok(())
    }
}
