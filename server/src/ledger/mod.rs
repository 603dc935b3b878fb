//! Storage contracts and the async reconciliation service.
//!
//! The service never touches SQL directly. It opens a [`UnitOfWork`] from a
//! [`LedgerStore`], locks rows through it, asks `tally_engine` for the
//! quantity transition, writes the result, and commits. Any failure rolls the
//! whole unit back.

mod postgres;
mod service;

#[cfg(test)]
mod memory;

use std::future::Future;

use tally_engine::{error::Result, Correction, Item, Movement, Quantity, Timestamp};

pub use postgres::PgLedger;
pub use service::StockService;

#[cfg(test)]
pub use memory::MemoryLedger;

/// Source of units of work.
pub trait LedgerStore: Send + Sync {
    type Work: UnitOfWork;

    /// Open a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Work>> + Send;
}

/// An atomic, all-or-nothing group of reads and writes.
///
/// `lock_item` and `lock_movement` take an exclusive row lock that is held
/// until `commit` or `rollback`. A concurrent unit of work asking for the same
/// row waits, bounded by the store's lock timeout. Rows that do not exist at
/// lock time are reported as `None`.
///
/// Movement rows are always locked before the item row they belong to.
pub trait UnitOfWork: Send {
    /// Read an item and lock its row.
    fn lock_item(&mut self, id: &str) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Persist a new quantity for a locked item.
    fn update_quantity(
        &mut self,
        id: &str,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Append a movement to the log.
    fn append_movement(
        &mut self,
        movement: &Movement,
    ) -> impl Future<Output = Result<Movement>> + Send;

    /// Read a movement and lock its row.
    fn lock_movement(&mut self, id: &str)
        -> impl Future<Output = Result<Option<Movement>>> + Send;

    /// Overwrite magnitude and reason of a locked movement.
    fn update_movement(
        &mut self,
        id: &str,
        correction: &Correction,
    ) -> impl Future<Output = Result<Option<Movement>>> + Send;

    /// Delete a locked movement. Returns whether it existed.
    fn delete_movement(&mut self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Lock every movement of an item. Returns how many were locked.
    fn lock_item_movements(&mut self, item_id: &str)
        -> impl Future<Output = Result<usize>> + Send;

    /// Delete a locked item and its movements. Returns whether it existed.
    fn delete_item(&mut self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Make every write of this unit visible and release its locks.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    /// Discard every write of this unit and release its locks.
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
