//! PostgreSQL implementation of the storage contracts.
//!
//! Row locks are `SELECT ... FOR UPDATE`; lock waits are bounded per
//! transaction through `lock_timeout`.

use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};
use tally_engine::{error::Result, Correction, Error, Item, Movement, Quantity, Timestamp};

use super::{LedgerStore, UnitOfWork};
use crate::db::{self, StoredMovement};

/// PostgreSQL "lock_not_available" error code.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Ledger backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedger {
    /// Create a ledger over `pool` whose row-lock waits give up after `lock_timeout`.
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

impl LedgerStore for PgLedger {
    type Work = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        Ok(PgUnitOfWork { tx })
    }
}

/// A PostgreSQL transaction.
///
/// Dropping it without `commit` rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork for PgUnitOfWork {
    async fn lock_item(&mut self, id: &str) -> Result<Option<Item>> {
        let stored = db::lock_item(&mut self.tx, id)
            .await
            .map_err(storage_error)?;
        Ok(stored.map(|s| s.to_item()))
    }

    async fn update_quantity(
        &mut self,
        id: &str,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Result<Option<Item>> {
        let stored = db::update_item_quantity(&mut self.tx, id, quantity, timestamp)
            .await
            .map_err(storage_error)?;
        Ok(stored.map(|s| s.to_item()))
    }

    async fn append_movement(&mut self, movement: &Movement) -> Result<Movement> {
        let stored = db::insert_movement(&mut self.tx, movement)
            .await
            .map_err(storage_error)?;
        decode_movement(&stored)
    }

    async fn lock_movement(&mut self, id: &str) -> Result<Option<Movement>> {
        let stored = db::lock_movement(&mut self.tx, id)
            .await
            .map_err(storage_error)?;
        stored.as_ref().map(decode_movement).transpose()
    }

    async fn update_movement(
        &mut self,
        id: &str,
        correction: &Correction,
    ) -> Result<Option<Movement>> {
        let stored = db::update_movement(
            &mut self.tx,
            id,
            correction.magnitude,
            correction.reason.as_deref(),
        )
        .await
        .map_err(storage_error)?;
        stored.as_ref().map(decode_movement).transpose()
    }

    async fn delete_movement(&mut self, id: &str) -> Result<bool> {
        db::delete_movement(&mut self.tx, id)
            .await
            .map_err(storage_error)
    }

    async fn lock_item_movements(&mut self, item_id: &str) -> Result<usize> {
        db::lock_item_movements(&mut self.tx, item_id)
            .await
            .map_err(storage_error)
    }

    async fn delete_item(&mut self, id: &str) -> Result<bool> {
        db::delete_item(&mut self.tx, id)
            .await
            .map_err(storage_error)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(storage_error)
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(storage_error)
    }
}

fn decode_movement(stored: &StoredMovement) -> Result<Movement> {
    stored.to_movement().map_err(|e| {
        tracing::error!(movement_id = %stored.id, "Corrupt movement row: {}", e);
        Error::TransactionFailed(format!("corrupt movement row {}", stored.id))
    })
}

/// Map a storage error into the engine's failure taxonomy.
fn storage_error(e: sqlx::Error) -> Error {
    if is_lock_timeout(&e) {
        tracing::warn!("Gave up waiting for a row lock: {}", e);
        return Error::TransactionFailed("timed out waiting for row lock".to_string());
    }
    tracing::error!("Storage error inside unit of work: {:?}", e);
    Error::TransactionFailed(e.to_string())
}

/// Check if a SQL error is a lock wait timeout.
fn is_lock_timeout(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        db_err
            .code()
            .map(|c| c == LOCK_NOT_AVAILABLE)
            .unwrap_or(false)
    } else {
        false
    }
}
