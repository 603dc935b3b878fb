//! Item handlers - registration, lookup, deletion and movement history.

use crate::db;
use crate::error::Result;
use crate::ledger::{LedgerStore, StockService};
use crate::notify::ThresholdNotifier;
use serde::Serialize;
use sqlx::PgPool;
use tally_engine::{Error, Item, Movement, NewItem};

/// PostgreSQL "unique_violation" error code.
const UNIQUE_VIOLATION: &str = "23505";

/// Response for a movement history listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementHistory {
    pub item_id: String,
    /// Movements, oldest first
    pub movements: Vec<Movement>,
}

/// Register a new item with zero quantity.
pub async fn handle_register_item(pool: &PgPool, request: NewItem) -> Result<Item> {
    request.validate()?;

    let id = uuid::Uuid::new_v4().to_string();
    let item = request.into_item(id, chrono::Utc::now().timestamp_millis().max(0) as u64);

    match db::insert_item(pool, &item).await {
        Ok(()) => {}
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            return Err(Error::ItemAlreadyExists(item.id).into());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(item_id = %item.id, name = %item.name, "Item registered");
    Ok(item)
}

/// List every item, ordered by name.
pub async fn handle_list_items(pool: &PgPool) -> Result<Vec<Item>> {
    let stored = db::list_items(pool).await?;
    Ok(stored.iter().map(|s| s.to_item()).collect())
}

/// Fetch a single item.
pub async fn handle_get_item(pool: &PgPool, id: &str) -> Result<Item> {
    let stored = db::get_item(pool, id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(id.to_string()))?;
    Ok(stored.to_item())
}

/// Delete an item together with its movements.
pub async fn handle_delete_item<S: LedgerStore, N: ThresholdNotifier>(
    stock: &StockService<S, N>,
    id: &str,
) -> Result<Item> {
    Ok(stock.remove_item(id).await?)
}

/// List the movements of an item, oldest first.
pub async fn handle_list_movements(pool: &PgPool, item_id: &str) -> Result<MovementHistory> {
    if db::get_item(pool, item_id).await?.is_none() {
        return Err(Error::ItemNotFound(item_id.to_string()).into());
    }

    let stored = db::list_movements(pool, item_id).await?;
    let mut movements = Vec::with_capacity(stored.len());
    for row in &stored {
        match row.to_movement() {
            Ok(movement) => movements.push(movement),
            Err(e) => {
                tracing::warn!("Failed to convert stored movement {}: {}", row.id, e);
            }
        }
    }

    Ok(MovementHistory {
        item_id: item_id.to_string(),
        movements,
    })
}
