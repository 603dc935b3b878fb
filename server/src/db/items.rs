//! Database operations for the items table.

use sqlx::{PgConnection, PgPool, Row};
use tally_engine::{Item, Quantity, Timestamp};

/// A stored item row from the database.
#[derive(Debug)]
pub struct StoredItem {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub quantity: i64,
    pub minimum: Option<i64>,
    pub updated_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredItem {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredItem {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            unit: row.try_get("unit")?,
            quantity: row.try_get("quantity")?,
            minimum: row.try_get("minimum")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredItem {
    /// Convert database row to a tally-engine Item.
    pub fn to_item(&self) -> Item {
        Item {
            id: self.id.clone(),
            name: self.name.clone(),
            unit: self.unit.clone(),
            quantity: self.quantity,
            minimum: self.minimum,
            updated_at: self.updated_at as u64,
        }
    }
}

/// Insert a newly registered item.
pub async fn insert_item(pool: &PgPool, item: &Item) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO items (id, name, unit, quantity, minimum, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&item.id)
    .bind(&item.name)
    .bind(&item.unit)
    .bind(item.quantity)
    .bind(item.minimum)
    .bind(item.updated_at as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get an item by ID without locking it.
pub async fn get_item(pool: &PgPool, id: &str) -> Result<Option<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        r#"
        SELECT id, name, unit, quantity, minimum, updated_at
        FROM items
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Get all items ordered by name.
pub async fn list_items(pool: &PgPool) -> Result<Vec<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        r#"
        SELECT id, name, unit, quantity, minimum, updated_at
        FROM items
        ORDER BY name ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Delete a locked item; its movements go with it.
///
/// Returns whether a row was deleted.
pub async fn delete_item(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM items WHERE id = $1"#)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Read an item and hold its row lock until the transaction ends.
pub async fn lock_item(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        r#"
        SELECT id, name, unit, quantity, minimum, updated_at
        FROM items
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Persist a new quantity for a locked item.
pub async fn update_item_quantity(
    conn: &mut PgConnection,
    id: &str,
    quantity: Quantity,
    timestamp: Timestamp,
) -> Result<Option<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        r#"
        UPDATE items
        SET quantity = $2, updated_at = $3
        WHERE id = $1
        RETURNING id, name, unit, quantity, minimum, updated_at
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(timestamp as i64)
    .fetch_optional(conn)
    .await
}
