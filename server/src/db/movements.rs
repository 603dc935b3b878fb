//! Database operations for the movements table.

use sqlx::{PgConnection, PgPool, Row};
use tally_engine::{Movement, MovementKind, Quantity};

/// A stored movement row from the database.
#[derive(Debug)]
pub struct StoredMovement {
    pub id: String,
    pub item_id: String,
    pub kind: String,
    pub magnitude: i64,
    pub reason: Option<String>,
    pub created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredMovement {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredMovement {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            kind: row.try_get("kind")?,
            magnitude: row.try_get("magnitude")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl StoredMovement {
    /// Convert database row to a tally-engine Movement.
    pub fn to_movement(&self) -> Result<Movement, tally_engine::Error> {
        let kind: MovementKind = self.kind.parse()?;
        Ok(Movement {
            id: self.id.clone(),
            item_id: self.item_id.clone(),
            kind,
            magnitude: self.magnitude,
            reason: self.reason.clone(),
            created_at: self.created_at as u64,
        })
    }
}

/// Append a movement to the log.
pub async fn insert_movement(
    conn: &mut PgConnection,
    movement: &Movement,
) -> Result<StoredMovement, sqlx::Error> {
    sqlx::query_as::<_, StoredMovement>(
        r#"
        INSERT INTO movements (id, item_id, kind, magnitude, reason, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, item_id, kind, magnitude, reason, created_at
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.item_id)
    .bind(movement.kind.as_str())
    .bind(movement.magnitude)
    .bind(&movement.reason)
    .bind(movement.created_at as i64)
    .fetch_one(conn)
    .await
}

/// Read a movement and hold its row lock until the transaction ends.
pub async fn lock_movement(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<StoredMovement>, sqlx::Error> {
    sqlx::query_as::<_, StoredMovement>(
        r#"
        SELECT id, item_id, kind, magnitude, reason, created_at
        FROM movements
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Lock every movement of an item, in id order.
///
/// Returns the number of rows locked.
pub async fn lock_item_movements(
    conn: &mut PgConnection,
    item_id: &str,
) -> Result<usize, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id
        FROM movements
        WHERE item_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(item_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.len())
}

/// Overwrite the magnitude and reason of a locked movement.
pub async fn update_movement(
    conn: &mut PgConnection,
    id: &str,
    magnitude: Quantity,
    reason: Option<&str>,
) -> Result<Option<StoredMovement>, sqlx::Error> {
    sqlx::query_as::<_, StoredMovement>(
        r#"
        UPDATE movements
        SET magnitude = $2, reason = $3
        WHERE id = $1
        RETURNING id, item_id, kind, magnitude, reason, created_at
        "#,
    )
    .bind(id)
    .bind(magnitude)
    .bind(reason)
    .fetch_optional(conn)
    .await
}

/// Delete a locked movement.
///
/// Returns whether a row was deleted.
pub async fn delete_movement(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM movements WHERE id = $1"#)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the movements of an item, oldest first.
pub async fn list_movements(
    pool: &PgPool,
    item_id: &str,
) -> Result<Vec<StoredMovement>, sqlx::Error> {
    sqlx::query_as::<_, StoredMovement>(
        r#"
        SELECT id, item_id, kind, magnitude, reason, created_at
        FROM movements
        WHERE item_id = $1
        ORDER BY created_at ASC, seq ASC
        "#,
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
}
