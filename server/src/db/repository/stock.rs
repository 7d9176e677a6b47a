//! Stock Movement Repository

use super::{RepoResult, page};
use shared::models::{StockMovement, StockMovementQuery};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

pub async fn insert(conn: &mut SqliteConnection, movement: &StockMovement) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stock_movement (id, product_id, movement_type, quantity, previous_quantity, new_quantity, reason, order_id, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(movement.id)
    .bind(movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.previous_quantity)
    .bind(movement.new_quantity)
    .bind(&movement.reason)
    .bind(movement.order_id)
    .bind(movement.user_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Movements, newest first
pub async fn find_all(
    pool: &SqlitePool,
    query: &StockMovementQuery,
) -> RepoResult<Vec<StockMovement>> {
    let (limit, offset) = page(query.limit, query.offset);
    let movements = sqlx::query_as::<_, StockMovement>(
        "SELECT id, product_id, movement_type, quantity, previous_quantity, new_quantity, reason, order_id, user_id, created_at FROM stock_movement WHERE (?1 IS NULL OR product_id = ?1) ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(query.product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(movements)
}

/// Ledger entries written for an order
pub async fn find_by_order(
    db: impl SqliteExecutor<'_>,
    order_id: i64,
) -> RepoResult<Vec<StockMovement>> {
    let movements = sqlx::query_as::<_, StockMovement>(
        "SELECT id, product_id, movement_type, quantity, previous_quantity, new_quantity, reason, order_id, user_id, created_at FROM stock_movement WHERE order_id = ? ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(movements)
}
