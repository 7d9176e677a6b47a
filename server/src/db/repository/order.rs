//! Order Repository

use super::{RepoError, RepoResult, page};
use shared::error::ErrorCode;
use shared::models::{Order, OrderItem, OrderQuery};
use shared::order::OrderStatus;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, order_number, user_id, table_id, status, total, notes, received_by, cancel_reason, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit_price, quantity, line_total, notes";

pub async fn find_by_id(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(order)
}

pub async fn find_items(db: impl SqliteExecutor<'_>, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(items)
}

/// Filtered listing, newest first
pub async fn find_all(pool: &SqlitePool, query: &OrderQuery) -> RepoResult<Vec<Order>> {
    let (limit, offset) = page(query.limit, query.offset);
    let active_filter = match query.active {
        Some(true) => format!("AND status IN {}", super::dining_table::ACTIVE_STATUS_SQL),
        Some(false) => format!("AND status NOT IN {}", super::dining_table::ACTIVE_STATUS_SQL),
        None => String::new(),
    };
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR table_id = ?2) AND (?3 IS NULL OR user_id = ?3) AND (?4 IS NULL OR created_at >= ?4) AND (?5 IS NULL OR created_at < ?5) {active_filter} ORDER BY created_at DESC, id DESC LIMIT ?6 OFFSET ?7"
    ))
    .bind(query.status)
    .bind(query.table_id)
    .bind(query.user_id)
    .bind(query.from)
    .bind(query.to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Next `NNNN` for order numbers of `day` (`YYYYMMDD`), 1 for the first order
pub async fn next_daily_sequence(conn: &mut SqliteConnection, day: &str) -> RepoResult<i64> {
    let last: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(CAST(substr(order_number, 10) AS INTEGER)), 0) FROM orders WHERE order_number LIKE ? || '-%'",
    )
    .bind(day)
    .fetch_one(&mut *conn)
    .await?;
    Ok(last + 1)
}

pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, table_id, status, total, notes, received_by, cancel_reason, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.table_id)
    .bind(order.status)
    .bind(order.total)
    .bind(&order.notes)
    .bind(order.received_by)
    .bind(&order.cancel_reason)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, product_id, product_name, unit_price, quantity, line_total, notes) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.line_total)
    .bind(&item.notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Compare-and-set status change.
///
/// Only applies when the row is still in `from`, so a concurrent change
/// made between read and write is reported instead of overwritten.
pub async fn transition(
    conn: &mut SqliteConnection,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(to)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(from)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::InvalidStatusTransition,
            format!("Order {id} is no longer {from}"),
        ));
    }
    Ok(())
}

pub async fn set_received_by(
    conn: &mut SqliteConnection,
    id: i64,
    staff_id: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET received_by = ? WHERE id = ?")
        .bind(staff_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_cancel_reason(
    conn: &mut SqliteConnection,
    id: i64,
    reason: Option<&str>,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET cancel_reason = ? WHERE id = ?")
        .bind(reason)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn set_table(
    conn: &mut SqliteConnection,
    id: i64,
    table_id: Option<i64>,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE orders SET table_id = ?, updated_at = ? WHERE id = ?")
        .bind(table_id)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub(crate) fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::OrderNotFound, format!("Order {id} not found"))
}
