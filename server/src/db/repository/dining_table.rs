//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableOverview, TableStatus};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, number, name, capacity, status, assigned_to, is_active";

/// Active statuses as a SQL list, keep in sync with `OrderStatus::ACTIVE`
pub(crate) const ACTIVE_STATUS_SQL: &str = "('PENDENTE', 'CONFIRMADO', 'PREPARANDO', 'PRONTO')";

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<DiningTable>> {
    let filter = if include_inactive { "" } else { "WHERE is_active = 1" };
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table {filter} ORDER BY number"
    ))
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_id(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

pub async fn find_by_number(pool: &SqlitePool, number: i32) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE number = ? LIMIT 1"
    ))
    .bind(number)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

/// Active tables with the number of orders holding each one
pub async fn overview(pool: &SqlitePool) -> RepoResult<Vec<TableOverview>> {
    let rows = sqlx::query_as::<_, TableOverview>(&format!(
        "SELECT t.id, t.number, t.name, t.capacity, t.status, t.assigned_to, t.is_active, \
         (SELECT COUNT(*) FROM orders o WHERE o.table_id = t.id AND o.status IN {ACTIVE_STATUS_SQL}) AS active_orders \
         FROM dining_table t WHERE t.is_active = 1 ORDER BY t.number"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    if find_by_number(pool, data.number).await?.is_some() {
        return Err(number_exists(data.number));
    }

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO dining_table (id, number, name, capacity, status, assigned_to, is_active) VALUES (?, ?, ?, ?, 'LIVRE', NULL, 1)",
    )
    .bind(id)
    .bind(data.number)
    .bind(&data.name)
    .bind(data.capacity.unwrap_or(4))
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: DiningTableUpdate,
) -> RepoResult<DiningTable> {
    if let Some(number) = data.number
        && let Some(found) = find_by_number(pool, number).await?
        && found.id != id
    {
        return Err(number_exists(number));
    }

    let rows = sqlx::query(
        "UPDATE dining_table SET number = COALESCE(?1, number), name = COALESCE(?2, name), capacity = COALESCE(?3, capacity), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(data.number)
    .bind(&data.name)
    .bind(data.capacity)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Delete a table. Rejected while orders still hold it; tables with order
/// history are deactivated instead of removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let mut conn = pool.acquire().await?;
    let active = count_active_orders(&mut conn, id).await?;
    if active > 0 {
        return Err(RepoError::Business(
            ErrorCode::TableHasOrders,
            format!("Table {id} has {active} active orders"),
        ));
    }

    let history: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE table_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    let sql = if history > 0 {
        "UPDATE dining_table SET is_active = 0, status = 'LIVRE', assigned_to = NULL WHERE id = ?"
    } else {
        "DELETE FROM dining_table WHERE id = ?"
    };
    let rows = sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    Ok(rows.rows_affected() > 0)
}

// ── Occupancy ──────────────────────────────────────────────────────

pub async fn count_active_orders(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM orders WHERE table_id = ? AND status IN {ACTIVE_STATUS_SQL}"
    ))
    .bind(table_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

/// Customer of the most recently created active order on the table
pub async fn latest_active_customer(
    conn: &mut SqliteConnection,
    table_id: i64,
) -> RepoResult<Option<i64>> {
    let user_id = sqlx::query_scalar(&format!(
        "SELECT user_id FROM orders WHERE table_id = ? AND status IN {ACTIVE_STATUS_SQL} ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .bind(table_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user_id)
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    table_id: i64,
    status: TableStatus,
    assigned_to: Option<i64>,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE dining_table SET status = ?, assigned_to = ? WHERE id = ?")
        .bind(status)
        .bind(assigned_to)
        .bind(table_id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(table_id));
    }
    Ok(())
}

fn number_exists(number: i32) -> RepoError {
    RepoError::Business(
        ErrorCode::TableNumberExists,
        format!("Table number {number} already exists"),
    )
}

pub(crate) fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::TableNotFound, format!("Table {id} not found"))
}

/// Occupied tables and active orders across the floor
pub async fn floor_summary(pool: &SqlitePool) -> RepoResult<(i64, i64)> {
    let summary = sqlx::query_as::<_, (i64, i64)>(&format!(
        "SELECT (SELECT COUNT(*) FROM dining_table WHERE is_active = 1 AND status = 'OCUPADA'), \
         (SELECT COUNT(*) FROM orders WHERE status IN {ACTIVE_STATUS_SQL})"
    ))
    .fetch_one(pool)
    .await?;
    Ok(summary)
}
