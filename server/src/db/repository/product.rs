//! Product Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, name, description, price, category_id, image_url, is_available, track_stock, stock_quantity, min_stock, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool, query: &ProductQuery) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM product WHERE (?1 IS NULL OR category_id = ?1) AND (?2 IS NULL OR is_available = ?2) ORDER BY name"
    ))
    .bind(query.category_id)
    .bind(query.available)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Available products of active categories, for the public menu
pub async fn find_orderable(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT p.id, p.name, p.description, p.price, p.category_id, p.image_url, p.is_available, p.track_stock, p.stock_quantity, p.min_stock, p.created_at, p.updated_at FROM product p JOIN category c ON c.id = p.category_id WHERE c.is_active = 1 AND p.is_available = 1 ORDER BY p.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn find_by_id(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product WHERE id = ?");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(product)
}

/// Tracked products at or below their minimum
pub async fn find_low_stock(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {COLUMNS} FROM product WHERE track_stock = 1 AND stock_quantity <= min_stock ORDER BY stock_quantity, name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    ensure_category(pool, data.category_id).await?;
    let stock = data.stock_quantity.unwrap_or(0);
    if stock < 0 {
        return Err(RepoError::Business(
            ErrorCode::InvalidStockQuantity,
            format!("stock_quantity must not be negative, got {stock}"),
        ));
    }

    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO product (id, name, description, price, category_id, image_url, is_available, track_stock, stock_quantity, min_stock, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category_id)
    .bind(&data.image_url)
    .bind(data.is_available.unwrap_or(true))
    .bind(data.track_stock.unwrap_or(false))
    .bind(stock)
    .bind(data.min_stock.unwrap_or(0).max(0))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    if let Some(category_id) = data.category_id {
        ensure_category(pool, category_id).await?;
    }

    let rows = sqlx::query(
        "UPDATE product SET name = COALESCE(?1, name), description = COALESCE(?2, description), price = COALESCE(?3, price), category_id = COALESCE(?4, category_id), image_url = COALESCE(?5, image_url), is_available = COALESCE(?6, is_available), track_stock = COALESCE(?7, track_stock), min_stock = COALESCE(?8, min_stock), updated_at = ?9 WHERE id = ?10",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category_id)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.track_stock)
    .bind(data.min_stock.map(|m| m.max(0)))
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Hard delete. Products already ordered are kept for history and must be
/// made unavailable instead.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let ordered: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_item WHERE product_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if ordered > 0 {
        return Err(RepoError::Validation(format!(
            "Product {id} appears in {ordered} order lines; mark it unavailable instead"
        )));
    }

    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// ── Stock ──────────────────────────────────────────────────────────

/// Take `quantity` units out of stock.
///
/// The guard lives in the `WHERE` clause so two concurrent checkouts can
/// never drive the quantity below zero. Returns the new quantity, or `None`
/// when there was not enough stock.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> RepoResult<Option<i64>> {
    let new_quantity: Option<i64> = sqlx::query_scalar(
        "UPDATE product SET stock_quantity = stock_quantity - ?1, updated_at = ?2 WHERE id = ?3 AND stock_quantity >= ?1 RETURNING stock_quantity",
    )
    .bind(quantity)
    .bind(shared::util::now_millis())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(new_quantity)
}

/// Put `quantity` units back, returns the new quantity
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> RepoResult<i64> {
    let new_quantity: Option<i64> = sqlx::query_scalar(
        "UPDATE product SET stock_quantity = stock_quantity + ?1, updated_at = ?2 WHERE id = ?3 RETURNING stock_quantity",
    )
    .bind(quantity)
    .bind(shared::util::now_millis())
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    new_quantity.ok_or_else(|| not_found(id))
}

/// Overwrite the quantity after a stock count
pub async fn set_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE product SET stock_quantity = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

async fn ensure_category(pool: &SqlitePool, category_id: i64) -> RepoResult<()> {
    if super::category::find_by_id(pool, category_id).await?.is_none() {
        return Err(RepoError::Business(
            ErrorCode::CategoryNotFound,
            format!("Category {category_id} not found"),
        ));
    }
    Ok(())
}

fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::ProductNotFound, format!("Product {id} not found"))
}
