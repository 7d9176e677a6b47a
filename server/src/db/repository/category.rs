//! Category Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<Category>> {
    let sql = if include_inactive {
        "SELECT id, name, description, sort_order, is_active FROM category ORDER BY sort_order, name"
    } else {
        "SELECT id, name, description, sort_order, is_active FROM category WHERE is_active = 1 ORDER BY sort_order, name"
    };
    let categories = sqlx::query_as::<_, Category>(sql).fetch_all(pool).await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, sort_order, is_active FROM category WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, sort_order, is_active FROM category WHERE name = ? LIMIT 1",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    if find_by_name(pool, &data.name).await?.is_some() {
        return Err(RepoError::Business(
            ErrorCode::CategoryNameExists,
            format!("Category '{}' already exists", data.name.trim()),
        ));
    }

    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO category (id, name, description, sort_order, is_active) VALUES (?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.sort_order.unwrap_or(0))
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    if let Some(name) = &data.name
        && let Some(found) = find_by_name(pool, name).await?
        && found.id != id
    {
        return Err(RepoError::Business(
            ErrorCode::CategoryNameExists,
            format!("Category '{}' already exists", name.trim()),
        ));
    }

    let rows = sqlx::query(
        "UPDATE category SET name = COALESCE(?1, name), description = COALESCE(?2, description), sort_order = COALESCE(?3, sort_order), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if products > 0 {
        return Err(RepoError::Business(
            ErrorCode::CategoryHasProducts,
            format!("Category {id} still has {products} products"),
        ));
    }

    let rows = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
}
