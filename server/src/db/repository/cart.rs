//! Cart Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{CartItem, CartLine};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

/// Cart lines joined with current product name and price
pub async fn find_lines(db: impl SqliteExecutor<'_>, user_id: i64) -> RepoResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT c.id, c.product_id, p.name AS product_name, p.price AS unit_price, c.quantity, c.notes, p.is_available, p.price * c.quantity AS line_total FROM cart_item c JOIN product p ON p.id = c.product_id WHERE c.user_id = ? ORDER BY c.created_at, c.id",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(lines)
}

pub async fn find_item(pool: &SqlitePool, user_id: i64, id: i64) -> RepoResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, product_id, quantity, notes, created_at FROM cart_item WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// Add a product, merging into the existing line for the same product
pub async fn add(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
    notes: Option<&str>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cart_item (id, user_id, product_id, quantity, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_item.quantity + excluded.quantity, notes = COALESCE(excluded.notes, cart_item.notes)",
    )
    .bind(shared::util::snowflake_id())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(notes)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    quantity: i64,
    notes: Option<&str>,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE cart_item SET quantity = ?1, notes = COALESCE(?2, notes) WHERE id = ?3 AND user_id = ?4",
    )
    .bind(quantity)
    .bind(notes)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn remove(pool: &SqlitePool, user_id: i64, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub async fn clear(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected())
}

fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::CartItemNotFound, format!("Cart item {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing;
    use shared::models::UserRole;

    #[tokio::test]
    async fn test_add_merges_same_product() {
        let pool = testing::pool().await;
        let user = testing::user(&pool, "cliente@example.com", UserRole::Customer).await;
        let category = testing::category(&pool, "Lanches").await;
        let burger = testing::product(&pool, category.id, "X-Bacon", 21.5, None).await;

        add(&pool, user.id, burger.id, 1, None).await.unwrap();
        add(&pool, user.id, burger.id, 2, Some("sem cebola")).await.unwrap();

        let lines = find_lines(&pool, user.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].notes.as_deref(), Some("sem cebola"));
        assert!((lines[0].line_total - 64.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_owner() {
        let pool = testing::pool().await;
        let ana = testing::user(&pool, "ana@example.com", UserRole::Customer).await;
        let rui = testing::user(&pool, "rui@example.com", UserRole::Customer).await;
        let category = testing::category(&pool, "Lanches").await;
        let burger = testing::product(&pool, category.id, "X-Tudo", 25.0, None).await;

        add(&pool, ana.id, burger.id, 1, None).await.unwrap();
        let line = find_lines(&pool, ana.id).await.unwrap().remove(0);

        let err = remove(&pool, rui.id, line.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::CartItemNotFound, _)));
        assert!(find_item(&pool, rui.id, line.id).await.unwrap().is_none());

        update(&pool, ana.id, line.id, 4, None).await.unwrap();
        assert_eq!(find_item(&pool, ana.id, line.id).await.unwrap().unwrap().quantity, 4);

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(clear(&mut conn, ana.id).await.unwrap(), 1);
    }
}
