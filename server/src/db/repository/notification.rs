//! Notification Repository
//!
//! A user sees notifications addressed to them plus those addressed to the
//! audience their role belongs to (`STAFF` for staff and admins, `ADMIN`
//! for admins). Audience notifications share one read flag.

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Notification, UserRole};
use sqlx::SqlitePool;

const VISIBLE: &str = "(user_id = ?1 OR (audience = 'STAFF' AND ?2 >= 1) OR (audience = 'ADMIN' AND ?2 >= 2))";

fn rank(role: UserRole) -> i64 {
    match role {
        UserRole::Customer => 0,
        UserRole::Staff => 1,
        UserRole::Admin => 2,
    }
}

pub async fn insert(pool: &SqlitePool, notification: &Notification) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO notification (id, user_id, audience, kind, title, message, order_id, is_read, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(notification.id)
    .bind(notification.user_id)
    .bind(notification.audience)
    .bind(&notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.order_id)
    .bind(notification.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_visible(
    pool: &SqlitePool,
    user_id: i64,
    role: UserRole,
    unread_only: bool,
    limit: i64,
) -> RepoResult<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(&format!(
        "SELECT id, user_id, audience, kind, title, message, order_id, is_read, created_at FROM notification WHERE {VISIBLE} AND (?3 = 0 OR is_read = 0) ORDER BY created_at DESC, id DESC LIMIT ?4"
    ))
    .bind(user_id)
    .bind(rank(role))
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(notifications)
}

pub async fn count_unread(pool: &SqlitePool, user_id: i64, role: UserRole) -> RepoResult<i64> {
    let count = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM notification WHERE {VISIBLE} AND is_read = 0"
    ))
    .bind(user_id)
    .bind(rank(role))
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn mark_read(pool: &SqlitePool, id: i64, user_id: i64, role: UserRole) -> RepoResult<()> {
    let rows = sqlx::query(&format!(
        "UPDATE notification SET is_read = 1 WHERE id = ?3 AND {VISIBLE}"
    ))
    .bind(user_id)
    .bind(rank(role))
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::NotificationNotFound,
            format!("Notification {id} not found"),
        ));
    }
    Ok(())
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: i64, role: UserRole) -> RepoResult<u64> {
    let rows = sqlx::query(&format!(
        "UPDATE notification SET is_read = 1 WHERE is_read = 0 AND {VISIBLE}"
    ))
    .bind(user_id)
    .bind(rank(role))
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}
