//! User Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{User, UserCreate, UserRole, UserUpdate};
use sqlx::{SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, name, email, role, is_active, created_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM user ORDER BY role, name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM user WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM user WHERE email = ? LIMIT 1"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let email = data.email.trim().to_string();
    if find_by_email(pool, &email).await?.is_some() {
        return Err(RepoError::Business(
            ErrorCode::UserEmailExists,
            format!("User with email '{email}' already exists"),
        ));
    }

    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO user (id, name, email, role, is_active, created_at) VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&email)
    .bind(data.role.unwrap_or(UserRole::Customer))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    if let Some(email) = &data.email
        && let Some(found) = find_by_email(pool, email).await?
        && found.id != id
    {
        return Err(RepoError::Business(
            ErrorCode::UserEmailExists,
            format!("User with email '{}' already exists", email.trim()),
        ));
    }

    let rows = sqlx::query(
        "UPDATE user SET name = COALESCE(?1, name), email = COALESCE(?2, email), role = COALESCE(?3, role), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.email.as_deref().map(str::trim))
    .bind(data.role)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::UserNotFound,
            format!("User {id} not found"),
        ));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Business(ErrorCode::UserNotFound, format!("User {id} not found")))
}

/// Deactivate a user. Rows stay because orders and stock movements reference them.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE user SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::testing;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = testing::pool().await;
        let user = testing::user(&pool, "ana@example.com", UserRole::Staff).await;

        assert_eq!(user.role, UserRole::Staff);
        assert!(user.is_active);
        let found = find_by_email(&pool, "ANA@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = testing::pool().await;
        testing::user(&pool, "bia@example.com", UserRole::Customer).await;
        let err = create(
            &pool,
            UserCreate {
                name: "Bia".into(),
                email: "bia@example.com".into(),
                role: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::UserEmailExists, _)));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let pool = testing::pool().await;
        let user = testing::user(&pool, "caio@example.com", UserRole::Customer).await;

        let updated = update(
            &pool,
            user.id,
            UserUpdate {
                role: Some(UserRole::Staff),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.role, UserRole::Staff);
        assert_eq!(updated.email, "caio@example.com");

        assert!(deactivate(&pool, user.id).await.unwrap());
        assert!(!find_by_id(&pool, user.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let pool = testing::pool().await;
        let err = update(&pool, 42, UserUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::UserNotFound, _)));
    }
}
