//! Setting Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::Setting;
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Setting>> {
    let settings =
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM setting ORDER BY key")
            .fetch_all(pool)
            .await?;
    Ok(settings)
}

pub async fn find(pool: &SqlitePool, key: &str) -> RepoResult<Option<Setting>> {
    let setting = sqlx::query_as::<_, Setting>(
        "SELECT key, value, updated_at FROM setting WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;
    Ok(setting)
}

/// Boolean flag, `default` when the key is missing
pub async fn get_bool(pool: &SqlitePool, key: &str, default: bool) -> RepoResult<bool> {
    Ok(find(pool, key).await?.map(|s| s.as_bool()).unwrap_or(default))
}

/// Update an existing key, unknown keys are rejected
pub async fn update(pool: &SqlitePool, key: &str, value: &str) -> RepoResult<Setting> {
    let rows = sqlx::query("UPDATE setting SET value = ?, updated_at = ? WHERE key = ?")
        .bind(value)
        .bind(shared::util::now_millis())
        .bind(key)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(key));
    }
    find(pool, key).await?.ok_or_else(|| not_found(key))
}

fn not_found(key: &str) -> RepoError {
    RepoError::Business(ErrorCode::SettingNotFound, format!("Setting '{key}' not found"))
}
