//! Repository Module
//!
//! Free async functions over SQLite. Single-statement reads and writes take
//! any [`sqlx::SqliteExecutor`] so they run on the pool or inside a
//! transaction (`&mut *tx`); multi-statement writes take `&mut SqliteConnection`.

pub mod cart;
pub mod category;
pub mod dining_table;
pub mod notification;
pub mod order;
pub mod product;
pub mod setting;
pub mod stock;
pub mod user;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Domain rule violation carrying its specific error code
    #[error("{1}")]
    Business(ErrorCode, String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepoError::Validation(format!(
                    "Referenced record missing or in use: {}",
                    db.message()
                ))
            }
            sqlx::Error::Database(db) if db.is_check_violation() => {
                RepoError::Validation(db.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) => {
                if msg.contains("database is locked") {
                    AppError::with_message(ErrorCode::SystemBusy, msg)
                } else {
                    AppError::database(msg)
                }
            }
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Business(code, msg) => AppError::with_message(code, msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Clamp client supplied paging
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(50).clamp(1, 500),
        offset.unwrap_or(0).max(0),
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_error_keeps_code() {
        let err: AppError =
            RepoError::Business(ErrorCode::TableHasOrders, "Table 4 has 2 active orders".into())
                .into();
        assert_eq!(err.code, ErrorCode::TableHasOrders);
        assert_eq!(err.message, "Table 4 has 2 active orders");
    }

    #[test]
    fn test_locked_database_maps_to_busy() {
        let err: AppError = RepoError::Database("database is locked".into()).into();
        assert_eq!(err.code, ErrorCode::SystemBusy);
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_already_exists() {
        let pool = testing::pool().await;
        let insert = "INSERT INTO dining_table (id, number) VALUES (?, 9)";
        sqlx::query(insert).bind(1_i64).execute(&pool).await.unwrap();
        let repo_err: RepoError = sqlx::query(insert)
            .bind(2_i64)
            .execute(&pool)
            .await
            .unwrap_err()
            .into();

        assert!(matches!(repo_err, RepoError::Duplicate(_)));
        let err: AppError = repo_err.into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page(None, None), (50, 0));
        assert_eq!(page(Some(0), Some(-3)), (1, 0));
        assert_eq!(page(Some(10_000), Some(20)), (500, 20));
    }
}
