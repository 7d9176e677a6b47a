use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Bootstrap and run-loop errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        ServerError::Database(err.message)
    }
}

impl From<RepoError> for ServerError {
    fn from(err: RepoError) -> Self {
        ServerError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
