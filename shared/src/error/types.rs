//! `AppError` and the JSON error envelope

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by every fallible server operation.
///
/// The code decides the HTTP status; `details` carries machine readable
/// context such as the product that ran out or the rejected transition.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Unique constraint hit
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }
}

/// Error body written for every failed request:
///
/// ```json
/// { "code": 6003, "message": "Only 2 left", "details": { "product_id": 42 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "Request failed with a system error"
            );
        }
        let body = ApiResponse::<()>::error(&self);
        (self.http_status(), axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_comes_from_the_code() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::new(ErrorCode::InvalidStatusTransition)
            .with_detail("from", "PENDENTE")
            .with_detail("to", "ENTREGUE");

        let details = err.details.unwrap();
        assert_eq!(details["from"], "PENDENTE");
        assert_eq!(details["to"], "ENTREGUE");
    }

    #[test]
    fn test_envelope_carries_code_and_details() {
        let err = AppError::with_message(ErrorCode::TableHasOrders, "Table 3 has 2 active orders")
            .with_detail("active_orders", 2);
        let json = serde_json::to_value(ApiResponse::<()>::error(&err)).unwrap();

        assert_eq!(json["code"], 7104);
        assert_eq!(json["message"], "Table 3 has 2 active orders");
        assert_eq!(json["details"]["active_orders"], 2);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_into_response_uses_code_status() {
        use axum::response::IntoResponse;
        assert_eq!(
            AppError::new(ErrorCode::ProductOutOfStock).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::not_authenticated().into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
