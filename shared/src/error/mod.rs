//! Unified error system
//!
//! This module provides the error handling system shared by the server and
//! its clients:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::TableNotFound);
//!
//! let err = AppError::with_message(ErrorCode::ProductOutOfStock, "Only 2 left")
//!     .with_detail("product_id", 42);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(6003));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
