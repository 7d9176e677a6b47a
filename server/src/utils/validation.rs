//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use crate::utils::AppError;
use shared::error::ErrorCode;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, table, user
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons (order note, cancel reason, stock reason)
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Image URLs
pub const MAX_URL_LEN: usize = 2048;

/// Setting values
pub const MAX_SETTING_LEN: usize = 1000;

// ── Numeric limits ──────────────────────────────────────────────────

/// Maximum allowed unit price
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum quantity per order line or cart line
pub const MAX_QUANTITY: i64 = 9999;

/// Maximum lines per order
pub const MAX_ORDER_LINES: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal shape check, the address is only used as a lookup key
pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !value.contains(' ') =>
        {
            Ok(())
        }
        _ => Err(AppError::validation(format!("invalid email address: {value}"))),
    }
}

/// Price must be finite, non-negative and at most [`MAX_PRICE`]
pub fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price must be a non-negative finite number, got {price}"),
        ));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("price exceeds maximum allowed ({MAX_PRICE}), got {price}"),
        ));
    }
    Ok(())
}

/// Line quantity must be in `1..=MAX_QUANTITY`
pub fn validate_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}
