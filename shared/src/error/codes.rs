//! Unified error codes for the Lanchonete POS
//!
//! This module defines all error codes used across the server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order and cart errors
//! - 6xxx: Product, category and inventory errors
//! - 7xxx: Table errors
//! - 8xxx: User, notification and settings errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Caller identity missing or unknown
    NotAuthenticated = 1001,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Staff role required
    StaffRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4004,
    /// Order is empty
    OrderEmpty = 4007,
    /// Status change is not allowed from the current status
    InvalidStatusTransition = 4008,
    /// Order is no longer active
    OrderNotActive = 4009,
    /// Caller may not cancel this order
    CancelNotAllowed = 4010,
    /// Cart item not found
    CartItemNotFound = 4101,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Not enough stock to fulfil the request
    ProductOutOfStock = 6003,
    /// Product is not available for ordering
    ProductUnavailable = 6004,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category has products
    CategoryHasProducts = 6102,
    /// Category name already exists
    CategoryNameExists = 6103,
    /// Product does not track stock
    StockNotTracked = 6901,
    /// Invalid stock movement quantity
    InvalidStockQuantity = 6902,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table number already exists
    TableNumberExists = 7003,
    /// Table is inactive
    TableInactive = 7005,
    /// Table has active orders
    TableHasOrders = 7104,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// User email already exists
    UserEmailExists = 8002,
    /// Cannot delete self
    UserCannotDeleteSelf = 8003,
    /// Notification not found
    NotificationNotFound = 8201,
    /// Setting not found
    SettingNotFound = 8301,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// System busy (database locked, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::StaffRequired => "Staff role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",
            ErrorCode::OrderNotActive => "Order is no longer active",
            ErrorCode::CancelNotAllowed => "Order cannot be cancelled by this user",
            ErrorCode::CartItemNotFound => "Cart item not found",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has associated products",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::StockNotTracked => "Product does not track stock",
            ErrorCode::InvalidStockQuantity => "Invalid stock quantity",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::TableInactive => "Table is inactive",
            ErrorCode::TableHasOrders => "Table has active orders",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserEmailExists => "Email is already registered",
            ErrorCode::UserCannotDeleteSelf => "Cannot delete your own account",
            ErrorCode::NotificationNotFound => "Notification not found",
            ErrorCode::SettingNotFound => "Setting not found",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::SystemBusy => "System is busy, please retry",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::StaffRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::InvalidStatusTransition),
            4009 => Ok(ErrorCode::OrderNotActive),
            4010 => Ok(ErrorCode::CancelNotAllowed),
            4101 => Ok(ErrorCode::CartItemNotFound),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductUnavailable),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6103 => Ok(ErrorCode::CategoryNameExists),
            6901 => Ok(ErrorCode::StockNotTracked),
            6902 => Ok(ErrorCode::InvalidStockQuantity),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7003 => Ok(ErrorCode::TableNumberExists),
            7005 => Ok(ErrorCode::TableInactive),
            7104 => Ok(ErrorCode::TableHasOrders),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UserEmailExists),
            8003 => Ok(ErrorCode::UserCannotDeleteSelf),
            8201 => Ok(ErrorCode::NotificationNotFound),
            8301 => Ok(ErrorCode::SettingNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
