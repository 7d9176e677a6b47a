//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::CartItemNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::TableNotFound
            | Self::UserNotFound
            | Self::NotificationNotFound
            | Self::SettingNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderAlreadyCompleted
            | Self::OrderAlreadyCancelled
            | Self::InvalidStatusTransition
            | Self::OrderNotActive
            | Self::CategoryNameExists
            | Self::CategoryHasProducts
            | Self::TableNumberExists
            | Self::TableHasOrders
            | Self::UserEmailExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::StaffRequired
            | Self::AdminRequired
            | Self::CancelNotAllowed
            | Self::UserCannotDeleteSelf => StatusCode::FORBIDDEN,

            // 422 Unprocessable (request is well formed but the business state refuses it)
            Self::ProductOutOfStock
            | Self::ProductUnavailable
            | Self::StockNotTracked
            | Self::TableInactive
            | Self::OrderEmpty => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
