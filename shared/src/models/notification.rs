//! Notification Model

use serde::{Deserialize, Serialize};

/// Who a notification is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum NotificationAudience {
    /// A single user (`user_id` is set)
    User,
    /// Every staff member and admin
    Staff,
    /// Admins only
    Admin,
}

/// Notification kinds emitted by the server
pub mod kind {
    pub const NEW_ORDER: &str = "NEW_ORDER";
    pub const ORDER_STATUS: &str = "ORDER_STATUS";
    pub const ORDER_READY: &str = "ORDER_READY";
    pub const ORDER_CANCELLED: &str = "ORDER_CANCELLED";
    pub const LOW_STOCK: &str = "LOW_STOCK";
}

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub audience: NotificationAudience,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
    pub is_read: bool,
    pub created_at: i64,
}

/// Notification list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}
