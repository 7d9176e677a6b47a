//! Data models
//!
//! Shared between the server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, timestamps are Unix millis.

pub mod cart;
pub mod category;
pub mod dining_table;
pub mod notification;
pub mod order;
pub mod product;
pub mod setting;
pub mod stock;
pub mod user;

// Re-exports
pub use cart::*;
pub use category::*;
pub use dining_table::*;
pub use notification::{Notification, NotificationAudience, NotificationQuery};
pub use order::*;
pub use product::*;
pub use setting::{Setting, SettingUpdate};
pub use stock::*;
pub use user::*;
