//! Setting Model

use serde::{Deserialize, Serialize};

/// Well-known setting keys
pub mod keys {
    pub const RESTAURANT_NAME: &str = "restaurant_name";
    pub const LOW_STOCK_ALERTS: &str = "low_stock_alerts";
    pub const ALLOW_CUSTOMER_CANCEL: &str = "allow_customer_cancel";

    /// Keys readable without identity
    pub const PUBLIC: [&str; 1] = [RESTAURANT_NAME];
}

/// Key/value setting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}

impl Setting {
    /// `"true"`, `"1"`, `"yes"` and `"on"` read as enabled
    pub fn as_bool(&self) -> bool {
        matches!(
            self.value.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    }
}

/// Update setting payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub value: String,
}
