//! Cart Model

use serde::{Deserialize, Serialize};

/// Cart entry, one per (user, product)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Cart entry joined with current product data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub notes: Option<String>,
    pub is_available: bool,
    pub line_total: f64,
}

/// The caller's cart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub total: f64,
}

/// Add to cart payload. Adding an existing product increases its quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub product_id: i64,
    pub quantity: Option<i64>,
    pub notes: Option<String>,
}

/// Update cart entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i64,
    pub notes: Option<String>,
}
