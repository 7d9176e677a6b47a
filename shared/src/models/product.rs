//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    /// Plain URL, images are hosted elsewhere
    pub image_url: Option<String>,
    pub is_available: bool,
    /// When false, stock columns are informational only
    pub track_stock: bool,
    pub stock_quantity: i64,
    pub min_stock: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.track_stock && self.stock_quantity <= self.min_stock
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub track_stock: Option<bool>,
    pub stock_quantity: Option<i64>,
    pub min_stock: Option<i64>,
}

/// Update product payload
///
/// Stock quantity is not editable here; it only changes through stock movements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub track_stock: Option<bool>,
    pub min_stock: Option<i64>,
}

/// Product list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
}
