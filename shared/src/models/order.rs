//! Order Model

use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human readable number, `YYYYMMDD-XXXX`
    pub order_number: String,
    /// Customer who placed the order
    pub user_id: i64,
    pub table_id: Option<i64>,
    pub status: OrderStatus,
    pub total: f64,
    pub notes: Option<String>,
    /// Staff member who received the order
    pub received_by: Option<i64>,
    pub cancel_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line, price and name are snapshotted at placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
    pub notes: Option<String>,
}

/// Order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Line requested by the customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
}

/// Place order payload. Without `items` the caller's cart is checked out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: Option<i64>,
    pub notes: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
}

/// Order list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i64>,
    pub user_id: Option<i64>,
    /// Only orders still holding a table
    pub active: Option<bool>,
    /// Created at or after (Unix millis)
    pub from: Option<i64>,
    /// Created before (Unix millis)
    pub to: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Staff status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub reason: Option<String>,
}

/// Cancel payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCancel {
    pub reason: Option<String>,
}

/// Move an order to another table, or detach it with `null`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTableMove {
    pub table_id: Option<i64>,
}
