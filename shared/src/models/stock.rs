//! Stock Movement Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stock ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MovementType {
    /// Stock in
    Entrada,
    /// Stock out
    Saida,
    /// Absolute correction after a count
    Ajuste,
}

impl MovementType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "ENTRADA",
            MovementType::Saida => "SAIDA",
            MovementType::Ajuste => "AJUSTE",
        }
    }

    /// Quantity after applying `quantity` to `current`.
    /// `None` when the result would be negative.
    pub fn apply(&self, current: i64, quantity: i64) -> Option<i64> {
        let next = match self {
            MovementType::Entrada => current.checked_add(quantity)?,
            MovementType::Saida => current.checked_sub(quantity)?,
            MovementType::Ajuste => quantity,
        };
        (next >= 0).then_some(next)
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub reason: Option<String>,
    /// Set when the movement was caused by an order
    pub order_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: i64,
}

/// Manual movement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementCreate {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: Option<String>,
}

/// Movement list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockMovementQuery {
    pub product_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
