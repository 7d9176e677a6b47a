//! Dining Table Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy status of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum TableStatus {
    /// Free
    #[default]
    Livre,
    /// Occupied
    Ocupada,
}

impl TableStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Livre => "LIVRE",
            TableStatus::Ocupada => "OCUPADA",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub number: i32,
    pub name: Option<String>,
    pub capacity: i32,
    pub status: TableStatus,
    /// User holding the table (customer of the latest active order)
    pub assigned_to: Option<i64>,
    pub is_active: bool,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i32,
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

/// Update dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<i32>,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

/// Manual status change by staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
    pub assigned_to: Option<i64>,
}

/// Table with the number of orders currently holding it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TableOverview {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub table: DiningTable,
    pub active_orders: i64,
}
