//! Error domains, derived from the numeric code range

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 0xxx and unassigned ranges
    General,
    /// 1xxx, caller identity
    Auth,
    /// 2xxx, role checks
    Permission,
    /// 4000-4099
    Order,
    /// 4100-4999
    Cart,
    /// 6000-6899, products and categories
    Catalogue,
    /// 6900-6999, stock ledger
    Inventory,
    /// 7xxx
    Table,
    /// 8000-8199, user accounts
    Account,
    /// 8200-8999, notifications and settings
    BackOffice,
    /// 9xxx, never the caller's fault
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code {
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            4000..4100 => Self::Order,
            4100..5000 => Self::Cart,
            6000..6900 => Self::Catalogue,
            6900..7000 => Self::Inventory,
            7000..8000 => Self::Table,
            8000..8200 => Self::Account,
            8200..9000 => Self::BackOffice,
            9000.. => Self::System,
            _ => Self::General,
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
