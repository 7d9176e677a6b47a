//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a user account. Ordered: `Customer < Staff < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum UserRole {
    #[default]
    Customer,
    Staff,
    Admin,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "CUSTOMER",
            UserRole::Staff => "STAFF",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Staff and admins work the floor
    pub fn is_staff(&self) -> bool {
        *self >= UserRole::Staff
    }

    pub fn is_admin(&self) -> bool {
        *self == UserRole::Admin
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: Option<UserRole>,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Customer < UserRole::Staff);
        assert!(UserRole::Staff < UserRole::Admin);
        assert!(UserRole::Admin.is_staff());
        assert!(!UserRole::Customer.is_staff());
        assert!(!UserRole::Staff.is_admin());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(
            serde_json::to_string(&UserRole::Staff).unwrap(),
            "\"STAFF\""
        );
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
