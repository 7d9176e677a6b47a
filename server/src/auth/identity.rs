//! Current caller

use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserRole};

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolved caller, injected into request extensions by [`super::require_operator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail unless the caller has at least `min`
    pub fn require(&self, min: UserRole) -> Result<(), AppError> {
        if self.role >= min {
            return Ok(());
        }
        let code = match min {
            UserRole::Admin => ErrorCode::AdminRequired,
            UserRole::Staff => ErrorCode::StaffRequired,
            UserRole::Customer => ErrorCode::PermissionDenied,
        };
        Err(AppError::new(code)
            .with_detail("required_role", min.as_str())
            .with_detail("role", self.role.as_str()))
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
        }
    }
}
