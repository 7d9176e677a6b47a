//! Caller identity and role gates
//!
//! Authentication happens upstream; requests carry the caller's user id in
//! the `x-user-id` header. This module resolves it and enforces roles:
//! - [`CurrentUser`] - resolved caller
//! - [`require_operator`] - identity middleware
//! - [`require_role`] - minimum role middleware

pub mod extractor;
pub mod identity;
pub mod middleware;

pub use identity::{CurrentUser, USER_ID_HEADER};
pub use middleware::{is_public_route, require_operator, require_role};
