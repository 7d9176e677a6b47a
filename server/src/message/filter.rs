//! Event visibility
//!
//! Every subscriber receives the same broadcast; the stream drops what the
//! caller should not see:
//!
//! 1. staff and admins see every change
//! 2. customers see catalogue changes (categories, products, settings)
//! 3. customers see their own orders and notifications addressed to them
//! 4. audience notifications follow the role rules of the notification list

use serde_json::Value;
use shared::models::UserRole;

use super::{EventKind, ServerEvent, resource};

/// Whether `event` may be delivered to `user_id` with `role`
pub fn visible_to(event: &ServerEvent, user_id: i64, role: UserRole) -> bool {
    if event.kind == EventKind::Notification {
        return notification_visible(event.data.as_ref(), user_id, role);
    }
    if role.is_staff() {
        return true;
    }
    match event.resource.as_str() {
        resource::CATEGORY | resource::PRODUCT | resource::SETTING => true,
        resource::ORDER => owner(event.data.as_ref()) == Some(user_id),
        _ => false,
    }
}

fn notification_visible(data: Option<&Value>, user_id: i64, role: UserRole) -> bool {
    let Some(data) = data else {
        return false;
    };
    match data.get("audience").and_then(Value::as_str) {
        Some("USER") => owner(Some(data)) == Some(user_id),
        Some("STAFF") => role.is_staff(),
        Some("ADMIN") => role.is_admin(),
        _ => false,
    }
}

fn owner(data: Option<&Value>) -> Option<i64> {
    data?.get("user_id")?.as_i64()
}
