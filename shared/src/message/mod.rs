//! Event bus messages
//!
//! Published by the server on every state change and streamed to clients
//! (kitchen screens, waiter tablets) so they can refresh the affected resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    /// A notification was stored for some audience
    Notification,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
            Self::Notification => write!(f, "notification"),
        }
    }
}

/// Resource names used in [`ServerEvent::resource`]
pub mod resource {
    pub const ORDER: &str = "order";
    pub const TABLE: &str = "table";
    pub const PRODUCT: &str = "product";
    pub const CATEGORY: &str = "category";
    pub const USER: &str = "user";
    pub const STOCK: &str = "stock";
    pub const NOTIFICATION: &str = "notification";
    pub const SETTING: &str = "setting";
}

/// Change notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEvent {
    pub kind: EventKind,
    /// Resource type, e.g. `"order"`, `"table"`
    pub resource: String,
    /// Entity id, absent for key/value resources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Per-resource version, strictly increasing
    pub version: u64,
    /// Entity snapshot, absent on delete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ServerEvent {
    /// SSE event name, `"<resource>.<kind>"`
    pub fn event_name(&self) -> String {
        format!("{}.{}", self.resource, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_and_serde() {
        let event = ServerEvent {
            kind: EventKind::Updated,
            resource: resource::TABLE.to_string(),
            id: Some(7),
            version: 3,
            data: None,
        };
        assert_eq!(event.event_name(), "table.updated");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "updated");
        assert_eq!(json["id"], 7);
        assert!(json.get("data").is_none());
    }
}
