//! Event bus implementation
//!
//! ```text
//! OrderLifecycle ─┐
//! Inventory ──────┼──▶ EventBus::publish ──▶ broadcast::Sender<ServerEvent>
//! API handlers ───┘                                   │
//!                                        ┌────────────┼────────────┐
//!                                        ▼            ▼            ▼
//!                                   SSE client   SSE client    tests
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use shared::message::{EventKind, ServerEvent};
use tokio::sync::broadcast;

/// Per-resource version counters
///
/// Every published event bumps its resource's version so clients can tell
/// whether they missed events and need a full reload.
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the version of `resource` and return the new value (first call returns 1)
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current version, 0 when nothing was published yet
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Broadcast bus for [`ServerEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
    versions: Arc<ResourceVersions>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            versions: Arc::new(ResourceVersions::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Open event streams
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn versions(&self) -> &ResourceVersions {
        &self.versions
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish<T: Serialize>(
        &self,
        kind: EventKind,
        resource: &str,
        id: Option<i64>,
        data: Option<&T>,
    ) -> u64 {
        let version = self.versions.increment(resource);
        let data = data.and_then(|d| match serde_json::to_value(d) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(resource, error = %e, "Failed to serialize event payload");
                None
            }
        });

        let event = ServerEvent {
            kind,
            resource: resource.to_string(),
            id,
            version,
            data,
        };
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(resource, ?id, %kind, version, receivers, "Event published")
            }
            Err(_) => {
                tracing::trace!(resource, ?id, %kind, version, "Event dropped, no subscribers")
            }
        }
        version
    }

    pub fn created<T: Serialize>(&self, resource: &str, id: i64, data: &T) -> u64 {
        self.publish(EventKind::Created, resource, Some(id), Some(data))
    }

    pub fn updated<T: Serialize>(&self, resource: &str, id: i64, data: &T) -> u64 {
        self.publish(EventKind::Updated, resource, Some(id), Some(data))
    }

    pub fn deleted(&self, resource: &str, id: i64) -> u64 {
        self.publish::<()>(EventKind::Deleted, resource, Some(id), None)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
