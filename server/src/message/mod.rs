//! In-process event bus
//!
//! Every committed change is published as a [`ServerEvent`]; HTTP clients
//! follow the stream through `GET /api/notifications/events`, filtered by
//! [`filter::visible_to`].

mod bus;
pub mod filter;

pub use bus::{EventBus, ResourceVersions};
pub use shared::message::{EventKind, ServerEvent, resource};
