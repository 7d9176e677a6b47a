//! Shared types for the Lanchonete POS
//!
//! Domain models, the order status machine, the unified error system and
//! event payloads used by the server and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use message::{EventKind, ServerEvent};
pub use order::OrderStatus;
