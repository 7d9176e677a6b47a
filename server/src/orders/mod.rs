//! Order and table lifecycle
//!
//! - **lifecycle**: [`OrderLifecycle`], the only writer of order status and table occupancy
//! - **locks**: per-table async locks
//! - **table_sync**: derives a table's status from its active orders
//! - **money**: decimal line and order totals
//!
//! # Data Flow
//!
//! ```text
//! Handler → OrderLifecycle → lock tables → transaction
//!                                 ↓
//!                  orders / items / stock movements
//!                                 ↓
//!                      table_sync::recompute → commit
//!                                 ↓
//!                    EventBus + NotificationService
//! ```

pub mod lifecycle;
pub mod locks;
pub mod money;
pub mod table_sync;

// Re-exports
pub use lifecycle::{OrderLifecycle, load_detail};
pub use locks::{TableGuards, TableLocks};
