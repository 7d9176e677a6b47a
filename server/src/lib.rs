//! Lanchonete server - restaurant ordering back end
//!
//! # Overview
//!
//! - **API** (`api`): REST routes for menu, cart, orders, tables, inventory, back office
//! - **Orders** (`orders`): order lifecycle and table occupancy coordinator
//! - **Inventory** (`inventory`): stock ledger
//! - **Database** (`db`): SQLite via sqlx
//! - **Identity** (`auth`): `x-user-id` resolution and role gates
//! - **Events** (`message`, `notifications`): broadcast bus and stored notifications
//!
//! # Layout
//!
//! ```text
//! server/src/
//! ├── core/          # config, state, server, errors
//! ├── auth/          # identity middleware, role gates
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # pool, migrations, repositories
//! ├── orders/        # lifecycle, table locks, table sync, money
//! ├── message/       # event bus
//! └── utils/         # logging, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod message;
pub mod notifications;
pub mod orders;
pub mod utils;

// Re-export public types
pub use auth::CurrentUser;
pub use core::{Config, Server, ServerState};
pub use message::{EventBus, ServerEvent};
pub use orders::OrderLifecycle;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro, accepts tracing field syntax
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Start logging from the configured level and directory
pub fn setup_environment(config: &Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    __                     __                     __
   / /   ____ _____  _____/ /_  ____  ____  ___  / /____
  / /   / __ `/ __ \/ ___/ __ \/ __ \/ __ \/ _ \/ __/ _ \
 / /___/ /_/ / / / / /__/ / / / /_/ / / / /  __/ /_/  __/
/_____/\__,_/_/ /_/\___/_/ /_/\____/_/ /_/\___/\__/\___/
    "#
    );
}
