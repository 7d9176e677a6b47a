//! Health routes, both public
//!
//! `GET /health` answers as long as the process runs. `GET /health/detailed`
//! also pings SQLite and reports the floor:
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "environment": "production",
//!   "uptime_seconds": 5120,
//!   "database": { "ok": true, "latency_ms": 1 },
//!   "floor": { "occupied_tables": 4, "active_orders": 6 },
//!   "event_streams": 3
//! }
//! ```

use std::sync::OnceLock;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::repository::dining_table;

static STARTED: OnceLock<Instant> = OnceLock::new();

pub fn router() -> Router<ServerState> {
    STARTED.get_or_init(Instant::now);
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

#[derive(Serialize)]
pub struct Liveness {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct Readiness {
    status: &'static str,
    version: &'static str,
    environment: String,
    uptime_seconds: u64,
    database: DatabaseCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    floor: Option<Floor>,
    event_streams: usize,
}

#[derive(Serialize)]
pub struct DatabaseCheck {
    ok: bool,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct Floor {
    occupied_tables: i64,
    active_orders: i64,
}

pub async fn health() -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn detailed_health(State(state): State<ServerState>) -> Json<Readiness> {
    let ping = Instant::now();
    let (database, floor) = match dining_table::floor_summary(&state.pool).await {
        Ok((occupied_tables, active_orders)) => (
            DatabaseCheck {
                ok: true,
                latency_ms: ping.elapsed().as_millis() as u64,
                error: None,
            },
            Some(Floor {
                occupied_tables,
                active_orders,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            (
                DatabaseCheck {
                    ok: false,
                    latency_ms: ping.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                },
                None,
            )
        }
    };

    Json(Readiness {
        status: if database.ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_seconds: STARTED.get_or_init(Instant::now).elapsed().as_secs(),
        database,
        floor,
        event_streams: state.bus.subscriber_count(),
    })
}
