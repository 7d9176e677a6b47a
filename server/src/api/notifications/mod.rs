//! Notifications API
//!
//! Every identified caller reads their own notifications plus the ones
//! addressed to their role, and may follow the event stream.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/unread-count", get(handler::unread_count))
        .route("/read-all", put(handler::mark_all_read))
        .route("/{id}/read", put(handler::mark_read))
        .route("/events", get(handler::events))
}
