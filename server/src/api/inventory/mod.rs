//! Inventory API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use shared::models::UserRole;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/movements", get(handler::list_movements))
        .route("/low-stock", get(handler::low_stock))
        .layer(middleware::from_fn(require_role(UserRole::Staff)));

    let manage_routes = Router::new()
        .route("/movements", post(handler::record_movement))
        .layer(middleware::from_fn(require_role(UserRole::Admin)));

    read_routes.merge(manage_routes)
}
