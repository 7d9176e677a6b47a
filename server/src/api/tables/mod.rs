//! Dining Table API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use shared::models::UserRole;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/overview", get(handler::overview))
        .route("/{id}", get(handler::get_by_id))
        // occupancy is driven by staff
        .route("/{id}/status", put(handler::set_status))
        .route("/{id}/recompute", post(handler::recompute))
        .layer(middleware::from_fn(require_role(UserRole::Staff)));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_role(UserRole::Admin)));

    read_routes.merge(manage_routes)
}
