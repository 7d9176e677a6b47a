//! Settings API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};
use shared::models::UserRole;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    // `/public` is listed in the identity middleware's public routes
    let public_routes = Router::new().route("/public", get(handler::public));

    let manage_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{key}", put(handler::update))
        .layer(middleware::from_fn(require_role(UserRole::Admin)));

    public_routes.merge(manage_routes)
}
