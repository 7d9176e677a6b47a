//! User API
//!
//! Account management for admins. `GET /api/users/me` is open to any
//! identified caller.

mod handler;

use axum::{Router, middleware, routing::get};
use shared::models::UserRole;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    let self_routes = Router::new().route("/me", get(handler::me));

    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_role(UserRole::Admin)));

    self_routes.merge(manage_routes)
}
