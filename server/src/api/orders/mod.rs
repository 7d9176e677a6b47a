//! Order API
//!
//! All writes go through [`crate::orders::OrderLifecycle`].
//!
//! | Path | Method | Role |
//! |------|--------|------|
//! | /api/orders | POST | any (checkout) |
//! | /api/orders/mine | GET | any |
//! | /api/orders/{id} | GET | staff, or the order's customer |
//! | /api/orders/{id}/cancel | POST | any (customer rules apply) |
//! | /api/orders | GET | staff |
//! | /api/orders/{id}/receive, /advance | POST | staff |
//! | /api/orders/{id}/status, /table | PUT | staff |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use shared::models::UserRole;

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let customer_routes = Router::new()
        .route("/", post(handler::place))
        .route("/mine", get(handler::mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel));

    let staff_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/receive", post(handler::receive))
        .route("/{id}/advance", post(handler::advance))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/table", put(handler::move_table))
        .layer(middleware::from_fn(require_role(UserRole::Staff)));

    customer_routes.merge(staff_routes)
}
