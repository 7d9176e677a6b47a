//! Public menu
//!
//! `GET /api/menu`: active categories, each with its available products.
//! Categories without anything to order are left out.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/menu", get(handler::menu))
}
