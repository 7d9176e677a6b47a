//! Cart API
//!
//! Each identified caller has one server side cart; checkout is
//! `POST /api/orders` without `items`.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            get(handler::get_cart)
                .post(handler::add_item)
                .delete(handler::clear),
        )
        .route(
            "/items/{id}",
            put(handler::update_item).delete(handler::remove_item),
        )
}
