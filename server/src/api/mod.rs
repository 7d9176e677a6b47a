//! API routes
//!
//! - [`health`] - liveness and database check
//! - [`menu`] - public menu
//! - [`categories`] / [`products`] - catalogue
//! - [`users`] - accounts
//! - [`tables`] - dining tables
//! - [`cart`] - the caller's cart
//! - [`orders`] - checkout and staff fulfillment
//! - [`inventory`] - stock ledger
//! - [`notifications`] - notifications and the event stream
//! - [`settings`] - back office settings

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod middleware;

pub mod cart;
pub mod categories;
pub mod health;
pub mod inventory;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod settings;
pub mod tables;
pub mod users;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(menu::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(users::router())
        .merge(tables::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(inventory::router())
        .merge(notifications::router())
        .merge(settings::router())
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by in-process tests (`tower::ServiceExt::oneshot`)
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    build_router()
        // ========== Application Middleware ==========
        // Request logging - innermost, sees the CurrentUser injected below
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Identity - resolves x-user-id into CurrentUser, skips public routes
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_operator,
        ))
        // ========== Tower HTTP Middleware ==========
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Request ID - outermost, generated unless the client sent one
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
}
