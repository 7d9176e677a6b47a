//! Per-request access log
//!
//! Runs inside the identity middleware so the caller is known. One line
//! when the response is ready; 4xx and 5xx are logged at `warn`.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::CurrentUser;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();

    let request_id = req
        .headers()
        .get(super::REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    // route template keeps ids out of the log key
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let caller = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| format!("{}({}, {})", u.name, u.id, u.role));

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    let caller = caller.as_deref().unwrap_or("anonymous");
    if response.status().is_client_error() || response.status().is_server_error() {
        tracing::warn!(%request_id, %method, %route, status, latency_ms, caller, "Request failed");
    } else {
        tracing::info!(%request_id, %method, %route, status, latency_ms, caller, "Request served");
    }

    response
}
