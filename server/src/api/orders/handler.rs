//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    Order, OrderCancel, OrderCreate, OrderDetail, OrderQuery, OrderStatusUpdate, OrderTableMove,
};
use shared::order::OrderStatus;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order;
use crate::orders::load_detail;
use crate::utils::{AppError, AppResult, ErrorCode};

/// POST /api/orders - checkout (payload items, or the caller's cart)
pub async fn place(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.lifecycle.place_order(&current, payload).await?;
    Ok(Json(detail))
}

/// Filters for the caller's own orders
#[derive(Debug, Default, Deserialize)]
pub struct MineQuery {
    pub status: Option<OrderStatus>,
    pub active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/orders/mine
pub async fn mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<MineQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let filter = OrderQuery {
        status: query.status,
        user_id: Some(current.id),
        active: query.active,
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };
    Ok(Json(order::find_all(&state.pool, &filter).await?))
}

/// GET /api/orders?status=&table_id=&user_id=&active=&from=&to=&limit=&offset=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(order::find_all(&state.pool, &query).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = load_detail(&state.pool, id).await?;
    if !current.is_staff() && detail.order.user_id != current.id {
        return Err(AppError::with_message(
            ErrorCode::OrderNotFound,
            format!("Order {id} not found"),
        ));
    }
    Ok(Json(detail))
}

/// POST /api/orders/{id}/receive
pub async fn receive(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.lifecycle.receive(&current, id).await?))
}

/// POST /api/orders/{id}/advance
pub async fn advance(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.lifecycle.advance(&current, id).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state
        .lifecycle
        .update_status(&current, id, payload.status, payload.reason)
        .await?;
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/table
pub async fn move_table(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderTableMove>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state
        .lifecycle
        .move_table(&current, id, payload.table_id)
        .await?;
    Ok(Json(detail))
}

/// POST /api/orders/{id}/cancel (body optional)
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<OrderCancel>>,
) -> AppResult<Json<OrderDetail>> {
    let reason = payload.and_then(|Json(body)| body.reason);
    Ok(Json(state.lifecycle.cancel(&current, id, reason).await?))
}
