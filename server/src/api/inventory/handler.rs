//! Inventory API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use shared::models::{Product, StockMovement, StockMovementCreate, StockMovementQuery};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/inventory/movements?product_id=&limit=&offset=
pub async fn list_movements(
    State(state): State<ServerState>,
    Query(query): Query<StockMovementQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    Ok(Json(state.inventory.list_movements(&query).await?))
}

/// POST /api/inventory/movements
pub async fn record_movement(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<StockMovementCreate>,
) -> AppResult<Json<StockMovement>> {
    Ok(Json(state.inventory.record_movement(&current, payload).await?))
}

/// GET /api/inventory/low-stock
pub async fn low_stock(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory.low_stock().await?))
}
