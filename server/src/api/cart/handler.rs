//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{CartItemAdd, CartItemUpdate, CartView};
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, cart, product};
use crate::orders::money;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_QUANTITY, validate_optional_text, validate_quantity,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/cart
pub async fn get_cart(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<CartView>> {
    Ok(Json(load_cart(&state.pool, current.id).await?))
}

/// POST /api/cart - add a product, merging with an existing line
pub async fn add_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CartItemAdd>,
) -> AppResult<Json<CartView>> {
    let quantity = payload.quantity.unwrap_or(1);
    validate_quantity(quantity)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let found = product::find_by_id(&state.pool, payload.product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", payload.product_id),
            )
        })?;
    if !found.is_available {
        return Err(AppError::with_message(
            ErrorCode::ProductUnavailable,
            format!("'{}' is not available", found.name),
        ));
    }

    let in_cart = cart::find_lines(&state.pool, current.id)
        .await?
        .into_iter()
        .find(|line| line.product_id == found.id)
        .map(|line| line.quantity)
        .unwrap_or(0);
    if in_cart + quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("at most {MAX_QUANTITY} units of '{}' per order", found.name),
        ));
    }

    cart::add(&state.pool, current.id, found.id, quantity, payload.notes.as_deref()).await?;
    Ok(Json(load_cart(&state.pool, current.id).await?))
}

/// PUT /api/cart/items/{id}
pub async fn update_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<Json<CartView>> {
    validate_quantity(payload.quantity)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    cart::update(&state.pool, current.id, id, payload.quantity, payload.notes.as_deref()).await?;
    Ok(Json(load_cart(&state.pool, current.id).await?))
}

/// DELETE /api/cart/items/{id}
pub async fn remove_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<CartView>> {
    cart::remove(&state.pool, current.id, id).await?;
    Ok(Json(load_cart(&state.pool, current.id).await?))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<CartView>> {
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    let removed = cart::clear(&mut conn, current.id).await?;
    drop(conn);
    tracing::debug!(user_id = current.id, removed, "Cart cleared");
    Ok(Json(CartView::default()))
}

async fn load_cart(pool: &SqlitePool, user_id: i64) -> AppResult<CartView> {
    let mut items = cart::find_lines(pool, user_id).await?;
    let mut totals = Vec::with_capacity(items.len());
    for line in &mut items {
        let total = money::line_total(line.unit_price, line.quantity);
        line.line_total = money::to_f64(total);
        totals.push(total);
    }
    Ok(CartView {
        item_count: items.iter().map(|l| l.quantity).sum(),
        total: money::to_f64(money::order_total(totals)),
        items,
    })
}
