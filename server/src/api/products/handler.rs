//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::message::resource;
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};

use crate::core::ServerState;
use crate::db::repository::product;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/products?category_id=&available=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let products = product::find_all(&state.pool, &query).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let found = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(found))
}

/// POST /api/products
///
/// The initial `stock_quantity` is set directly; later changes go through
/// `/api/inventory/movements`.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;
    validate_price(payload.price)?;
    if payload.min_stock.is_some_and(|m| m < 0) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStockQuantity,
            "min_stock cannot be negative",
        ));
    }

    let created = product::create(&state.pool, payload).await?;
    tracing::info!(product_id = created.id, name = %created.name, "Product created");
    state.bus.created(resource::PRODUCT, created.id, &created);
    Ok(Json(created))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.image_url, "image_url", MAX_URL_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let updated = product::update(&state.pool, id, payload).await?;
    state.bus.updated(resource::PRODUCT, id, &updated);
    Ok(Json(updated))
}

/// DELETE /api/products/{id} - refused once the product was ordered
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = product::delete(&state.pool, id).await?;
    if !deleted {
        return Err(not_found(id));
    }
    state.bus.deleted(resource::PRODUCT, id);
    Ok(Json(true))
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
}
