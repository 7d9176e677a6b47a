//! Category API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::message::resource;
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::core::ServerState;
use crate::db::repository::category;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include deactivated categories
    #[serde(default)]
    pub all: bool,
}

/// GET /api/categories
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = category::find_all(&state.pool, query.all).await?;
    Ok(Json(categories))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let found = category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(found))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let created = category::create(&state.pool, payload).await?;
    state.bus.created(resource::CATEGORY, created.id, &created);
    Ok(Json(created))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let updated = category::update(&state.pool, id, payload).await?;
    state.bus.updated(resource::CATEGORY, id, &updated);
    Ok(Json(updated))
}

/// DELETE /api/categories/{id} - refused while products reference it
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = category::delete(&state.pool, id).await?;
    if !deleted {
        return Err(not_found(id));
    }
    state.bus.deleted(resource::CATEGORY, id);
    Ok(Json(true))
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
}
