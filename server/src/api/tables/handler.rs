//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::message::resource;
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, TableOverview, TableStatusUpdate,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::dining_table;
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, ErrorCode};

const RESOURCE: &str = resource::TABLE;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Include tables taken out of service
    #[serde(default)]
    pub all: bool,
}

/// GET /api/tables
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.pool, query.all).await?;
    Ok(Json(tables))
}

/// GET /api/tables/overview - active tables with their active order count
pub async fn overview(State(state): State<ServerState>) -> AppResult<Json<Vec<TableOverview>>> {
    Ok(Json(dining_table::overview(&state.pool).await?))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(table))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_layout(Some(payload.number), payload.capacity)?;

    let table = dining_table::create(&state.pool, payload).await?;
    state.bus.created(RESOURCE, table.id, &table);
    Ok(Json(table))
}

/// PUT /api/tables/{id}
///
/// Taking a table out of service is refused while orders hold it.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_layout(payload.number, payload.capacity)?;

    let _guard = state.lifecycle.locks().acquire([Some(id)]).await;
    if payload.is_active == Some(false) {
        let mut conn = state.pool.acquire().await.map_err(crate::db::repository::RepoError::from)?;
        let active = dining_table::count_active_orders(&mut conn, id).await?;
        if active > 0 {
            return Err(AppError::with_message(
                ErrorCode::TableHasOrders,
                format!("Table {id} has {active} active orders"),
            )
            .with_detail("active_orders", active));
        }
    }

    let table = dining_table::update(&state.pool, id, payload).await?;
    state.bus.updated(RESOURCE, id, &table);
    Ok(Json(table))
}

/// DELETE /api/tables/{id} - tables with order history are deactivated
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let _guard = state.lifecycle.locks().acquire([Some(id)]).await;
    if !dining_table::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state.bus.deleted(RESOURCE, id);
    Ok(Json(true))
}

/// PUT /api/tables/{id}/status
pub async fn set_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<DiningTable>> {
    let table = state
        .lifecycle
        .set_table_status(&current, id, payload.status, payload.assigned_to)
        .await?;
    Ok(Json(table))
}

/// POST /api/tables/{id}/recompute
pub async fn recompute(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(state.lifecycle.recompute_table(id).await?))
}

fn validate_layout(number: Option<i32>, capacity: Option<i32>) -> AppResult<()> {
    if number.is_some_and(|n| n <= 0) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "table number must be positive",
        ));
    }
    if capacity.is_some_and(|c| !(1..=100).contains(&c)) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "capacity must be between 1 and 100",
        ));
    }
    Ok(())
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::TableNotFound, format!("Table {id} not found"))
}
