//! User API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::resource;
use shared::models::{User, UserCreate, UserRole, UserUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

/// GET /api/users/me
pub async fn me(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<User>> {
    let found = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| not_found(current.id))?;
    Ok(Json(found))
}

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user::find_all(&state.pool).await?))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(found))
}

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;

    let created = user::create(&state.pool, payload).await?;
    security_log!(
        "INFO",
        "user_created",
        user_id = created.id,
        role = created.role.as_str(),
        by = current.id
    );
    state.bus.created(resource::USER, created.id, &created);
    Ok(Json(created))
}

/// PUT /api/users/{id}
///
/// Admins cannot deactivate or demote themselves.
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    if id == current.id
        && (payload.is_active == Some(false)
            || payload.role.is_some_and(|role| role < UserRole::Admin))
    {
        return Err(AppError::with_message(
            ErrorCode::UserCannotDeleteSelf,
            "You cannot deactivate or demote your own account",
        ));
    }

    let updated = user::update(&state.pool, id, payload).await?;
    security_log!(
        "INFO",
        "user_updated",
        user_id = id,
        role = updated.role.as_str(),
        is_active = updated.is_active,
        by = current.id
    );
    state.bus.updated(resource::USER, id, &updated);
    Ok(Json(updated))
}

/// DELETE /api/users/{id} - deactivates, history keeps referencing the row
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if id == current.id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf));
    }
    if !user::deactivate(&state.pool, id).await? {
        return Err(not_found(id));
    }
    security_log!("INFO", "user_deactivated", user_id = id, by = current.id);
    state.bus.deleted(resource::USER, id);
    Ok(Json(true))
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}
