//! Settings API Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::message::{EventKind, resource};
use shared::models::setting::keys;
use shared::models::{Setting, SettingUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::setting;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_SETTING_LEN, validate_required_text};

/// GET /api/settings
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Setting>>> {
    Ok(Json(setting::find_all(&state.pool).await?))
}

/// GET /api/settings/public - keys shown to anonymous visitors
pub async fn public(State(state): State<ServerState>) -> AppResult<Json<BTreeMap<String, String>>> {
    let visible = setting::find_all(&state.pool)
        .await?
        .into_iter()
        .filter(|s| keys::PUBLIC.contains(&s.key.as_str()))
        .map(|s| (s.key, s.value))
        .collect();
    Ok(Json(visible))
}

/// PUT /api/settings/{key}
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(key): Path<String>,
    Json(payload): Json<SettingUpdate>,
) -> AppResult<Json<Setting>> {
    validate_required_text(&payload.value, "value", MAX_SETTING_LEN)?;

    let updated = setting::update(&state.pool, &key, payload.value.trim()).await?;
    tracing::info!(
        key = %updated.key,
        value = %updated.value,
        user_id = current.id,
        "Setting updated"
    );
    state
        .bus
        .publish(EventKind::Updated, resource::SETTING, None, Some(&updated));
    Ok(Json(updated))
}
