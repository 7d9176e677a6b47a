//! Menu API Handlers

use std::collections::HashMap;

use axum::{Json, extract::State};
use shared::models::{MenuSection, Product};

use crate::core::ServerState;
use crate::db::repository::{category, product};
use crate::utils::AppResult;

/// GET /api/menu
pub async fn menu(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuSection>>> {
    let categories = category::find_all(&state.pool, false).await?;
    let mut by_category: HashMap<i64, Vec<Product>> = HashMap::new();
    for p in product::find_orderable(&state.pool).await? {
        by_category.entry(p.category_id).or_default().push(p);
    }

    let sections = categories
        .into_iter()
        .filter_map(|category| {
            let products = by_category.remove(&category.id)?;
            Some(MenuSection { category, products })
        })
        .collect();
    Ok(Json(sections))
}
