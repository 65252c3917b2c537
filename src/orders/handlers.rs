// HTTP handlers for food-and-beverage order endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::orders::menu::{MenuEntry, MenuItem};
use crate::orders::{FnbOrder, OrderError, OrderHistoryRecord, UpsertOrderRequest};

/// Handler for GET /api/menu
/// Returns the primary menu catalogue
pub async fn get_menu_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<MenuEntry>>, OrderError> {
    let entries = state.menu_repo.load_entries().await?;

    Ok(Json(entries))
}

/// Handler for GET /api/menu/items
/// Returns the secondary catalogue
pub async fn get_menu_items_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<MenuItem>>, OrderError> {
    let items = state.menu_repo.load_items().await?;

    Ok(Json(items))
}

/// Handler for PUT /api/schedules/{schedule_id}/order
/// Merges incoming quantities into the schedule's order
pub async fn upsert_order_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpsertOrderRequest>,
) -> Result<Json<FnbOrder>, OrderError> {
    request
        .validate()
        .map_err(|e| OrderError::ValidationError(e.to_string()))?;

    let order = state.order_service.upsert_order(schedule_id, request).await?;

    Ok(Json(order))
}

/// Handler for GET /api/schedules/{schedule_id}/order
pub async fn get_order_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<FnbOrder>, OrderError> {
    let order = state.order_service.get_order(schedule_id).await?;

    Ok(Json(order))
}

/// Handler for GET /api/schedules/{schedule_id}/order/history
pub async fn get_order_history_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Vec<OrderHistoryRecord>>, OrderError> {
    let history = state.order_service.get_history(schedule_id).await?;

    Ok(Json(history))
}
