// HTTP handlers for gift endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::gifts::{
    CreateGiftRequest, Gift, GiftError, ScheduleGift, UpdateGiftRequest,
};

/// Handler for POST /api/gifts
pub async fn create_gift_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateGiftRequest>,
) -> Result<(StatusCode, Json<Gift>), GiftError> {
    request
        .validate()
        .map_err(|e| GiftError::ValidationError(e.to_string()))?;

    let gift = state.gift_service.create_gift(request).await?;

    Ok((StatusCode::CREATED, Json(gift)))
}

/// Handler for GET /api/gifts
pub async fn list_gifts_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<Gift>>, GiftError> {
    let gifts = state.gift_service.list_gifts().await?;

    Ok(Json(gifts))
}

/// Handler for GET /api/gifts/{gift_id}
pub async fn get_gift_handler(
    State(state): State<crate::AppState>,
    Path(gift_id): Path<Uuid>,
) -> Result<Json<Gift>, GiftError> {
    let gift = state.gift_service.get_gift(gift_id).await?;

    Ok(Json(gift))
}

/// Handler for PUT /api/gifts/{gift_id}
pub async fn update_gift_handler(
    State(state): State<crate::AppState>,
    Path(gift_id): Path<Uuid>,
    Json(request): Json<UpdateGiftRequest>,
) -> Result<Json<Gift>, GiftError> {
    request
        .validate()
        .map_err(|e| GiftError::ValidationError(e.to_string()))?;

    let gift = state.gift_service.update_gift(gift_id, request).await?;

    Ok(Json(gift))
}

/// Handler for DELETE /api/gifts/{gift_id}
pub async fn delete_gift_handler(
    State(state): State<crate::AppState>,
    Path(gift_id): Path<Uuid>,
) -> Result<StatusCode, GiftError> {
    state.gift_service.delete_gift(gift_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/schedules/{schedule_id}/gift/claim
/// Spins the prize wheel for a schedule; idempotent once claimed
pub async fn claim_gift_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ScheduleGift>, GiftError> {
    let gift = state.gift_service.claim_gift(schedule_id).await?;

    Ok(Json(gift))
}
