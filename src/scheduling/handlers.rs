// HTTP handlers for schedule endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::scheduling::{
    CreateScheduleRequest, RoomSchedule, ScheduleError, UpdateScheduleRequest,
    UpdateScheduleStatusRequest,
};

/// Handler for POST /api/schedules
/// Creates a new booking
pub async fn create_schedule_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<RoomSchedule>), ScheduleError> {
    request
        .validate()
        .map_err(|e| ScheduleError::ValidationError(e.to_string()))?;

    let schedule = state.schedule_service.create_schedule(request).await?;

    Ok((StatusCode::CREATED, Json(schedule)))
}

/// Handler for GET /api/schedules/{schedule_id}
pub async fn get_schedule_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<RoomSchedule>, ScheduleError> {
    let schedule = state.schedule_service.get_schedule(schedule_id).await?;

    Ok(Json(schedule))
}

/// Handler for GET /api/rooms/{room_id}/schedules
pub async fn get_room_schedules_handler(
    State(state): State<crate::AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<RoomSchedule>>, ScheduleError> {
    let schedules = state.schedule_service.get_room_schedules(room_id).await?;

    Ok(Json(schedules))
}

/// Handler for PUT /api/schedules/{schedule_id}
pub async fn update_schedule_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<RoomSchedule>, ScheduleError> {
    request
        .validate()
        .map_err(|e| ScheduleError::ValidationError(e.to_string()))?;

    let schedule = state
        .schedule_service
        .update_schedule(schedule_id, request)
        .await?;

    Ok(Json(schedule))
}

/// Handler for DELETE /api/schedules/{schedule_id}
pub async fn delete_schedule_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<StatusCode, ScheduleError> {
    state.schedule_service.delete_schedule(schedule_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for PATCH /api/schedules/{schedule_id}/status
pub async fn update_schedule_status_handler(
    State(state): State<crate::AppState>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleStatusRequest>,
) -> Result<Json<RoomSchedule>, ScheduleError> {
    let schedule = state
        .schedule_service
        .update_status(schedule_id, request.status)
        .await?;

    Ok(Json(schedule))
}
