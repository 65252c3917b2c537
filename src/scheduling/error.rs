use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for schedule operations
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Schedule not found")]
    NotFound,

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Schedule is {0} and can no longer be modified")]
    Immutable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for ScheduleError {
    fn from(err: sqlx::Error) -> Self {
        ScheduleError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for ScheduleError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ScheduleError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ScheduleError::NotFound => (StatusCode::NOT_FOUND, "Schedule not found".to_string()),
            ScheduleError::RoomNotFound(id) => (
                StatusCode::BAD_REQUEST,
                format!("Room with id {} not found", id),
            ),
            ScheduleError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg),
            ScheduleError::Immutable(status) => (
                StatusCode::CONFLICT,
                format!("Schedule is {} and can no longer be modified", status),
            ),
            ScheduleError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
