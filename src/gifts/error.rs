use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for gift operations
#[derive(Debug, thiserror::Error)]
pub enum GiftError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Gift not found")]
    NotFound,

    #[error("Schedule not found")]
    ScheduleNotFound,

    #[error("Gifts are not enabled for this schedule")]
    GiftNotEnabled,

    #[error("No gifts left in the prize pool")]
    PoolExhausted,

    #[error("Claim conflict: {0}")]
    ClaimConflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for GiftError {
    fn from(err: sqlx::Error) -> Self {
        GiftError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for GiftError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            GiftError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            GiftError::NotFound => (StatusCode::NOT_FOUND, "Gift not found".to_string()),
            GiftError::ScheduleNotFound => {
                (StatusCode::NOT_FOUND, "Schedule not found".to_string())
            }
            GiftError::GiftNotEnabled => (
                StatusCode::BAD_REQUEST,
                "Gifts are not enabled for this schedule".to_string(),
            ),
            GiftError::PoolExhausted => (
                StatusCode::CONFLICT,
                "No gifts left in the prize pool".to_string(),
            ),
            GiftError::ClaimConflict(msg) => (StatusCode::CONFLICT, msg),
            GiftError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
