use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for food-and-beverage order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Order not found")]
    NotFound,

    #[error("Schedule not found")]
    ScheduleNotFound,

    #[error("Schedule is {0} and no longer accepts orders")]
    ScheduleClosed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            OrderError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            OrderError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            OrderError::ScheduleNotFound => {
                (StatusCode::NOT_FOUND, "Schedule not found".to_string())
            }
            OrderError::ScheduleClosed(status) => (
                StatusCode::CONFLICT,
                format!("Schedule is {} and no longer accepts orders", status),
            ),
            OrderError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
