use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::billing::DayType;

/// Error types for billing operations
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Schedule not found")]
    ScheduleNotFound,

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Bill not found")]
    BillNotFound,

    #[error("No price table configured for {0} days")]
    PriceTableNotFound(DayType),

    #[error("No {room_type} rate configured for {day_type} days")]
    RateNotFound {
        day_type: DayType,
        room_type: String,
    },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Print queue unavailable: {0}")]
    PrintQueue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::DatabaseError(err.to_string())
    }
}

impl From<crate::scheduling::error::ScheduleError> for BillingError {
    fn from(err: crate::scheduling::error::ScheduleError) -> Self {
        match err {
            crate::scheduling::error::ScheduleError::NotFound => BillingError::ScheduleNotFound,
            other => BillingError::DatabaseError(other.to_string()),
        }
    }
}

impl From<crate::orders::error::OrderError> for BillingError {
    fn from(err: crate::orders::error::OrderError) -> Self {
        BillingError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            BillingError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            BillingError::ScheduleNotFound => {
                (StatusCode::NOT_FOUND, "Schedule not found".to_string())
            }
            BillingError::RoomNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Room with id {} not found", id),
            ),
            BillingError::BillNotFound => {
                (StatusCode::NOT_FOUND, "Bill not found".to_string())
            }
            BillingError::PriceTableNotFound(_) | BillingError::RateNotFound { .. } => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            BillingError::InvalidTime(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BillingError::PrintQueue(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            BillingError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
