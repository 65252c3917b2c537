use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::gifts::ScheduleGift;

/// Schedule status enum representing the lifecycle of a room session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    Booked,
    InUse,
    Locked,
    Maintenance,
    Finished,
    Cancelled,
}

impl ScheduleStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Booked => "booked",
            ScheduleStatus::InUse => "in-use",
            ScheduleStatus::Locked => "locked",
            ScheduleStatus::Maintenance => "maintenance",
            ScheduleStatus::Finished => "finished",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "booked" => Ok(ScheduleStatus::Booked),
            "in-use" => Ok(ScheduleStatus::InUse),
            "locked" => Ok(ScheduleStatus::Locked),
            "maintenance" => Ok(ScheduleStatus::Maintenance),
            "finished" => Ok(ScheduleStatus::Finished),
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            _ => Err(format!("Invalid schedule status: {}", s)),
        }
    }

    /// A terminal schedule can never be modified again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScheduleStatus::Finished | ScheduleStatus::Cancelled)
    }
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        ScheduleStatus::Booked
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a room session in the database
///
/// `gift` holds the claimed gift snapshot once the customer has spun for one;
/// it is immutable after being set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomSchedule {
    pub id: Uuid,
    pub room_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ScheduleStatus,
    pub note: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub gift_enabled: bool,
    pub apply_free_hour_promo: bool,
    pub gift: Option<Json<ScheduleGift>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a new schedule
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub room_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(length(max = 100))]
    pub customer_name: Option<String>,
    #[validate(length(max = 20))]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub gift_enabled: bool,
    #[serde(default)]
    pub apply_free_hour_promo: bool,
}

/// Request DTO for updating an existing schedule (partial)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(length(max = 100))]
    pub customer_name: Option<String>,
    #[validate(length(max = 20))]
    pub customer_phone: Option<String>,
    pub gift_enabled: Option<bool>,
    pub apply_free_hour_promo: Option<bool>,
}

/// Request DTO for updating schedule status
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleStatusRequest {
    pub status: ScheduleStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            ScheduleStatus::Booked,
            ScheduleStatus::InUse,
            ScheduleStatus::Locked,
            ScheduleStatus::Maintenance,
            ScheduleStatus::Finished,
            ScheduleStatus::Cancelled,
        ] {
            assert_eq!(ScheduleStatus::from_str(s.as_str()), Ok(s));
        }
        assert!(ScheduleStatus::from_str("singing").is_err());
    }

    #[test]
    fn test_status_serde_kebab_case() {
        let json = serde_json::to_string(&ScheduleStatus::InUse).unwrap();
        assert_eq!(json, "\"in-use\"");
        let parsed: ScheduleStatus = serde_json::from_str("\"in-use\"").unwrap();
        assert_eq!(parsed, ScheduleStatus::InUse);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ScheduleStatus::Finished.is_terminal());
        assert!(ScheduleStatus::Cancelled.is_terminal());
        assert!(!ScheduleStatus::InUse.is_terminal());
        assert!(!ScheduleStatus::Booked.is_terminal());
    }
}
