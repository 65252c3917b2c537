use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A karaoke room at the venue
///
/// The room type is the key used by the billing engine to select an hourly
/// rate from the active price table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Room {
    pub id: Uuid,
    #[schema(example = "Room 301")]
    pub room_name: String,
    #[schema(example = "vip", pattern = "small|medium|large|vip")]
    pub room_type: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new room
///
/// Used for POST /api/rooms requests. The id and timestamp are generated
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateRoom {
    #[schema(example = "Room 301")]
    #[validate(length(min = 1, max = 100))]
    pub room_name: String,
    #[schema(example = "vip", pattern = "small|medium|large|vip")]
    #[validate(custom = "crate::validation::validate_room_type")]
    pub room_type: String,
}

/// Data for updating an existing room
///
/// Used for PUT /api/rooms/{id} requests. All fields are optional to support
/// partial updates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateRoom {
    #[schema(example = "Room 302")]
    #[validate(length(min = 1, max = 100))]
    pub room_name: Option<String>,
    #[schema(example = "large", pattern = "small|medium|large|vip")]
    #[validate(custom = "crate::validation::validate_room_type")]
    pub room_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_room_serialization() {
        let room = Room {
            id: Uuid::nil(),
            room_name: "Room 301".to_string(),
            room_type: "vip".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&room).expect("Failed to serialize Room");

        assert!(json.contains("\"room_name\":\"Room 301\""));
        assert!(json.contains("\"room_type\":\"vip\""));
        assert!(json.contains("\"created_at\""));
    }

    #[test]
    fn test_create_room_deserialization() {
        let json = r#"{
            "room_name": "Room 105",
            "room_type": "medium"
        }"#;

        let create_room: CreateRoom =
            serde_json::from_str(json).expect("Failed to deserialize CreateRoom");

        assert_eq!(create_room.room_name, "Room 105");
        assert_eq!(create_room.room_type, "medium");
        assert!(create_room.validate().is_ok());
    }

    #[test]
    fn test_create_room_rejects_unknown_type() {
        let create_room = CreateRoom {
            room_name: "Room 1".to_string(),
            room_type: "penthouse".to_string(),
        };
        assert!(create_room.validate().is_err());
    }

    #[test]
    fn test_update_room_partial_fields() {
        let json = r#"{ "room_name": "Renamed" }"#;

        let update_room: UpdateRoom =
            serde_json::from_str(json).expect("Failed to deserialize UpdateRoom");

        assert_eq!(update_room.room_name, Some("Renamed".to_string()));
        assert_eq!(update_room.room_type, None);
        assert!(update_room.validate().is_ok());
    }
}
