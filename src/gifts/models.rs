use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Kind of reward a gift grants when claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GiftType {
    /// A bundle of free snacks and drinks added to the bill at zero price
    SnacksDrinks,
    /// A percentage discount on the bill subtotal
    Discount,
    /// A flat amount deducted from the bill
    DiscountAmount,
}

impl GiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftType::SnacksDrinks => "snacks_drinks",
            GiftType::Discount => "discount",
            GiftType::DiscountAmount => "discount_amount",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "snacks_drinks" => Ok(GiftType::SnacksDrinks),
            // Legacy rows used "discount_percentage" for the percentage kind
            "discount" | "discount_percentage" => Ok(GiftType::Discount),
            "discount_amount" => Ok(GiftType::DiscountAmount),
            _ => Err(format!("Invalid gift type: {}", s)),
        }
    }
}

impl std::fmt::Display for GiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An item included in a snacks-and-drinks gift bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftBundleItem {
    pub name: String,
    pub quantity: i64,
}

/// Domain model representing a gift in the prize pool
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Gift {
    pub id: Uuid,
    pub name: String,
    pub gift_type: GiftType,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub items: Option<Json<Vec<GiftBundleItem>>>,
    pub total_quantity: i32,
    pub remaining_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a claimed gift stored on the schedule
///
/// Copied from the gift at claim time so later edits to the prize pool never
/// change what a customer already won.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleGift {
    pub gift_id: Uuid,
    pub name: String,
    pub gift_type: GiftType,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub items: Option<Vec<GiftBundleItem>>,
    pub status: String,
    pub claimed_at: DateTime<Utc>,
}

impl ScheduleGift {
    pub const STATUS_CLAIMED: &'static str = "claimed";

    pub fn is_claimed(&self) -> bool {
        self.status == Self::STATUS_CLAIMED
    }
}

/// Request DTO for creating a gift
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGiftRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub gift_type: GiftType,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub items: Option<Vec<GiftBundleItem>>,
    #[validate(range(min = 0))]
    pub total_quantity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Request DTO for updating a gift (partial)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGiftRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub items: Option<Vec<GiftBundleItem>>,
    #[validate(range(min = 0))]
    pub total_quantity: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_type_round_trip() {
        for t in [GiftType::SnacksDrinks, GiftType::Discount, GiftType::DiscountAmount] {
            assert_eq!(GiftType::from_str(t.as_str()), Ok(t));
        }
    }

    #[test]
    fn test_gift_type_legacy_alias() {
        assert_eq!(
            GiftType::from_str("discount_percentage"),
            Ok(GiftType::Discount)
        );
        assert!(GiftType::from_str("free_room").is_err());
    }

    #[test]
    fn test_schedule_gift_claimed_status() {
        let gift = ScheduleGift {
            gift_id: Uuid::nil(),
            name: "Free cola".to_string(),
            gift_type: GiftType::SnacksDrinks,
            discount_percentage: None,
            discount_amount: None,
            items: Some(vec![GiftBundleItem {
                name: "Cola".to_string(),
                quantity: 2,
            }]),
            status: ScheduleGift::STATUS_CLAIMED.to_string(),
            claimed_at: Utc::now(),
        };
        assert!(gift.is_claimed());
    }
}
