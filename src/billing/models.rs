use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::gifts::GiftType;

/// The venue's wall clock; all pricing rules are written in this timezone
pub const VENUE_TZ: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// Label used on room-time bill lines
pub const SERVICE_LABEL: &str = "Karaoke service";

/// Day classification driving which rate table applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Weekend,
    Holiday,
}

impl DayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::Weekend => "weekend",
            DayType::Holiday => "holiday",
        }
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hourly rate for one room type inside a time slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeRate {
    pub room_type: String,
    pub price: Decimal,
}

/// A pricing window of the day, in venue-local "HH:mm" bounds
///
/// A slot whose start is later than its end wraps past midnight
/// (e.g. 22:00-02:00).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
    pub prices: Vec<RoomTypeRate>,
}

impl TimeSlot {
    pub fn start_minutes(&self) -> Option<u32> {
        crate::validation::parse_hhmm(&self.start).map(|(h, m)| h * 60 + m)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        crate::validation::parse_hhmm(&self.end).map(|(h, m)| h * 60 + m)
    }

    pub fn wraps_midnight(&self) -> bool {
        match (self.start_minutes(), self.end_minutes()) {
            (Some(s), Some(e)) => s > e,
            _ => false,
        }
    }

    /// Whether a venue-local minute-of-day falls inside this slot
    pub fn contains(&self, minute_of_day: u32) -> bool {
        let (Some(start), Some(end)) = (self.start_minutes(), self.end_minutes()) else {
            return false;
        };
        if start > end {
            minute_of_day >= start || minute_of_day <= end
        } else {
            minute_of_day >= start && minute_of_day < end
        }
    }

    /// Hourly rate for a room type, matched case-insensitively
    pub fn rate_for(&self, room_type: &str) -> Option<Decimal> {
        self.prices
            .iter()
            .find(|r| r.room_type.eq_ignore_ascii_case(room_type))
            .map(|r| r.price)
    }
}

/// One day-type's rate table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceTable {
    pub day_type: DayType,
    pub time_slots: Json<Vec<TimeSlot>>,
}

/// A holiday entry overriding the weekday/weekend classification
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// What a promotion applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionScope {
    All,
    Room(Uuid),
    RoomType(String),
}

impl PromotionScope {
    pub fn matches(&self, room_id: Uuid, room_type: &str) -> bool {
        match self {
            PromotionScope::All => true,
            PromotionScope::Room(id) => *id == room_id,
            PromotionScope::RoomType(t) => t.eq_ignore_ascii_case(room_type),
        }
    }
}

/// A percentage promotion currently configured at the venue
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Promotion {
    pub id: Uuid,
    pub name: String,
    pub discount_percentage: Decimal,
    pub applies_to: String,
    pub applies_to_id: Option<String>,
    pub is_active: bool,
}

impl Promotion {
    /// Interpret the stored scope columns
    ///
    /// Unknown or malformed scopes resolve to None and the promotion is
    /// simply never applied.
    pub fn scope(&self) -> Option<PromotionScope> {
        match self.applies_to.as_str() {
            "all" => Some(PromotionScope::All),
            "room" => self
                .applies_to_id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id).ok())
                .map(PromotionScope::Room),
            "room_type" => self
                .applies_to_id
                .clone()
                .map(PromotionScope::RoomType),
            _ => None,
        }
    }
}

/// A single line on a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
}

/// Promotion as applied to a concrete bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    pub name: String,
    pub discount_percentage: Decimal,
    pub amount: Decimal,
}

/// Free-hour credit as applied to a concrete bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeHourDetail {
    pub minutes_applied: i64,
    pub amount: Decimal,
}

/// Gift as applied to a concrete bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedGift {
    pub name: String,
    pub gift_type: GiftType,
    pub amount: Decimal,
}

/// A fully computed bill, before or after persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub schedule_id: Uuid,
    pub room_id: Uuid,
    pub room_name: String,
    pub room_type: String,
    /// Display label only; the persisted row's uuid is the real key
    pub invoice_code: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub items: Vec<BillItem>,
    pub subtotal: Decimal,
    pub promotion: Option<AppliedPromotion>,
    pub free_hour: Option<FreeHourDetail>,
    pub gift: Option<AppliedGift>,
    pub total_amount: Decimal,
    pub payment_method: Option<String>,
}

/// A persisted bill row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BillRecord {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub room_id: Uuid,
    pub items: Json<Vec<BillItem>>,
    pub total_amount: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub invoice_code: String,
    pub payment_method: Option<String>,
    pub active_promotion: Option<Json<AppliedPromotion>>,
    pub free_hour: Option<Json<FreeHourDetail>>,
    pub gift: Option<Json<AppliedGift>>,
    pub fnb_order: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

impl BillRecord {
    /// Content fingerprint used by duplicate cleanup
    ///
    /// Two rows describing the same session with the same lines hash
    /// identically regardless of insertion order of their items.
    pub fn content_key(&self) -> String {
        let mut parts: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{}:{}:{}", item.description, item.quantity, item.unit_price))
            .collect();
        parts.sort();

        let payload = format!(
            "{}-{}-{}-{}-{}-{}",
            self.schedule_id,
            self.room_id,
            self.start_time.timestamp_millis(),
            self.end_time.timestamp_millis(),
            self.total_amount,
            parts.join("|"),
        );

        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Build the display invoice code from a venue-local instant: "#DDMMHHmm"
pub fn invoice_code(local_now: DateTime<Tz>) -> String {
    format!(
        "#{:02}{:02}{:02}{:02}",
        local_now.day(),
        local_now.month(),
        local_now.hour(),
        local_now.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn slot(start: &str, end: &str, price: Decimal) -> TimeSlot {
        TimeSlot {
            start: start.to_string(),
            end: end.to_string(),
            prices: vec![RoomTypeRate {
                room_type: "vip".to_string(),
                price,
            }],
        }
    }

    #[test]
    fn test_slot_contains_normal() {
        let s = slot("10:00", "17:00", dec!(100000));
        assert!(!s.contains(9 * 60 + 59));
        assert!(s.contains(10 * 60));
        assert!(s.contains(16 * 60 + 59));
        assert!(!s.contains(17 * 60));
    }

    #[test]
    fn test_slot_contains_wraparound() {
        let s = slot("22:00", "02:00", dec!(150000));
        assert!(s.wraps_midnight());
        assert!(s.contains(23 * 60));
        assert!(s.contains(60));
        assert!(s.contains(2 * 60));
        assert!(!s.contains(12 * 60));
    }

    #[test]
    fn test_slot_rate_case_insensitive() {
        let s = slot("10:00", "17:00", dec!(100000));
        assert_eq!(s.rate_for("VIP"), Some(dec!(100000)));
        assert_eq!(s.rate_for("small"), None);
    }

    #[test]
    fn test_promotion_scope_parsing() {
        let id = Uuid::new_v4();
        let promo = Promotion {
            id: Uuid::new_v4(),
            name: "VIP Tuesday".to_string(),
            discount_percentage: dec!(10),
            applies_to: "room".to_string(),
            applies_to_id: Some(id.to_string()),
            is_active: true,
        };
        assert_eq!(promo.scope(), Some(PromotionScope::Room(id)));

        let bad = Promotion {
            applies_to: "galaxy".to_string(),
            ..promo.clone()
        };
        assert_eq!(bad.scope(), None);
    }

    #[test]
    fn test_promotion_scope_matching() {
        let room_id = Uuid::new_v4();
        assert!(PromotionScope::All.matches(room_id, "vip"));
        assert!(PromotionScope::Room(room_id).matches(room_id, "small"));
        assert!(!PromotionScope::Room(Uuid::new_v4()).matches(room_id, "small"));
        assert!(PromotionScope::RoomType("VIP".to_string()).matches(room_id, "vip"));
    }

    #[test]
    fn test_invoice_code_format() {
        let local = VENUE_TZ.with_ymd_and_hms(2024, 3, 5, 9, 7, 30).unwrap();
        assert_eq!(invoice_code(local), "#05030907");
    }

    #[test]
    fn test_content_key_ignores_item_order() {
        let base = BillRecord {
            id: Uuid::new_v4(),
            schedule_id: Uuid::nil(),
            room_id: Uuid::nil(),
            items: Json(vec![
                BillItem {
                    description: "A".to_string(),
                    quantity: dec!(1),
                    unit_price: dec!(10000),
                    amount: dec!(10000),
                    discount_name: None,
                    discount_percentage: None,
                },
                BillItem {
                    description: "B".to_string(),
                    quantity: dec!(2),
                    unit_price: dec!(5000),
                    amount: dec!(10000),
                    discount_name: None,
                    discount_percentage: None,
                },
            ]),
            total_amount: dec!(20000),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            invoice_code: "#01011700".to_string(),
            payment_method: None,
            active_promotion: None,
            free_hour: None,
            gift: None,
            fnb_order: None,
            created_at: Utc::now(),
        };

        let mut reversed = base.clone();
        reversed.id = Uuid::new_v4();
        reversed.items.0.reverse();

        assert_eq!(base.content_key(), reversed.content_key());
    }

    #[test]
    fn test_content_key_differs_on_total() {
        let a = BillRecord {
            id: Uuid::new_v4(),
            schedule_id: Uuid::nil(),
            room_id: Uuid::nil(),
            items: Json(vec![]),
            total_amount: dec!(20000),
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            invoice_code: "#01011700".to_string(),
            payment_method: None,
            active_promotion: None,
            free_hour: None,
            gift: None,
            fnb_order: None,
            created_at: Utc::now(),
        };
        let mut b = a.clone();
        b.total_amount = dec!(30000);

        assert_ne!(a.content_key(), b.content_key());
    }
}
