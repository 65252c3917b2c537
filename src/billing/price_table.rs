// Time-of-day rate lookup against a day-type's slot table

use rust_decimal::Decimal;

use crate::billing::error::BillingError;
use crate::billing::{DayType, TimeSlot};

/// Find the slot covering a venue-local minute of day
///
/// Slots are scanned in declaration order; the first match wins. When no slot
/// matches (gappy legacy tables) the first slot is the permissive fallback so
/// a session is never unpriceable just because the table has holes.
pub(crate) fn find_slot(slots: &[TimeSlot], minute_of_day: u32) -> Option<&TimeSlot> {
    slots
        .iter()
        .find(|slot| slot.contains(minute_of_day))
        .or_else(|| slots.first())
}

/// Hourly rate for a room type at a venue-local minute of day
///
/// Point-in-time counterpart of the partitioner, which walks whole slot
/// tables; this backs the single-instant lookup contract.
pub(crate) fn unit_price(
    slots: &[TimeSlot],
    day_type: DayType,
    room_type: &str,
    minute_of_day: u32,
) -> Result<Decimal, BillingError> {
    let slot = find_slot(slots, minute_of_day)
        .ok_or(BillingError::PriceTableNotFound(day_type))?;

    slot.rate_for(room_type).ok_or(BillingError::RateNotFound {
        day_type,
        room_type: room_type.to_string(),
    })
}

/// The slot with the latest end bound, used for carry-over pricing
/// past midnight
pub fn last_ending_slot(slots: &[TimeSlot]) -> Option<&TimeSlot> {
    slots.iter().max_by_key(|slot| {
        if slot.wraps_midnight() {
            // A wrap slot ends on the next day
            slot.end_minutes().map(|e| e + 24 * 60)
        } else {
            slot.end_minutes()
        }
        .unwrap_or(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::RoomTypeRate;
    use rust_decimal_macros::dec;

    fn slots() -> Vec<TimeSlot> {
        vec![
            TimeSlot {
                start: "10:00".to_string(),
                end: "17:00".to_string(),
                prices: vec![RoomTypeRate {
                    room_type: "vip".to_string(),
                    price: dec!(100000),
                }],
            },
            TimeSlot {
                start: "17:00".to_string(),
                end: "00:00".to_string(),
                prices: vec![RoomTypeRate {
                    room_type: "vip".to_string(),
                    price: dec!(150000),
                }],
            },
        ]
    }

    #[test]
    fn test_find_slot_matches() {
        let slots = slots();
        assert_eq!(find_slot(&slots, 12 * 60).unwrap().start, "10:00");
        assert_eq!(find_slot(&slots, 20 * 60).unwrap().start, "17:00");
    }

    #[test]
    fn test_find_slot_falls_back_to_first() {
        // 03:00 is in neither slot
        let slots = slots();
        assert_eq!(find_slot(&slots, 3 * 60).unwrap().start, "10:00");
    }

    #[test]
    fn test_find_slot_empty_table() {
        assert!(find_slot(&[], 12 * 60).is_none());
    }

    #[test]
    fn test_unit_price_known_rate() {
        let price = unit_price(&slots(), DayType::Weekday, "vip", 12 * 60).unwrap();
        assert_eq!(price, dec!(100000));
    }

    #[test]
    fn test_unit_price_missing_room_type() {
        let err = unit_price(&slots(), DayType::Weekday, "small", 12 * 60).unwrap_err();
        assert!(matches!(err, BillingError::RateNotFound { .. }));
    }

    #[test]
    fn test_unit_price_empty_table() {
        let err = unit_price(&[], DayType::Weekend, "vip", 12 * 60).unwrap_err();
        assert!(matches!(err, BillingError::PriceTableNotFound(DayType::Weekend)));
    }

    #[test]
    fn test_last_ending_slot_prefers_wrap() {
        let mut slots = slots();
        slots.push(TimeSlot {
            start: "22:00".to_string(),
            end: "02:00".to_string(),
            prices: vec![RoomTypeRate {
                room_type: "vip".to_string(),
                price: dec!(200000),
            }],
        });
        assert_eq!(last_ending_slot(&slots).unwrap().start, "22:00");
    }

    #[test]
    fn test_last_ending_slot_normal() {
        assert_eq!(last_ending_slot(&slots()).unwrap().start, "17:00");
    }
}
