// Pure session partitioning and free-hour accounting
//
// Everything here is computed from in-memory inputs so the whole billing core
// is testable without a database.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::billing::day_type::determine_day_type;
use crate::billing::error::BillingError;
use crate::billing::price_table::last_ending_slot;
use crate::billing::{DayType, TimeSlot, VENUE_TZ};

/// Free-hour promotion parameters
pub const FREE_HOUR_BUDGET_MINUTES: i64 = 60;
pub const FREE_HOUR_MIN_FNB_VND: i64 = 35_000;
pub const FREE_HOUR_MIN_DURATION_MINUTES: i64 = 120;
const PROMO_WINDOW_START_MINUTE: u32 = 10 * 60;
const PROMO_WINDOW_END_MINUTE: u32 = 19 * 60;

const SECONDS_PER_HOUR: i64 = 3600;

/// Everything the partitioner needs to price a session
pub struct PricingContext {
    pub tables: HashMap<DayType, Vec<TimeSlot>>,
    pub holidays: HashSet<NaiveDate>,
    pub room_type: String,
}

/// A billed sub-interval of the session at a single hourly rate
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub rate: Decimal,
}

impl Segment {
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Fee from exact seconds; display rounding happens separately
    pub fn fee(&self) -> Decimal {
        Decimal::from(self.seconds()) / Decimal::from(SECONDS_PER_HOUR) * self.rate
    }

    /// Hour quantity as shown on the bill line, rounded to 2 decimals
    pub fn display_hours(&self) -> Decimal {
        calculate_hours(
            self.start.with_timezone(&Utc),
            self.end.with_timezone(&Utc),
        )
    }
}

/// Duration between two instants in hours, at minute granularity,
/// rounded to 2 decimals
///
/// Returns a fixed 0.5 fallback when `end` precedes `start` so a degenerate
/// range never produces a negative duration.
pub fn calculate_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let start = truncate_minute_utc(start);
    let end = truncate_minute_utc(end);

    if end < start {
        return Decimal::new(5, 1);
    }

    (Decimal::from((end - start).num_seconds()) / Decimal::from(SECONDS_PER_HOUR)).round_dp(2)
}

/// Session duration in whole minutes, rounded up
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds().max(0);
    (seconds + 59) / 60
}

fn truncate_minute_utc(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// A venue-local wall-clock instant on a given date
fn localize(date: NaiveDate, minute_of_day: u32) -> Result<DateTime<Tz>, BillingError> {
    let naive = date
        .and_hms_opt(minute_of_day / 60, minute_of_day % 60, 0)
        .ok_or_else(|| BillingError::InvalidTime(format!("minute {} on {}", minute_of_day, date)))?;

    VENUE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| BillingError::InvalidTime(format!("{} is not a valid local time", naive)))
}

/// Partition a session into rate segments
///
/// 1. Enumerate every venue-local calendar date the session touches
/// 2. Materialize each date's slots as absolute intervals; a slot wrapping
///    midnight ends on the next day
/// 3. Intersect with the session window, dropping empty pieces
/// 4. When the session runs past midnight beyond all slot coverage, the
///    leftover is billed at the previous day's last-ending slot rate
///    (carry-over), never rejected or billed at zero
/// 5. Sort by start: the result is an ordered, gapless partition whenever the
///    tables tile the day
pub fn partition_session(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    ctx: &PricingContext,
) -> Result<Vec<Segment>, BillingError> {
    let local_start = start.with_timezone(&VENUE_TZ);
    let local_end = end.with_timezone(&VENUE_TZ);

    if local_end <= local_start {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();

    let mut date = local_start.date_naive();
    let last_date = local_end.date_naive();
    while date <= last_date {
        let day_type = determine_day_type(date, &ctx.holidays);
        let slots = ctx
            .tables
            .get(&day_type)
            .filter(|slots| !slots.is_empty())
            .ok_or(BillingError::PriceTableNotFound(day_type))?;

        for slot in slots {
            let (Some(start_min), Some(end_min)) = (slot.start_minutes(), slot.end_minutes())
            else {
                tracing::warn!(
                    "Skipping malformed {} slot {:?}-{:?}",
                    day_type,
                    slot.start,
                    slot.end
                );
                continue;
            };

            let abs_start = localize(date, start_min)?;
            let abs_end = if end_min <= start_min {
                localize(date + Duration::days(1), end_min)?
            } else {
                localize(date, end_min)?
            };

            let seg_start = abs_start.max(local_start);
            let seg_end = abs_end.min(local_end);
            if seg_start >= seg_end {
                continue;
            }

            let rate = slot.rate_for(&ctx.room_type).ok_or_else(|| {
                BillingError::RateNotFound {
                    day_type,
                    room_type: ctx.room_type.clone(),
                }
            })?;

            segments.push(Segment {
                start: seg_start,
                end: seg_end,
                rate,
            });
        }

        date += Duration::days(1);
    }

    // Carry-over: an overnight tail past all slot coverage keeps the previous
    // day's closing rate
    if last_date > local_start.date_naive() {
        let covered_end = segments.iter().map(|s| s.end).max();
        if covered_end.map_or(true, |ce| ce < local_end) {
            let midnight = localize(last_date, 0)?;
            let tail_start = covered_end.map_or(midnight, |ce| ce.max(midnight));

            if tail_start < local_end {
                let prev_date = last_date - Duration::days(1);
                let prev_day_type = determine_day_type(prev_date, &ctx.holidays);
                let prev_slots = ctx
                    .tables
                    .get(&prev_day_type)
                    .filter(|slots| !slots.is_empty())
                    .ok_or(BillingError::PriceTableNotFound(prev_day_type))?;

                let closing_slot = last_ending_slot(prev_slots)
                    .ok_or(BillingError::PriceTableNotFound(prev_day_type))?;
                let rate = closing_slot.rate_for(&ctx.room_type).ok_or_else(|| {
                    BillingError::RateNotFound {
                        day_type: prev_day_type,
                        room_type: ctx.room_type.clone(),
                    }
                })?;

                segments.push(Segment {
                    start: tail_start,
                    end: local_end,
                    rate,
                });
            }
        }
    }

    segments.sort_by_key(|s| s.start);
    Ok(segments)
}

/// Running free-hour state threaded through the segment fold
#[derive(Debug, Clone, PartialEq)]
pub struct FreeHourBudget {
    pub minutes_left: i64,
    pub minutes_applied: i64,
    pub amount: Decimal,
}

impl FreeHourBudget {
    pub fn new(total_minutes: i64) -> Self {
        Self {
            minutes_left: total_minutes,
            minutes_applied: 0,
            amount: Decimal::ZERO,
        }
    }

    /// Consume budget against one segment's overlap with the promo window
    ///
    /// The window is 10:00-19:00 on the segment's own local date; consumption
    /// is first-come-first-served across the sorted segments, valued at each
    /// segment's hourly rate.
    pub fn consume(&mut self, segment: &Segment) -> Result<(), BillingError> {
        if self.minutes_left <= 0 {
            return Ok(());
        }

        let date = segment.start.date_naive();
        let window_start = localize(date, PROMO_WINDOW_START_MINUTE)?;
        let window_end = localize(date, PROMO_WINDOW_END_MINUTE)?;

        let overlap_start = segment.start.max(window_start);
        let overlap_end = segment.end.min(window_end);
        if overlap_end <= overlap_start {
            return Ok(());
        }

        let overlap_seconds = (overlap_end - overlap_start).num_seconds();
        let overlap_minutes = (overlap_seconds + 59) / 60;
        let consumed = self.minutes_left.min(overlap_minutes);

        self.minutes_left -= consumed;
        self.minutes_applied += consumed;
        self.amount += Decimal::from(consumed) / Decimal::from(60) * segment.rate;

        Ok(())
    }
}

/// All three eligibility conditions for the free-hour promotion
pub fn free_hour_eligible(requested: bool, fnb_total: Decimal, session_minutes: i64) -> bool {
    requested
        && fnb_total >= Decimal::from(FREE_HOUR_MIN_FNB_VND)
        && session_minutes >= FREE_HOUR_MIN_DURATION_MINUTES
}

/// Fold the free-hour budget over the sorted segments
///
/// Returns the final accumulator; callers read minutes_applied and amount.
pub fn apply_free_hour(segments: &[Segment], eligible: bool) -> Result<FreeHourBudget, BillingError> {
    let mut budget = FreeHourBudget::new(if eligible { FREE_HOUR_BUDGET_MINUTES } else { 0 });

    for segment in segments {
        budget.consume(segment)?;
    }

    Ok(budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::RoomTypeRate;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn slot(start: &str, end: &str, rate: Decimal) -> TimeSlot {
        TimeSlot {
            start: start.to_string(),
            end: end.to_string(),
            prices: vec![RoomTypeRate {
                room_type: "medium".to_string(),
                price: rate,
            }],
        }
    }

    fn ctx(weekday: Vec<TimeSlot>) -> PricingContext {
        let mut tables = HashMap::new();
        tables.insert(DayType::Weekday, weekday.clone());
        tables.insert(DayType::Weekend, weekday);
        PricingContext {
            tables,
            holidays: HashSet::new(),
            room_type: "medium".to_string(),
        }
    }

    /// Wednesday 2024-03-13 at the given venue-local wall clock, as UTC
    fn at(h: u32, m: u32) -> DateTime<Utc> {
        VENUE_TZ
            .with_ymd_and_hms(2024, 3, 13, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn next_day_at(h: u32, m: u32) -> DateTime<Utc> {
        VENUE_TZ
            .with_ymd_and_hms(2024, 3, 14, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_single_slot_session() {
        let ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        let segments = partition_session(at(10, 0), at(12, 0), &ctx).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].display_hours(), dec!(2.00));
        assert_eq!(segments[0].fee(), dec!(200000));
    }

    #[test]
    fn test_partition_completeness_across_slots() {
        let ctx = ctx(vec![
            slot("10:00", "17:00", dec!(100000)),
            slot("17:00", "00:00", dec!(150000)),
        ]);
        let segments = partition_session(at(16, 0), at(18, 0), &ctx).unwrap();

        assert_eq!(segments.len(), 2);
        let total_seconds: i64 = segments.iter().map(|s| s.seconds()).sum();
        assert_eq!(total_seconds, 2 * 3600);
        assert_eq!(segments[0].rate, dec!(100000));
        assert_eq!(segments[1].rate, dec!(150000));

        let total_fee: Decimal = segments.iter().map(|s| s.fee()).sum();
        assert_eq!(total_fee, dec!(250000));
    }

    #[test]
    fn test_segments_sorted_and_gapless() {
        let ctx = ctx(vec![
            slot("17:00", "00:00", dec!(150000)),
            slot("10:00", "17:00", dec!(100000)),
        ]);
        let segments = partition_session(at(15, 0), at(20, 0), &ctx).unwrap();

        assert_eq!(segments.len(), 2);
        assert!(segments[0].start < segments[1].start);
        assert_eq!(segments[0].end, segments[1].start);
    }

    #[test]
    fn test_overnight_carry_over_uses_closing_rate() {
        // No slot covers 00:00-01:00; the tail keeps the 18:00-00:00 rate
        let ctx = ctx(vec![
            slot("10:00", "18:00", dec!(100000)),
            slot("18:00", "00:00", dec!(150000)),
        ]);
        let segments = partition_session(at(23, 0), next_day_at(1, 0), &ctx).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].rate, dec!(150000));
        assert_eq!(segments[1].rate, dec!(150000));
        assert_eq!(segments[1].seconds(), 3600);

        let total_seconds: i64 = segments.iter().map(|s| s.seconds()).sum();
        assert_eq!(total_seconds, 2 * 3600);
    }

    #[test]
    fn test_wraparound_slot_covers_past_midnight() {
        let ctx = ctx(vec![
            slot("10:00", "22:00", dec!(100000)),
            slot("22:00", "02:00", dec!(200000)),
        ]);
        let segments = partition_session(at(23, 0), next_day_at(1, 0), &ctx).unwrap();

        // The wrap slot covers the whole session; no carry-over segment
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].rate, dec!(200000));
        assert_eq!(segments[0].seconds(), 2 * 3600);
    }

    #[test]
    fn test_empty_session() {
        let ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        let segments = partition_session(at(12, 0), at(12, 0), &ctx).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn test_missing_price_table() {
        let ctx = PricingContext {
            tables: HashMap::new(),
            holidays: HashSet::new(),
            room_type: "medium".to_string(),
        };
        let err = partition_session(at(10, 0), at(12, 0), &ctx).unwrap_err();
        assert!(matches!(err, BillingError::PriceTableNotFound(_)));
    }

    #[test]
    fn test_missing_room_type_rate() {
        let mut ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        ctx.room_type = "vip".to_string();
        let err = partition_session(at(10, 0), at(12, 0), &ctx).unwrap_err();
        assert!(matches!(err, BillingError::RateNotFound { .. }));
    }

    #[test]
    fn test_calculate_hours_normal() {
        assert_eq!(calculate_hours(at(10, 0), at(12, 0)), dec!(2.00));
        assert_eq!(calculate_hours(at(10, 0), at(10, 30)), dec!(0.50));
    }

    #[test]
    fn test_calculate_hours_rounding() {
        // 1h40m = 1.666... -> 1.67
        assert_eq!(calculate_hours(at(10, 0), at(11, 40)), dec!(1.67));
    }

    #[test]
    fn test_calculate_hours_inverted_range_fallback() {
        assert_eq!(calculate_hours(at(12, 0), at(10, 0)), dec!(0.5));
    }

    #[test]
    fn test_duration_minutes_rounds_up() {
        assert_eq!(duration_minutes(at(10, 0), at(12, 0)), 120);
        let with_seconds = at(10, 0) + Duration::seconds(61);
        assert_eq!(duration_minutes(at(10, 0), with_seconds), 2);
    }

    #[test]
    fn test_free_hour_eligibility() {
        assert!(free_hour_eligible(true, dec!(35000), 120));
        assert!(!free_hour_eligible(false, dec!(35000), 120));
        assert!(!free_hour_eligible(true, dec!(34999), 120));
        assert!(!free_hour_eligible(true, dec!(35000), 119));
    }

    #[test]
    fn test_free_hour_credit_inside_window() {
        let ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        let segments = partition_session(at(10, 0), at(12, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, true).unwrap();
        assert_eq!(budget.minutes_applied, 60);
        assert_eq!(budget.amount, dec!(100000));
    }

    #[test]
    fn test_free_hour_budget_capped_at_60() {
        let ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        let segments = partition_session(at(10, 0), at(17, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, true).unwrap();
        assert_eq!(budget.minutes_applied, 60);
        assert_eq!(budget.minutes_left, 0);
    }

    #[test]
    fn test_free_hour_outside_window() {
        let ctx = ctx(vec![
            slot("10:00", "19:00", dec!(100000)),
            slot("19:00", "00:00", dec!(150000)),
        ]);
        let segments = partition_session(at(20, 0), at(22, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, true).unwrap();
        assert_eq!(budget.minutes_applied, 0);
        assert_eq!(budget.amount, Decimal::ZERO);
    }

    #[test]
    fn test_free_hour_partial_window_overlap() {
        let ctx = ctx(vec![
            slot("10:00", "19:00", dec!(100000)),
            slot("19:00", "00:00", dec!(150000)),
        ]);
        // 18:30-20:00: only 30 minutes fall inside the window
        let segments = partition_session(at(18, 30), at(20, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, true).unwrap();
        assert_eq!(budget.minutes_applied, 30);
        assert_eq!(budget.amount, dec!(50000));
    }

    #[test]
    fn test_free_hour_not_eligible() {
        let ctx = ctx(vec![slot("10:00", "19:00", dec!(100000))]);
        let segments = partition_session(at(10, 0), at(12, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, false).unwrap();
        assert_eq!(budget.minutes_applied, 0);
        assert_eq!(budget.amount, Decimal::ZERO);
    }

    #[test]
    fn test_free_hour_spreads_across_segments() {
        let ctx = ctx(vec![
            slot("10:00", "12:30", dec!(100000)),
            slot("12:30", "19:00", dec!(200000)),
        ]);
        // 12:00-14:00: 30 min at 100k, remaining 30 min at 200k
        let segments = partition_session(at(12, 0), at(14, 0), &ctx).unwrap();

        let budget = apply_free_hour(&segments, true).unwrap();
        assert_eq!(budget.minutes_applied, 60);
        assert_eq!(budget.amount, dec!(50000) + dec!(100000));
    }
}
