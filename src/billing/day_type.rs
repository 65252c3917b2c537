use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::billing::DayType;

/// Classify a venue-local date for rate selection
///
/// Holiday wins over the weekday/weekend split, so a holiday falling on a
/// Saturday bills at holiday rates. Total function: every date classifies.
pub fn determine_day_type(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> DayType {
    if holidays.contains(&date) {
        return DayType::Holiday;
    }

    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday() {
        // 2024-03-13 is a Wednesday
        assert_eq!(
            determine_day_type(date(2024, 3, 13), &HashSet::new()),
            DayType::Weekday
        );
    }

    #[test]
    fn test_weekend() {
        // 2024-03-16 is a Saturday, 2024-03-17 a Sunday
        assert_eq!(
            determine_day_type(date(2024, 3, 16), &HashSet::new()),
            DayType::Weekend
        );
        assert_eq!(
            determine_day_type(date(2024, 3, 17), &HashSet::new()),
            DayType::Weekend
        );
    }

    #[test]
    fn test_holiday_beats_weekend() {
        let holidays: HashSet<NaiveDate> = [date(2024, 3, 16)].into_iter().collect();
        assert_eq!(
            determine_day_type(date(2024, 3, 16), &holidays),
            DayType::Holiday
        );
    }

    #[test]
    fn test_holiday_on_weekday() {
        // 2024-09-02 is a Monday (National Day)
        let holidays: HashSet<NaiveDate> = [date(2024, 9, 2)].into_iter().collect();
        assert_eq!(
            determine_day_type(date(2024, 9, 2), &holidays),
            DayType::Holiday
        );
    }
}
