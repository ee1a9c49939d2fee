use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;

/// Count the days in the inclusive range `[start, end]` that are not
/// Saturday, not Sunday, and not in the holiday set.
///
/// `end < start` yields 0, not an error. Day granularity only; callers
/// hand in plain calendar dates so there is no time zone to disagree on.
pub fn count_working_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> i64 {
    if end < start {
        return 0;
    }

    let mut days = 0;
    let mut d = start;
    while d <= end {
        let dow = d.weekday();
        if dow != Weekday::Sat && dow != Weekday::Sun && !holidays.contains(&d) {
            days += 1;
        }
        d += Duration::days(1);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn holidays() -> HashSet<NaiveDate> {
        [date("2026-01-01"), date("2026-12-25")].into_iter().collect()
    }

    #[test]
    fn full_working_week() {
        // Mon 2026-01-05 .. Fri 2026-01-09
        assert_eq!(
            count_working_days(date("2026-01-05"), date("2026-01-09"), &holidays()),
            5
        );
    }

    #[test]
    fn reversed_range_is_zero() {
        assert_eq!(
            count_working_days(date("2026-01-09"), date("2026-01-05"), &holidays()),
            0
        );
    }

    #[test]
    fn weekend_only_range_is_zero() {
        // Sat 2026-01-03 .. Sun 2026-01-04
        assert_eq!(
            count_working_days(date("2026-01-03"), date("2026-01-04"), &holidays()),
            0
        );
    }

    #[test]
    fn holiday_is_excluded() {
        // Tue Dec 30, Wed Dec 31, Thu Jan 1 (holiday), Fri Jan 2
        assert_eq!(
            count_working_days(date("2025-12-30"), date("2026-01-02"), &holidays()),
            3
        );
    }

    #[test]
    fn single_working_day() {
        assert_eq!(
            count_working_days(date("2026-01-05"), date("2026-01-05"), &holidays()),
            1
        );
    }

    #[test]
    fn range_spanning_weekend() {
        // Fri 2026-01-02 .. Mon 2026-01-05: Fri and Mon count, Sat/Sun do not
        assert_eq!(
            count_working_days(date("2026-01-02"), date("2026-01-05"), &holidays()),
            2
        );
    }

    #[test]
    fn empty_holiday_set() {
        let none = HashSet::new();
        assert_eq!(
            count_working_days(date("2025-12-29"), date("2026-01-02"), &none),
            5
        );
    }
}
