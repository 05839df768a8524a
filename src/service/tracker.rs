use std::collections::HashMap;

use chrono::NaiveDate;

pub const DEFAULT_START_HOUR: f64 = 8.0;

/// Next free start per calendar day, for the lifetime of one session.
/// Slots are whole minutes past midnight.
#[derive(Debug, Clone)]
pub struct DayTracker {
    next: HashMap<NaiveDate, i64>,
    default_start: i64,
}

impl Default for DayTracker {
    fn default() -> Self {
        Self::new(DEFAULT_START_HOUR)
    }
}

impl DayTracker {
    pub fn new(default_start: f64) -> Self {
        Self {
            next: HashMap::new(),
            default_start: to_minutes(default_start),
        }
    }

    pub fn next_start(&self, date: NaiveDate) -> f64 {
        from_minutes(self.next_start_minutes(date))
    }

    fn next_start_minutes(&self, date: NaiveDate) -> i64 {
        self.next.get(&date).copied().unwrap_or(self.default_start)
    }

    /// Pick the start hour for an entry on `date` and move the day's slot to
    /// `start + hours`. A manual `start_override` wins over the tracked value.
    pub fn reserve(&mut self, date: NaiveDate, start_override: Option<f64>, hours: f64) -> f64 {
        let start = start_override
            .map(to_minutes)
            .unwrap_or_else(|| self.next_start_minutes(date));
        self.next.insert(date, start + to_minutes(hours));
        from_minutes(start)
    }
}

/// Hours to whole minutes, rounded to the nearest minute.
pub fn to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

fn from_minutes(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

/// `HH:MM` for an hour-of-day float, rounded to the nearest minute.
pub fn format_clock(hour: f64) -> String {
    let total_min = to_minutes(hour).max(0);
    format!("{:02}:{:02}", total_min / 60, total_min % 60)
}

/// Parse a 24h `HH:MM` value into an hour float. `None` when malformed or out of range.
pub fn parse_clock(raw: &str) -> Option<f64> {
    let (h, m) = raw.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    (h < 24 && m < 60).then(|| f64::from(h) + f64::from(m) / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn unseen_day_starts_at_default() {
        let tracker = DayTracker::default();
        assert_eq!(tracker.next_start(day(1)), 8.0);
    }

    #[test]
    fn reservations_advance_by_entered_hours() {
        let mut tracker = DayTracker::default();
        assert_eq!(tracker.reserve(day(1), None, 1.5), 8.0);
        assert_eq!(tracker.reserve(day(1), None, 2.0), 9.5);
        assert_eq!(tracker.reserve(day(1), None, 0.25), 11.5);
        assert_eq!(tracker.next_start(day(1)), 11.75);
    }

    #[test]
    fn days_are_tracked_independently() {
        let mut tracker = DayTracker::default();
        tracker.reserve(day(1), None, 3.0);
        assert_eq!(tracker.next_start(day(2)), 8.0);
        assert_eq!(tracker.reserve(day(2), None, 1.0), 8.0);
        assert_eq!(tracker.next_start(day(1)), 11.0);
    }

    #[test]
    fn manual_start_overrides_and_moves_slot() {
        let mut tracker = DayTracker::default();
        tracker.reserve(day(1), None, 1.0);
        assert_eq!(tracker.reserve(day(1), Some(13.0), 2.0), 13.0);
        assert_eq!(tracker.next_start(day(1)), 15.0);
    }

    #[test]
    fn custom_default_start() {
        let mut tracker = DayTracker::new(7.5);
        assert_eq!(tracker.reserve(day(1), None, 1.0), 7.5);
        assert_eq!(tracker.next_start(day(1)), 8.5);
    }

    #[test]
    fn clock_parse_and_format() {
        assert_eq!(parse_clock("08:00"), Some(8.0));
        assert_eq!(parse_clock(" 13:45 "), Some(13.75));
        assert_eq!(parse_clock("9:30"), Some(9.5));
        assert_eq!(parse_clock("24:00"), None);
        assert_eq!(parse_clock("12:60"), None);
        assert_eq!(parse_clock("1230"), None);
        assert_eq!(parse_clock("ab:cd"), None);

        assert_eq!(format_clock(9.5), "09:30");
        assert_eq!(format_clock(11.75), "11:45");
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(8.0 + 0.2), "08:12");
        assert_eq!(format_clock(9.0 + 1.0 / 3.0), "09:20");
    }

    #[test]
    fn fractional_hours_accumulate_in_whole_minutes() {
        let mut tracker = DayTracker::default();
        assert_eq!(format_clock(tracker.reserve(day(1), None, 0.2)), "08:00");
        assert_eq!(format_clock(tracker.reserve(day(1), None, 0.2)), "08:12");
        assert_eq!(format_clock(tracker.next_start(day(1))), "08:24");
        assert_eq!(to_minutes(tracker.next_start(day(1))), 8 * 60 + 24);
    }
}
