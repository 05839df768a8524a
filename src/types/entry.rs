use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::warn;

use crate::error::TimecardError;
use crate::service::tracker::{format_clock, to_minutes};

/// Upper bound for a single entry, inclusive. The lower bound (0) is exclusive.
pub const MAX_ENTRY_HOURS: f64 = 8.0;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const MINUTES_PER_DAY: i64 = 24 * 60;

/// Raw, unvalidated input as typed by the technician.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryForm {
    pub ticket_id: String,
    pub hours: String,
    pub notes: String,
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
    /// `HH:MM` (24h); the tracked next start when absent or malformed.
    pub start: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    /// Short local id used in the session log.
    pub id: String,
    pub ticket_id: u64,
    pub hours: f64,
    pub notes: String,
    pub date: NaiveDate,
}

impl TimeEntry {
    pub fn from_form(form: &EntryForm, today: NaiveDate) -> Result<Self, TimecardError> {
        let ticket_id = parse_ticket_id(&form.ticket_id)?;

        let date = match form.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw)?,
            _ => today,
        };

        let hours = parse_hours(&form.hours)?;

        let notes = form.notes.trim();
        if notes.is_empty() {
            return Err(TimecardError::invalid("Please enter a description"));
        }

        let (earliest, latest) = allowed_window(today);
        if date < earliest || date > latest {
            warn!(
                %date,
                %earliest,
                %latest,
                "entry date is outside the current and previous month"
            );
        }

        Ok(Self {
            id: short_id(),
            ticket_id,
            hours,
            notes: notes.to_string(),
            date,
        })
    }
}

/// Eight hex characters, enough to tell session entries apart.
pub fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

pub fn parse_ticket_id(raw: &str) -> Result<u64, TimecardError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimecardError::invalid("Please enter a ticket ID"));
    }
    match trimmed.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(TimecardError::invalid(format!(
            "Ticket ID must be a positive number, got '{trimmed}'"
        ))),
    }
}

pub fn parse_hours(raw: &str) -> Result<f64, TimecardError> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TimecardError::invalid("Please enter a valid number of hours"))?;
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_ENTRY_HOURS {
        return Err(TimecardError::invalid(format!(
            "Hours must be greater than 0 and at most {MAX_ENTRY_HOURS}"
        )));
    }
    Ok(hours)
}

/// Strict `YYYY-MM-DD`: four-digit year, two-digit month and day.
pub fn parse_date(raw: &str) -> Result<NaiveDate, TimecardError> {
    let raw = raw.trim();
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(TimecardError::invalid("Please enter a valid date (YYYY-MM-DD)"));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| TimecardError::invalid("Please enter a valid date (YYYY-MM-DD)"))
}

/// First day of the previous month through `today`.
pub fn allowed_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (year, month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    let earliest = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
    (earliest, today)
}

/// Local `[start, start + hours)` on `date`, shifted to UTC.
///
/// `UTC = local - offset`: at UTC-4, 08:00 local is 12:00Z. Times are kept at
/// minute precision and the entry must end by 24:00 local time.
pub fn utc_window(
    date: NaiveDate,
    start_hour: f64,
    hours: f64,
    timezone_offset: f64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TimecardError> {
    if !start_hour.is_finite() || start_hour < 0.0 {
        return Err(TimecardError::invalid(format!(
            "Start time {start_hour} is outside the day"
        )));
    }
    let start_min = to_minutes(start_hour);
    let duration_min = to_minutes(hours);
    if start_min >= MINUTES_PER_DAY || start_min + duration_min > MINUTES_PER_DAY {
        return Err(TimecardError::invalid(format!(
            "Entry starting at {} for {hours}h would end after midnight",
            format_clock(start_hour)
        )));
    }

    let out_of_range = || TimecardError::invalid(format!("Date {date} is out of range"));
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(out_of_range)?;
    let offset = Duration::minutes(to_minutes(timezone_offset));
    let shift = |minutes: i64| {
        midnight
            .checked_add_signed(Duration::minutes(minutes))
            .and_then(|local| local.checked_sub_signed(offset))
            .map(|utc| utc.and_utc())
            .ok_or_else(out_of_range)
    };

    Ok((shift(start_min)?, shift(start_min + duration_min)?))
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form(ticket: &str, hours: &str, notes: &str) -> EntryForm {
        EntryForm {
            ticket_id: ticket.into(),
            hours: hours.into(),
            notes: notes.into(),
            ..EntryForm::default()
        }
    }

    #[test]
    fn hours_must_be_in_half_open_range() {
        assert!(parse_hours("0").is_err());
        assert!(parse_hours("-1").is_err());
        assert!(parse_hours("8.01").is_err());
        assert!(parse_hours("NaN").is_err());
        assert!(parse_hours("abc").is_err());
        assert_eq!(parse_hours("8").unwrap(), 8.0);
        assert_eq!(parse_hours(" 0.25 ").unwrap(), 0.25);
    }

    #[test]
    fn ticket_id_must_be_numeric() {
        assert!(parse_ticket_id("").is_err());
        assert!(parse_ticket_id("12a").is_err());
        assert!(parse_ticket_id("0").is_err());
        assert_eq!(parse_ticket_id(" 12345 ").unwrap(), 12345);
    }

    #[test]
    fn form_defaults_date_to_today_and_trims_notes() {
        let today = day(2024, 3, 14);
        let entry = TimeEntry::from_form(&form("555", "1.5", "  fixed printer \n"), today).unwrap();
        assert_eq!(entry.ticket_id, 555);
        assert_eq!(entry.hours, 1.5);
        assert_eq!(entry.notes, "fixed printer");
        assert_eq!(entry.date, today);
        assert_eq!(entry.id.len(), 8);
    }

    #[test]
    fn form_rejects_blank_notes_and_bad_dates() {
        let today = day(2024, 3, 14);
        assert!(TimeEntry::from_form(&form("1", "1", "   "), today).is_err());

        let mut bad_date = form("1", "1", "x");
        bad_date.date = Some("14/03/2024".into());
        assert!(TimeEntry::from_form(&bad_date, today).is_err());
    }

    #[test]
    fn dates_outside_window_are_still_accepted() {
        let today = day(2024, 3, 14);
        let mut old = form("1", "1", "x");
        old.date = Some("2023-12-01".into());
        let entry = TimeEntry::from_form(&old, today).unwrap();
        assert_eq!(entry.date, day(2023, 12, 1));
    }

    #[test]
    fn window_spans_previous_month_across_year_boundary() {
        assert_eq!(
            allowed_window(day(2024, 1, 20)),
            (day(2023, 12, 1), day(2024, 1, 20))
        );
        assert_eq!(
            allowed_window(day(2024, 7, 3)),
            (day(2024, 6, 1), day(2024, 7, 3))
        );
    }

    #[test]
    fn utc_window_subtracts_negative_offset() {
        let (start, end) = utc_window(day(2024, 3, 14), 8.0, 1.5, -4.0).unwrap();
        assert_eq!(format_timestamp(start), "2024-03-14T12:00:00Z");
        assert_eq!(format_timestamp(end), "2024-03-14T13:30:00Z");
    }

    #[test]
    fn utc_window_handles_positive_and_fractional_offsets() {
        let (start, end) = utc_window(day(2024, 3, 14), 2.0, 1.0, 5.5).unwrap();
        assert_eq!(format_timestamp(start), "2024-03-13T20:30:00Z");
        assert_eq!(format_timestamp(end), "2024-03-13T21:30:00Z");
    }

    #[test]
    fn utc_window_rolls_into_next_utc_day() {
        let (start, end) = utc_window(day(2024, 3, 14), 21.5, 2.0, -5.0).unwrap();
        assert_eq!(format_timestamp(start), "2024-03-15T02:30:00Z");
        assert_eq!(format_timestamp(end), "2024-03-15T04:30:00Z");
    }

    #[test]
    fn utc_window_rejects_entries_past_midnight() {
        assert!(utc_window(day(2024, 3, 14), 20.0, 4.5, -4.0).is_err());
        assert!(utc_window(day(2024, 3, 14), 20.0, 4.0, -4.0).is_ok());
        assert!(utc_window(day(2024, 3, 14), -1.0, 1.0, -4.0).is_err());
    }

    #[test]
    fn utc_window_at_calendar_edges_is_an_error_not_a_panic() {
        assert!(utc_window(NaiveDate::MAX, 22.0, 1.0, -4.0).is_err());
        assert!(utc_window(NaiveDate::MIN, 0.0, 1.0, 4.0).is_err());
    }

    #[test]
    fn date_must_be_exactly_yyyy_mm_dd() {
        assert!(parse_date("+262142-12-31").is_err());
        assert!(parse_date("-0001-01-01").is_err());
        assert!(parse_date("2024-3-14").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert_eq!(parse_date(" 2024-03-14 ").unwrap(), day(2024, 3, 14));
    }

    #[test]
    fn utc_window_rounds_to_minutes() {
        let third = 1.0 / 3.0;
        let (start, end) = utc_window(day(2024, 3, 14), 9.0 + third, third, 0.0).unwrap();
        assert_eq!(format_timestamp(start), "2024-03-14T09:20:00Z");
        assert_eq!(format_timestamp(end), "2024-03-14T09:40:00Z");
    }
}
