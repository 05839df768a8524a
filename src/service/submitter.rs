use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::api::{ManageApi, build_http_client};
use crate::config::Config;
use crate::error::TimecardError;
use crate::service::session_log::SessionLog;
use crate::service::tracker::{DayTracker, format_clock, parse_clock};
use crate::settings::Settings;
use crate::types::entry::{TimeEntry, short_id, utc_window};
use crate::types::{EntryForm, TimeEntryPayload};

pub const SUCCESS_NOTICE: &str = "Entry registered successfully";

/// What the front end shows after a submit: a transient notice plus the
/// line that went into the session log.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub success: bool,
    pub notice: String,
    pub log_line: String,
    /// Local `HH:MM` the entry started at, when it got that far.
    pub start: Option<String>,
    /// Suggested start for the next entry on the same day.
    pub next_start: Option<String>,
}

struct Prepared {
    entry: TimeEntry,
    start_hour: f64,
    payload: TimeEntryPayload,
}

/// One technician session: settings, API client, day tracker and log.
pub struct TimeEntryService {
    settings: Settings,
    api: ManageApi,
    tracker: DayTracker,
    log: SessionLog,
}

impl TimeEntryService {
    pub fn new(cfg: &Config, settings: Settings) -> Result<Self, TimecardError> {
        let client = build_http_client(cfg)?;
        let api = ManageApi::new(client, &settings)?;
        Ok(Self::with_parts(
            settings,
            api,
            DayTracker::new(cfg.default_start_hour),
        ))
    }

    pub fn with_parts(settings: Settings, api: ManageApi, tracker: DayTracker) -> Self {
        Self {
            settings,
            api,
            tracker,
            log: SessionLog::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tracker(&self) -> &DayTracker {
        &self.tracker
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn next_start(&self, date: NaiveDate) -> String {
        format_clock(self.tracker.next_start(date))
    }

    pub async fn submit(&mut self, form: &EntryForm) -> SubmitReport {
        self.submit_at(form, Local::now().date_naive()).await
    }

    /// Validate, reserve the slot, POST once and record the outcome. Failures
    /// never escape: they come back as a report and a session log entry.
    pub async fn submit_at(&mut self, form: &EntryForm, today: NaiveDate) -> SubmitReport {
        let Prepared {
            entry,
            start_hour,
            payload,
        } = match self.prepare(form, today) {
            Ok(prepared) => prepared,
            Err(e) => {
                let hours = form.hours.trim().parse::<f64>().ok();
                return self.fail(&short_id(), form.ticket_id.trim(), hours, None, None, e);
            }
        };

        let start = Some(format_clock(start_hour));
        let next_start = Some(self.next_start(entry.date));

        match self.api.post_time_entry(&payload).await {
            Ok(message) => {
                let log_line = self
                    .log
                    .record_success(&entry.id, entry.ticket_id, entry.hours, &message)
                    .message
                    .clone();
                info!(
                    entry_id = %entry.id,
                    ticket_id = entry.ticket_id,
                    hours = entry.hours,
                    date = %entry.date,
                    start = %payload.time_start,
                    "time entry submitted"
                );
                SubmitReport {
                    success: true,
                    notice: SUCCESS_NOTICE.to_string(),
                    log_line,
                    start,
                    next_start,
                }
            }
            Err(e) => self.fail(
                &entry.id,
                &entry.ticket_id.to_string(),
                Some(entry.hours),
                start,
                next_start,
                e,
            ),
        }
    }

    fn prepare(&mut self, form: &EntryForm, today: NaiveDate) -> Result<Prepared, TimecardError> {
        let missing = self.settings.missing_fields();
        if !missing.is_empty() {
            return Err(TimecardError::IncompleteSettings(missing));
        }

        let entry = TimeEntry::from_form(form, today)?;

        let start_override = match form.start.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let parsed = parse_clock(raw);
                if parsed.is_none() {
                    warn!(start = raw, "ignoring malformed start time; using tracked slot");
                }
                parsed
            }
            _ => None,
        };

        let planned = start_override.unwrap_or_else(|| self.tracker.next_start(entry.date));
        let (start, end) = utc_window(
            entry.date,
            planned,
            entry.hours,
            self.settings.timezone_offset,
        )?;

        // The slot moves before the request goes out, even if it later fails.
        let start_hour = self.tracker.reserve(entry.date, start_override, entry.hours);
        let payload = TimeEntryPayload::build(&self.settings, &entry, start, end);

        Ok(Prepared {
            entry,
            start_hour,
            payload,
        })
    }

    fn fail(
        &mut self,
        id: &str,
        ticket_id: &str,
        hours: Option<f64>,
        start: Option<String>,
        next_start: Option<String>,
        err: TimecardError,
    ) -> SubmitReport {
        let notice = err.user_message();
        warn!(entry_id = id, ticket_id, error = %err, "time entry failed");
        let log_line = self
            .log
            .record_failure(id, ticket_id, hours, &notice)
            .message
            .clone();
        SubmitReport {
            success: false,
            notice,
            log_line,
            start,
            next_start,
        }
    }
}
