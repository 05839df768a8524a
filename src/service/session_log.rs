use std::fmt;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: String,
    pub at: DateTime<Local>,
    pub ticket_id: String,
    pub hours: Option<f64>,
    pub message: String,
    pub is_error: bool,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_error { "ERR" } else { " OK" };
        write!(f, "[{}] {mark} {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Outcomes of this session's submissions, newest first.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, id: &str, ticket_id: u64, hours: f64, message: &str) -> &LogEntry {
        self.push(LogEntry {
            id: id.to_string(),
            at: Local::now(),
            ticket_id: ticket_id.to_string(),
            hours: Some(hours),
            message: format!("Ticket #{ticket_id} ({hours}h) - {message}"),
            is_error: false,
        })
    }

    pub fn record_failure(&mut self, id: &str, ticket_id: &str, hours: Option<f64>, message: &str) -> &LogEntry {
        self.push(LogEntry {
            id: id.to_string(),
            at: Local::now(),
            ticket_id: ticket_id.to_string(),
            hours,
            message: format!("Error on ticket #{ticket_id}: {message}"),
            is_error: true,
        })
    }

    fn push(&mut self, entry: LogEntry) -> &LogEntry {
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.is_error).count()
    }
}
