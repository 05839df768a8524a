pub mod session_log;
pub mod submitter;
pub mod tracker;

pub use session_log::{LogEntry, SessionLog};
pub use submitter::{SubmitReport, TimeEntryService};
pub use tracker::DayTracker;
