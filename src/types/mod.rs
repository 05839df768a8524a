pub mod entry;
pub mod payload;

pub use entry::{EntryForm, TimeEntry};
pub use payload::TimeEntryPayload;
