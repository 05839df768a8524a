pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod service;
pub mod settings;
pub mod types;

pub use error::TimecardError;
pub use service::TimeEntryService;
pub use settings::{Settings, SettingsStore};
