//! Command handlers behind the `cwm-timecard` subcommands.
//!
//! Each handler writes its human-readable output to a caller-supplied writer
//! so the binary can hand it stdout and tests can hand it a buffer.

pub mod configure;
pub mod session;
pub mod show;
pub mod submit;

pub use configure::{ConfigureOutcome, configure};
pub use session::run_session;
pub use show::render_settings;
pub use submit::{print_report, submit_once};
