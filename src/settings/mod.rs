//! Settings module: user settings model and the file-backed store.
//!
//! Layout:
//! - `models.rs`: in-memory `Settings` and the on-disk `StoredSettings` shape
//! - `store.rs`: load/save with optional PIN encryption of the credentials

pub mod models;
pub mod store;

pub use models::{BillableOption, EntryFlags, Settings, StoredSecret, StoredSettings};
pub use store::SettingsStore;
