use std::path::PathBuf;

use tracing::info;

use crate::cli::ConfigureArgs;
use crate::error::TimecardError;
use crate::settings::SettingsStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigureOutcome {
    pub path: PathBuf,
    pub encrypted: bool,
    pub missing: Vec<String>,
}

/// Apply `args` to the stored settings and write them back.
///
/// Sealed credentials need `pin` to be read. `--new-pin` re-encrypts under a
/// fresh salt, `--remove-pin` writes the keys in plain text, and otherwise the
/// current `pin` (if any) is used to seal them.
pub fn configure(
    store: &SettingsStore,
    args: &ConfigureArgs,
    pin: Option<&str>,
) -> Result<ConfigureOutcome, TimecardError> {
    let mut settings = store.load(pin)?;
    args.apply(&mut settings)?;

    if args.remove_pin {
        store.save(&settings, None)?;
    } else if let Some(new_pin) = args.new_pin.as_deref() {
        store.rekey(&settings, new_pin)?;
        info!("credentials re-encrypted with a new PIN");
    } else {
        store.save(&settings, pin)?;
    }

    Ok(ConfigureOutcome {
        path: store.path().to_path_buf(),
        encrypted: store.is_locked()?,
        missing: settings.missing_fields(),
    })
}
