use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use tracing::{debug, info, warn};

use crate::crypto::{CredentialCipher, generate_salt};
use crate::error::TimecardError;
use crate::settings::models::{Settings, StoredSecret, StoredSettings, check_timezone_offset};

/// JSON file holding the user settings, credentials optionally PIN-encrypted.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw on-disk settings; defaults when the file does not exist yet.
    pub fn load_stored(&self) -> Result<StoredSettings, TimecardError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "settings file not found; using defaults");
            return Ok(StoredSettings::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn is_locked(&self) -> Result<bool, TimecardError> {
        Ok(self.load_stored()?.is_locked())
    }

    /// Load settings, decrypting credentials with the PIN when they are sealed.
    pub fn load(&self, pin: Option<&str>) -> Result<Settings, TimecardError> {
        let stored = self.load_stored()?;

        let cipher = if stored.is_locked() {
            let pin = pin.ok_or(TimecardError::CredentialsLocked)?;
            let salt_b64 = stored.salt.as_deref().ok_or_else(|| {
                TimecardError::Crypto("encrypted credentials without a stored salt".to_string())
            })?;
            let salt = STANDARD_NO_PAD.decode(salt_b64.as_bytes())?;
            Some(CredentialCipher::derive_from_pin(pin, &salt)?)
        } else {
            if pin.is_some() {
                debug!("PIN given but credentials are stored unencrypted");
            }
            None
        };

        let public_key = reveal(&stored.public_key, cipher.as_ref())?;
        let private_key = reveal(&stored.private_key, cipher.as_ref())?;

        Ok(Settings {
            company_id: stored.company_id,
            public_key,
            private_key,
            site_url: stored.site_url,
            member_id: stored.member_id,
            work_type: stored.work_type,
            billable_option: stored.billable_option,
            client_id: stored.client_id,
            timezone_offset: check_timezone_offset(stored.timezone_offset)?,
            flags: stored.flags,
        })
    }

    /// Persist settings. With a PIN the two credential fields are encrypted,
    /// reusing the existing salt when there is one; without, they are written
    /// in plain text and the salt is dropped.
    pub fn save(&self, settings: &Settings, pin: Option<&str>) -> Result<(), TimecardError> {
        self.save_inner(settings, pin, false)
    }

    /// Encrypt the credentials under a new PIN with a freshly generated salt.
    pub fn rekey(&self, settings: &Settings, new_pin: &str) -> Result<(), TimecardError> {
        self.save_inner(settings, Some(new_pin), true)
    }

    fn save_inner(
        &self,
        settings: &Settings,
        pin: Option<&str>,
        fresh_salt: bool,
    ) -> Result<(), TimecardError> {
        let (public_key, private_key, salt) = match pin {
            Some(pin) => {
                let salt = match self.existing_salt().filter(|_| !fresh_salt) {
                    Some(salt) => salt,
                    None => generate_salt().to_vec(),
                };
                let cipher = CredentialCipher::derive_from_pin(pin, &salt)?;
                (
                    StoredSecret::Encrypted(cipher.encrypt_str(&settings.public_key)?),
                    StoredSecret::Encrypted(cipher.encrypt_str(&settings.private_key)?),
                    Some(STANDARD_NO_PAD.encode(&salt)),
                )
            }
            None => (
                StoredSecret::Plain(settings.public_key.clone()),
                StoredSecret::Plain(settings.private_key.clone()),
                None,
            ),
        };

        let stored = StoredSettings {
            company_id: settings.company_id.clone(),
            public_key,
            private_key,
            site_url: settings.site_url.clone(),
            member_id: settings.member_id.clone(),
            work_type: settings.work_type.clone(),
            billable_option: settings.billable_option,
            client_id: settings.client_id.clone(),
            timezone_offset: settings.timezone_offset,
            flags: settings.flags,
            salt,
        };

        self.write(&stored)?;
        info!(
            path = %self.path.display(),
            encrypted = stored.is_locked(),
            "settings saved"
        );
        Ok(())
    }

    /// Salt from the current file, if it has a readable one.
    fn existing_salt(&self) -> Option<Vec<u8>> {
        let stored = self
            .load_stored()
            .inspect_err(|e| warn!(error = %e, "could not read existing settings for salt reuse"))
            .ok()?;
        STANDARD_NO_PAD.decode(stored.salt?.as_bytes()).ok()
    }

    fn write(&self, stored: &StoredSettings) -> Result<(), TimecardError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(stored)?;
        fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                warn!(path = %self.path.display(), error = %e, "failed to chmod settings file");
            }
        }
        Ok(())
    }
}

fn reveal(
    secret: &StoredSecret,
    cipher: Option<&CredentialCipher>,
) -> Result<String, TimecardError> {
    match (secret, cipher) {
        (StoredSecret::Plain(value), _) => Ok(value.clone()),
        (StoredSecret::Encrypted(sealed), Some(cipher)) => cipher.decrypt_str(sealed),
        (StoredSecret::Encrypted(_), None) => Err(TimecardError::CredentialsLocked),
    }
}
