use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::EncryptedSecret;
use crate::error::TimecardError;

pub const DEFAULT_COMPANY_ID: &str = "Intwo";
pub const DEFAULT_SITE_URL: &str = "connect.intwo.cloud";
pub const DEFAULT_WORK_TYPE: &str = "Remote-Standard";
pub const DEFAULT_CLIENT_ID: &str = "4332716b-7270-470d-b7c6-9c036f760e6f";
/// Puerto Rico, UTC-4.
pub const DEFAULT_TIMEZONE_OFFSET: f64 = -4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillableOption {
    Billable,
    #[default]
    DoNotBill,
    NoCharge,
    NoDefault,
}

impl BillableOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillableOption::Billable => "Billable",
            BillableOption::DoNotBill => "DoNotBill",
            BillableOption::NoCharge => "NoCharge",
            BillableOption::NoDefault => "NoDefault",
        }
    }
}

impl fmt::Display for BillableOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown billable option '{0}' (expected Billable, DoNotBill, NoCharge or NoDefault)")]
pub struct ParseBillableError(String);

impl FromStr for BillableOption {
    type Err = ParseBillableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "billable" => Ok(BillableOption::Billable),
            "donotbill" => Ok(BillableOption::DoNotBill),
            "nocharge" => Ok(BillableOption::NoCharge),
            "nodefault" => Ok(BillableOption::NoDefault),
            _ => Err(ParseBillableError(s.to_string())),
        }
    }
}

/// Note placement and notification flags copied into every time entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFlags {
    pub detail_description: bool,
    pub internal_analysis: bool,
    pub resolution: bool,
    pub email_resource: bool,
    pub email_contact: bool,
    pub email_cc: bool,
}

impl Default for EntryFlags {
    fn default() -> Self {
        Self {
            detail_description: false,
            internal_analysis: true,
            resolution: false,
            email_resource: false,
            email_contact: false,
            email_cc: false,
        }
    }
}

/// Decrypted, in-memory user settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub company_id: String,
    pub public_key: String,
    pub private_key: String,
    pub site_url: String,
    pub member_id: String,
    pub work_type: String,
    pub billable_option: BillableOption,
    pub client_id: String,
    pub timezone_offset: f64,
    pub flags: EntryFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_id: DEFAULT_COMPANY_ID.to_string(),
            public_key: String::new(),
            private_key: String::new(),
            site_url: DEFAULT_SITE_URL.to_string(),
            member_id: String::new(),
            work_type: DEFAULT_WORK_TYPE.to_string(),
            billable_option: BillableOption::default(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timezone_offset: DEFAULT_TIMEZONE_OFFSET,
            flags: EntryFlags::default(),
        }
    }
}

impl Settings {
    /// Required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("company_id", &self.company_id),
            ("public_key", &self.public_key),
            ("private_key", &self.private_key),
            ("member_id", &self.member_id),
            ("client_id", &self.client_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn set_timezone_offset(&mut self, offset: f64) -> Result<(), TimecardError> {
        self.timezone_offset = check_timezone_offset(offset)?;
        Ok(())
    }
}

/// Offsets in use on Earth run from UTC-12 to UTC+14.
pub fn check_timezone_offset(offset: f64) -> Result<f64, TimecardError> {
    if !offset.is_finite() || !(-12.0..=14.0).contains(&offset) {
        return Err(TimecardError::invalid(format!(
            "timezone offset must be between -12 and 14 hours, got {offset}"
        )));
    }
    Ok(offset)
}

/// A credential as it sits on disk: sealed with the PIN key or in plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSecret {
    Encrypted(EncryptedSecret),
    Plain(String),
}

impl Default for StoredSecret {
    fn default() -> Self {
        StoredSecret::Plain(String::new())
    }
}

impl StoredSecret {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, StoredSecret::Encrypted(_))
    }
}

/// On-disk shape of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSettings {
    pub company_id: String,
    pub public_key: StoredSecret,
    pub private_key: StoredSecret,
    pub site_url: String,
    pub member_id: String,
    pub work_type: String,
    pub billable_option: BillableOption,
    pub client_id: String,
    pub timezone_offset: f64,
    pub flags: EntryFlags,
    /// Base64 salt for the PIN key; present only while credentials are encrypted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Default for StoredSettings {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            company_id: defaults.company_id,
            public_key: StoredSecret::default(),
            private_key: StoredSecret::default(),
            site_url: defaults.site_url,
            member_id: defaults.member_id,
            work_type: defaults.work_type,
            billable_option: defaults.billable_option,
            client_id: defaults.client_id,
            timezone_offset: defaults.timezone_offset,
            flags: defaults.flags,
            salt: None,
        }
    }
}

impl StoredSettings {
    pub fn is_locked(&self) -> bool {
        self.public_key.is_encrypted() || self.private_key.is_encrypted()
    }

    /// Same check as [`Settings::missing_fields`]; sealed keys count as set.
    pub fn missing_fields(&self) -> Vec<String> {
        let visible = |secret: &StoredSecret| match secret {
            StoredSecret::Encrypted(_) => "<encrypted>".to_string(),
            StoredSecret::Plain(value) => value.clone(),
        };
        Settings {
            company_id: self.company_id.clone(),
            public_key: visible(&self.public_key),
            private_key: visible(&self.private_key),
            member_id: self.member_id.clone(),
            client_id: self.client_id.clone(),
            ..Settings::default()
        }
        .missing_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billable_option_parses_loosely() {
        assert_eq!(
            "do-not-bill".parse::<BillableOption>().unwrap(),
            BillableOption::DoNotBill
        );
        assert_eq!(
            "Billable".parse::<BillableOption>().unwrap(),
            BillableOption::Billable
        );
        assert_eq!(
            "no_charge".parse::<BillableOption>().unwrap(),
            BillableOption::NoCharge
        );
        assert!("sometimes".parse::<BillableOption>().is_err());
    }

    #[test]
    fn defaults_are_incomplete_until_credentials_set() {
        let mut s = Settings::default();
        assert_eq!(
            s.missing_fields(),
            vec!["public_key", "private_key", "member_id"]
        );

        s.public_key = "pub".into();
        s.private_key = "priv".into();
        s.member_id = "amora".into();
        assert!(s.is_complete());
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let s = Settings {
            company_id: "   ".into(),
            ..Settings::default()
        };
        assert!(s.missing_fields().contains(&"company_id".to_string()));
    }

    #[test]
    fn timezone_offset_bounds() {
        let mut s = Settings::default();
        assert!(s.set_timezone_offset(-5.0).is_ok());
        assert_eq!(s.timezone_offset, -5.0);
        assert!(s.set_timezone_offset(5.5).is_ok());
        assert!(s.set_timezone_offset(-13.0).is_err());
        assert!(s.set_timezone_offset(f64::NAN).is_err());
        assert_eq!(s.timezone_offset, 5.5);
    }

    #[test]
    fn stored_settings_fill_missing_keys_with_defaults() {
        let stored: StoredSettings =
            serde_json::from_str(r#"{"member_id":"amora","public_key":"abc"}"#).unwrap();
        assert_eq!(stored.member_id, "amora");
        assert_eq!(stored.public_key, StoredSecret::Plain("abc".into()));
        assert_eq!(stored.site_url, DEFAULT_SITE_URL);
        assert_eq!(stored.timezone_offset, DEFAULT_TIMEZONE_OFFSET);
        assert!(stored.flags.internal_analysis);
        assert!(!stored.is_locked());
    }

    #[test]
    fn stored_missing_fields_treat_sealed_keys_as_set() {
        let stored: StoredSettings = serde_json::from_str(
            r#"{"private_key":{"nonce":"AAAA","ciphertext":"BBBB","tag":"CCCC"},"client_id":" "}"#,
        )
        .unwrap();
        assert_eq!(
            stored.missing_fields(),
            vec!["public_key", "member_id", "client_id"]
        );
    }

    #[test]
    fn encrypted_secret_deserializes_as_encrypted() {
        let stored: StoredSettings = serde_json::from_str(
            r#"{"private_key":{"nonce":"AAAA","ciphertext":"BBBB","tag":"CCCC"}}"#,
        )
        .unwrap();
        assert!(stored.private_key.is_encrypted());
        assert!(stored.is_locked());
    }
}
