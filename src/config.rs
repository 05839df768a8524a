//! Runtime configuration for the timecard client.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `<config_dir>/cwm-timecard/config.toml`
//! 3. An explicit TOML file passed with `--config`
//! 4. Environment variables prefixed with `CWM_` (e.g. `CWM_REQUEST_TIMEOUT_SECS=30`)
//!
//! User settings (credentials, member, site) live in the settings store, not here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TimecardError;

pub const APP_NAME: &str = "cwm-timecard";
pub const API_PATH: &str = "v4_6_release/apis/3.0";
pub const TIME_ENTRIES_PATH: &str = "time/entries";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Overrides the settings file location.
    pub settings_path: Option<PathBuf>,
    pub loglevel: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub proxy: Option<Url>,
    /// First start hour handed out for a day that has no entries yet.
    pub default_start_hour: f64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: None,
            loglevel: "warn".to_string(),
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            proxy: None,
            default_start_hour: 8.0,
            user_agent: format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load and validate configuration from every source.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TimecardError> {
        let cfg: Config = Self::figment(explicit).extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path()
            && global.exists()
        {
            figment = figment.merge(Toml::file(global));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("CWM_").ignore(&["PIN"]))
    }

    pub fn validate(&self) -> Result<(), TimecardError> {
        if self.request_timeout_secs == 0 {
            return Err(TimecardError::invalid(
                "request_timeout_secs must be greater than zero",
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(TimecardError::invalid(
                "connect_timeout_secs must be greater than zero",
            ));
        }
        if !(0.0..24.0).contains(&self.default_start_hour) {
            return Err(TimecardError::invalid(format!(
                "default_start_hour must be within [0, 24), got {}",
                self.default_start_hour
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Settings file: explicit override, else `<config_dir>/cwm-timecard/settings.json`.
    pub fn settings_file(&self) -> Result<PathBuf, TimecardError> {
        if let Some(path) = &self.settings_path {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join("settings.json"))
            .ok_or_else(|| {
                TimecardError::invalid("no config directory found; set CWM_SETTINGS_PATH")
            })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_request_deadline() {
        let cfg = Config::default();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.default_start_hour, 8.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("CWM_REQUEST_TIMEOUT_SECS", "30");
            jail.set_env("CWM_SETTINGS_PATH", "/tmp/cwm/settings.json");
            jail.set_env("CWM_PIN", "1234");

            let cfg: Config = Config::figment(None).extract()?;
            assert_eq!(cfg.request_timeout_secs, 30);
            assert_eq!(
                cfg.settings_path.as_deref(),
                Some(Path::new("/tmp/cwm/settings.json"))
            );
            Ok(())
        });
    }

    #[test]
    fn explicit_file_is_layered_under_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "timecard.toml",
                r#"
                loglevel = "debug"
                default_start_hour = 7.5
                request_timeout_secs = 20
                "#,
            )?;
            jail.set_env("CWM_REQUEST_TIMEOUT_SECS", "9");

            let cfg: Config = Config::figment(Some(Path::new("timecard.toml"))).extract()?;
            assert_eq!(cfg.loglevel, "debug");
            assert_eq!(cfg.default_start_hour, 7.5);
            assert_eq!(cfg.request_timeout_secs, 9);
            Ok(())
        });
    }

    #[test]
    fn rejects_out_of_range_start_hour() {
        let cfg = Config {
            default_start_hour: 24.0,
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(TimecardError::InvalidInput(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_connect_timeout() {
        Jail::expect_with(|jail| {
            jail.set_env("CWM_CONNECT_TIMEOUT_SECS", "0");
            let cfg: Config = Config::figment(None).extract()?;
            assert!(matches!(cfg.validate(), Err(TimecardError::InvalidInput(_))));
            Ok(())
        });
    }
}
