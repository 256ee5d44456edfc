//! Demo settings.
//!
//! Settings are read from a TOML file. Every key is optional; missing keys
//! take their default value:
//!
//! ```toml
//! log_filter = "horizon_sandbox=debug,info"
//! timer_interval_ms = 250
//! run_duration_ms = 1200
//! message = "Hi there"
//! ```
//!
//! # Lookup Order
//!
//! 1. The path in the `HORIZON_SANDBOX_CONFIG` environment variable
//! 2. `sandbox.toml` in the platform configuration directory
//! 3. Built-in defaults, if neither file exists
//!
//! A file that exists but cannot be read or parsed is an error; it is never
//! silently replaced by defaults.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "HORIZON_SANDBOX_CONFIG";

/// File name looked up in the platform configuration directory.
pub const CONFIG_FILE_NAME: &str = "sandbox.toml";

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The settings file is not valid TOML for [`DemoSettings`].
    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is not acceptable.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Settings for the demonstration program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// `tracing-subscriber` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Message board timer interval in milliseconds. Must be non-zero.
    pub timer_interval_ms: u64,
    /// How long the event loop runs, in milliseconds.
    pub run_duration_ms: u64,
    /// Message written to the message board.
    pub message: String,
    /// Age passed to the dog-years conversion.
    pub dog_age: u32,
    /// Multiplier for the dog-years conversion.
    pub dog_years_factor: u32,
    /// Channel of the demo radio station.
    pub radio_channel: i32,
    /// Name of the demo radio station.
    pub station_name: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            timer_interval_ms: 1000,
            run_duration_ms: 3500,
            message: "Hello from the property demo".to_string(),
            dog_age: 46,
            dog_years_factor: 7,
            radio_channel: 98,
            station_name: "Rock FM".to_string(),
        }
    }
}

impl DemoSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load settings from a TOML file and validate them.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        tracing::debug!(
            target: "horizon_sandbox::settings",
            path = %path.display(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Load settings using the standard lookup order.
    pub fn load() -> Result<Self, SettingsError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_with(env_path.as_deref(), default_config_path().as_deref())
    }

    /// Load settings from an explicit path, else a fallback path, else
    /// defaults.
    ///
    /// An explicit path must exist. A missing fallback file means defaults.
    pub fn load_with(
        explicit: Option<&Path>,
        fallback: Option<&Path>,
    ) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match fallback {
            Some(path) if path.is_file() => Self::load_from(path),
            _ => {
                tracing::debug!(
                    target: "horizon_sandbox::settings",
                    "no settings file, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Check values that parse but are unusable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timer_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "timer_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The message board timer interval.
    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.timer_interval_ms)
    }

    /// How long the demo runs its event loop.
    pub fn run_duration(&self) -> Duration {
        Duration::from_millis(self.run_duration_ms)
    }
}

/// `sandbox.toml` in the platform configuration directory, if the platform
/// has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "Horizon Analytic Studios", "Horizon Sandbox")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = DemoSettings::default();
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.timer_interval(), Duration::from_millis(1000));
        assert_eq!(settings.run_duration(), Duration::from_millis(3500));
        assert_eq!(settings.dog_age, 46);
        assert_eq!(settings.radio_channel, 98);
        assert_eq!(settings.station_name, "Rock FM");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings =
            DemoSettings::from_toml_str("timer_interval_ms = 250\nmessage = \"Hi\"\n").unwrap();
        assert_eq!(settings.timer_interval_ms, 250);
        assert_eq!(settings.message, "Hi");
        assert_eq!(settings.run_duration_ms, 3500);
        assert_eq!(settings.dog_years_factor, 7);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "run_duration_ms = 10\nstation_name = \"Jazz FM\"").unwrap();

        let settings = DemoSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.run_duration_ms, 10);
        assert_eq!(settings.station_name, "Jazz FM");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timer_interval_ms = \"soon\"").unwrap();

        let err = DemoSettings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timer_interval_ms = 0").unwrap();

        let err = DemoSettings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = DemoSettings::load_with(Some(&missing), None).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_missing_fallback_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE_NAME);

        let settings = DemoSettings::load_with(None, Some(&missing)).unwrap();
        assert_eq!(settings, DemoSettings::default());
    }

    #[test]
    fn test_fallback_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "dog_age = 3\n").unwrap();

        let settings = DemoSettings::load_with(None, Some(&path)).unwrap();
        assert_eq!(settings.dog_age, 3);
    }
}
