//! Plugin configuration.
//!
//! # Responsibility
//! - Hold every gate toggle and extension point the host may override.
//! - Load overrides from a JSON document; missing keys keep defaults.
//!
//! # Invariants
//! - `PluginConfig::default()` equals parsing an empty JSON object.
//! - Unknown keys are rejected so typos do not silently disable a gate.

use crate::schedule::{WEEKLY_INTERVAL, WEEK_IN_SECONDS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Lowest host admin version the plugin runs against.
pub const DEFAULT_MINIMUM_ADMIN_VERSION: &str = "0.22.0";

/// What to do when notes with the same name already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Insert regardless of existing notes.
    Off,
    /// Skip creation when any note with the name exists.
    #[default]
    Abort,
    /// Delete existing notes with the name, then create a fresh one.
    Replace,
}

/// Gate toggles and extension points for one plugin instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    /// Semantic version the host admin must reach (`>=`).
    pub minimum_admin_version: String,
    /// Skip until the host reports setup as complete.
    pub require_setup_complete: bool,
    /// Skip until the host admin has been installed for `min_active_secs`.
    pub require_min_active: bool,
    pub min_active_secs: u64,
    pub dedup_policy: DedupPolicy,
    /// Master switch for note creation.
    pub enabled: bool,
    /// First run of the weekly event, Unix epoch seconds, not negative.
    /// `None` means midnight UTC of Sunday this week.
    pub schedule_time: Option<i64>,
    /// Interval name the weekly event recurs on.
    pub schedule_interval: String,
    /// Generated actions are primary unless a caller says otherwise.
    pub default_action_primary: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            minimum_admin_version: DEFAULT_MINIMUM_ADMIN_VERSION.to_string(),
            require_setup_complete: false,
            require_min_active: false,
            min_active_secs: WEEK_IN_SECONDS,
            dedup_policy: DedupPolicy::default(),
            enabled: true,
            schedule_time: None,
            schedule_interval: WEEKLY_INTERVAL.to_string(),
            default_action_primary: false,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl PluginConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks values serde cannot express as types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if crate::host::parse_version(&self.minimum_admin_version).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "minimum_admin_version",
                message: format!("`{}` is not a version", self.minimum_admin_version),
            });
        }
        if let Some(time) = self.schedule_time {
            if time < 0 {
                return Err(ConfigError::InvalidValue {
                    field: "schedule_time",
                    message: format!("`{time}` is before the Unix epoch"),
                });
            }
        }
        if self.schedule_interval.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "schedule_interval",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DedupPolicy, PluginConfig};

    #[test]
    fn empty_object_yields_defaults() {
        let config = PluginConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PluginConfig::default());
        assert_eq!(config.min_active_secs, 7 * 24 * 3600);
        assert_eq!(config.dedup_policy, DedupPolicy::Abort);
        assert!(config.enabled);
    }

    #[test]
    fn overrides_are_applied_field_by_field() {
        let config = PluginConfig::from_json_str(
            r#"{"enabled": false, "dedup_policy": "replace", "schedule_time": 42}"#,
        )
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.dedup_policy, DedupPolicy::Replace);
        assert_eq!(config.schedule_time, Some(42));
        assert_eq!(config.schedule_interval, "weekly");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PluginConfig::from_json_str(r#"{"enabeld": false}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_minimum_version_is_rejected() {
        let err = PluginConfig::from_json_str(r#"{"minimum_admin_version": "soon"}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "minimum_admin_version",
                ..
            }
        ));
    }

    #[test]
    fn negative_schedule_time_is_rejected() {
        let err = PluginConfig::from_json_str(r#"{"schedule_time": -1}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "schedule_time",
                ..
            }
        ));
        assert!(PluginConfig::from_json_str(r#"{"schedule_time": 0}"#).is_ok());
    }
}
