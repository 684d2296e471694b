//! Runtime configuration resolved from environment variables.
//!
//! | variable                   | default                      |
//! |----------------------------|------------------------------|
//! | `DAYBLOCKS_DB_PATH`        | `<temp dir>/dayblocks.sqlite3` |
//! | `DAYBLOCKS_LOG_LEVEL`      | [`default_log_level`]        |
//! | `DAYBLOCKS_LOG_DIR`        | unset (logging disabled)     |
//! | `DAYBLOCKS_TIMELINE_RANGE` | `full`                       |

use crate::logging::default_log_level;
use crate::timeline::HourRange;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "DAYBLOCKS_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "DAYBLOCKS_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "DAYBLOCKS_LOG_DIR";
pub const TIMELINE_RANGE_ENV: &str = "DAYBLOCKS_TIMELINE_RANGE";
const DEFAULT_DB_FILE: &str = "dayblocks.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub timeline_range: HourRange,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            timeline_range: HourRange::FULL_DAY,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = value(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = value(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        config.log_dir = value(LOG_DIR_ENV).map(PathBuf::from);
        if let Some(range) = value(TIMELINE_RANGE_ENV) {
            config.timeline_range = HourRange::parse(&range).ok_or(ConfigError::InvalidValue {
                key: TIMELINE_RANGE_ENV,
                value: range,
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PlannerConfig, TIMELINE_RANGE_ENV};
    use crate::timeline::HourRange;
    use std::path::PathBuf;

    #[test]
    fn empty_environment_uses_defaults() {
        let config = PlannerConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(config, PlannerConfig::default());
        assert!(config.db_path.ends_with("dayblocks.sqlite3"));
        assert_eq!(config.timeline_range, HourRange::FULL_DAY);
    }

    #[test]
    fn overrides_are_trimmed_and_parsed() {
        let config = PlannerConfig::from_lookup(|key| match key {
            "DAYBLOCKS_DB_PATH" => Some(" /data/planner.db ".to_string()),
            "DAYBLOCKS_LOG_LEVEL" => Some("warn".to_string()),
            "DAYBLOCKS_LOG_DIR" => Some("   ".to_string()),
            "DAYBLOCKS_TIMELINE_RANGE" => Some("Business".to_string()),
            _ => None,
        })
        .expect("valid overrides");
        assert_eq!(config.db_path, PathBuf::from("/data/planner.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.timeline_range, HourRange::BUSINESS_HOURS);
    }

    #[test]
    fn unknown_range_is_rejected() {
        let err = PlannerConfig::from_lookup(|key| {
            (key == TIMELINE_RANGE_ENV).then(|| "night".to_string())
        })
        .expect_err("invalid range");
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: TIMELINE_RANGE_ENV,
                value: "night".to_string()
            }
        );
    }
}
