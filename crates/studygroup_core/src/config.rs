//! Environment-driven runtime configuration.
//!
//! | Variable               | Default                          |
//! |------------------------|----------------------------------|
//! | `STUDYGROUP_DB_PATH`   | `<temp dir>/studygroup.sqlite3`  |
//! | `STUDYGROUP_LOG_LEVEL` | `debug` (debug) / `info` (release) |
//! | `STUDYGROUP_LOG_DIR`   | unset: file logging disabled     |
//!
//! Blank values are treated as unset.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "STUDYGROUP_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "STUDYGROUP_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STUDYGROUP_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "studygroup.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(raw) => normalize_level(&raw).map_err(|err| ConfigError::InvalidValue {
                key: LOG_LEVEL_ENV,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        let log_dir = read(LOG_DIR_ENV)
            .map(|raw| {
                normalize_log_dir(&PathBuf::from(raw)).map_err(|err| ConfigError::InvalidValue {
                    key: LOG_DIR_ENV,
                    message: err.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ConfigError, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "   ")])).unwrap();
        assert!(config.db_path.ends_with("studygroup.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_normalized() {
        let log_dir = std::env::temp_dir().join("studygroup-config-test");
        let log_dir_text = log_dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/var/lib/studygroup/data.db"),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, log_dir_text.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/studygroup/data.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = CoreConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "loud")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: LOG_LEVEL_ENV, .. }
        ));

        let err = CoreConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "relative/logs")])).unwrap_err();
        assert!(err.to_string().contains(LOG_DIR_ENV));
    }
}
