//! Runtime configuration for embedding the core in a host context.

use crate::logging::default_log_level;
use crate::store::ConsistencyMode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "clipnote.sqlite3";

pub const ENV_DB_PATH: &str = "CLIPNOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CLIPNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CLIPNOTE_LOG_DIR";
pub const ENV_CONSISTENCY: &str = "CLIPNOTE_CONSISTENCY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub consistency: ConsistencyMode,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            consistency: ConsistencyMode::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `CLIPNOTE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = non_empty(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = non_empty(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = non_empty(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(mode) = non_empty(ENV_CONSISTENCY) {
            config.consistency =
                ConsistencyMode::parse(&mode).ok_or(ConfigError::InvalidValue {
                    key: ENV_CONSISTENCY,
                    value: mode,
                })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_DB_FILE_NAME};
    use crate::store::ConsistencyMode;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE_NAME));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.consistency, ConsistencyMode::LastWriterWins);
    }

    #[test]
    fn overrides_are_read_and_validated() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("CLIPNOTE_DB_PATH", "/tmp/notes.sqlite3"),
            ("CLIPNOTE_CONSISTENCY", "revision_checked"),
            ("CLIPNOTE_LOG_DIR", " "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/notes.sqlite3"));
        assert_eq!(config.consistency, ConsistencyMode::RevisionChecked);
        assert_eq!(config.log_dir, None);

        let err = CoreConfig::from_lookup(lookup(&[("CLIPNOTE_CONSISTENCY", "eventual")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "CLIPNOTE_CONSISTENCY",
                value: "eventual".to_string()
            }
        );
    }
}
