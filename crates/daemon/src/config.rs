//! Daemon configuration
//!
//! Loaded from a TOML file; every field has a default so an empty
//! file (or none at all) yields a working config.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use hackmate_core::{Error, Result};

const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Minutes between lifecycle sweeps
    pub sweep_interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            sweep_interval_minutes: DEFAULT_SWEEP_INTERVAL_MINUTES,
        }
    }
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "hackmate", "hackmate")
        .map(|dirs| dirs.data_dir().join("hackmate.db"))
        .unwrap_or_else(|| PathBuf::from("hackmate.db"))
}

impl Config {
    /// Load config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| Error::Validation(format!("Bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path if present, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sweep_interval_minutes == 0 {
            return Err(Error::Validation(
                "sweep_interval_minutes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sweep_interval_minutes, 15);
    }

    #[test]
    fn test_partial_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "sweep_interval_minutes = 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sweep_interval_minutes, 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "sweep_interval_minutes = 0").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_garbage_is_a_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml [[[").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
