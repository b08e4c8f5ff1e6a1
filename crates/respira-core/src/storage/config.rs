//! TOML-based engine configuration.
//!
//! Stores:
//! - Session behaviour (completion cooldown, background resync policy,
//!   partial-session recording)
//! - Storage location
//!
//! Configuration is stored at `~/.config/respira/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::timer::ResyncPolicy;

/// Session-timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long `Completed` stays on screen before the timer returns to Idle.
    #[serde(default = "default_completion_display_secs")]
    pub completion_display_secs: u64,
    #[serde(default)]
    pub resync: ResyncPolicy,
    /// Record a partial session when a running session is reset.
    #[serde(default)]
    pub record_partial_sessions: bool,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file name inside the data directory.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/respira/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_completion_display_secs() -> u64 {
    2
}
fn default_database() -> String {
    "respira.db".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_display_secs: default_completion_display_secs(),
            resync: ResyncPolicy::default(),
            record_partial_sessions: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing the defaults there if the file
    /// does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::from_toml_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.session.completion_display_secs, 2);
        assert_eq!(cfg.session.resync, ResyncPolicy::Cascade);
        assert!(!cfg.session.record_partial_sessions);
        assert_eq!(cfg.storage.database, "respira.db");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [session]
            resync = "single_step"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.session.resync, ResyncPolicy::SingleStep);
        assert_eq!(cfg.session.completion_display_secs, 2);
        assert_eq!(cfg.storage.database, "respira.db");
    }

    #[test]
    fn rejects_unknown_resync_policy() {
        let err = Config::from_toml_str("[session]\nresync = \"sometimes\"\n");
        assert!(matches!(err, Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.session.record_partial_sessions = true;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), changed);
    }
}
