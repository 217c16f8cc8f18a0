//! Runtime configuration shared by the wrappers and the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PROFILE_DIR, DEFAULT_TTL_SECONDS, ENV_CACHE_TTL, ENV_KEY_PREFIX, ENV_PROFILE_DIR,
    PROFILE_EXTENSION,
};
use crate::error::{DecorumError, Result};

/// decorum configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecorumConfig {
    /// Default memoization TTL in seconds
    pub default_ttl_seconds: u64,
    /// Prefix prepended to every cache key
    pub key_prefix: Option<String>,
    /// Directory profile dumps are written to
    pub profile_dir: PathBuf,
}

impl Default for DecorumConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            key_prefix: None,
            profile_dir: PathBuf::from(DEFAULT_PROFILE_DIR),
        }
    }
}

impl DecorumConfig {
    /// Builds a config from the environment (and a `.env` file, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(ttl) = std::env::var(ENV_CACHE_TTL) {
            config.default_ttl_seconds = ttl.trim().parse().map_err(|_| {
                DecorumError::ConfigError(format!("{ENV_CACHE_TTL} must be a number of seconds, got '{ttl}'"))
            })?;
        }
        if let Ok(prefix) = std::env::var(ENV_KEY_PREFIX) {
            config.key_prefix = Some(prefix).filter(|p| !p.is_empty());
        }
        if let Ok(dir) = std::env::var(ENV_PROFILE_DIR) {
            if !dir.trim().is_empty() {
                config.profile_dir = PathBuf::from(dir);
            }
        }

        Ok(config)
    }

    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Sets the profile directory.
    pub fn with_profile_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.profile_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Path of the dump written for `function`: `<profile_dir>/<function>.profile`.
    pub fn profile_path(&self, function: &str) -> PathBuf {
        self.profile_dir.join(format!("{function}.{PROFILE_EXTENSION}"))
    }
}
