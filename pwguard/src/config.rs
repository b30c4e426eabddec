//! Configuration loader. Hashing settings come from a JSON file; the target
//! cost may be raised or lowered per deployment through `PWGUARD_COST`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::passwords::{Passwords, DEFAULT_COST};
use crate::crypto::scheme::{Argon2id, Bcrypt, ARGON2_DEFAULT_MEMORY_KIB, ARGON2_DEFAULT_PARALLELISM};

/// Environment variable that overrides the configured cost factor.
pub const COST_ENV: &str = "PWGUARD_COST";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    Bcrypt,
    Argon2id,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub scheme: SchemeKind,
    /// Target cost factor: bcrypt log2 rounds, or Argon2id time cost.
    pub cost: u32,
    #[serde(rename = "argon2MemoryKib")]
    pub argon2_memory_kib: u32,
    #[serde(rename = "argon2Parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeKind::Bcrypt,
            cost: DEFAULT_COST,
            argon2_memory_kib: ARGON2_DEFAULT_MEMORY_KIB,
            argon2_parallelism: ARGON2_DEFAULT_PARALLELISM,
        }
    }
}

impl HashingConfig {
    /// Replaces the cost with `raw` when present. Values that are not a
    /// non-negative integer are rejected rather than ignored.
    pub fn apply_cost_override(&mut self, raw: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = raw {
            self.cost = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("{COST_ENV}={raw:?}: {e}")))?;
        }
        Ok(())
    }

    /// Defaults plus the `PWGUARD_COST` override, for running without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_cost_override(std::env::var(COST_ENV).ok().as_deref())?;
        Ok(config)
    }
}

impl Passwords {
    pub fn from_config(config: &HashingConfig) -> Self {
        match config.scheme {
            SchemeKind::Bcrypt => Passwords::with_scheme(Bcrypt, config.cost),
            SchemeKind::Argon2id => Passwords::with_scheme(
                Argon2id::new(config.argon2_memory_kib, config.argon2_parallelism),
                config.cost,
            ),
        }
    }
}

/// Loads the JSON configuration file and applies the environment override.
pub fn load_config(path: impl AsRef<Path>) -> Result<HashingConfig, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let mut config: HashingConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    config.apply_cost_override(std::env::var(COST_ENV).ok().as_deref())?;
    Ok(config)
}
