//! Engine configuration.
//!
//! Configuration is plain serde data. Every field has a default, so an empty
//! JSON object is a valid configuration and matches the lenient behavior
//! rule tables have always had: duplicate rules resolve to the last row
//! loaded and unmapped states only fail when something resolves them.

use crate::store::JsonRuleStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "STATEWISE_CONFIG";

/// What to do when two rows define the same `(from_state, event)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRulePolicy {
    /// Keep the row loaded last and log a warning.
    #[default]
    LastWins,
    /// Fail the load with a validation error.
    Reject,
}

/// How rule managers treat the rows they load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleLoadConfig {
    pub duplicate_rules: DuplicateRulePolicy,
    /// Check at load time that every state named by a rule has a class
    /// mapping and that every mapped class is registered.
    pub validate_references: bool,
}

impl RuleLoadConfig {
    /// Reject duplicates and check references.
    pub fn strict() -> Self {
        Self {
            duplicate_rules: DuplicateRulePolicy::Reject,
            validate_references: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.duplicate_rules == DuplicateRulePolicy::Reject || self.validate_references
    }
}

/// Top-level configuration for an application composing the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RuleLoadConfig,
    /// JSON rule document opened by [`EngineConfig::rule_store`].
    pub rule_document: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No rule document configured. Set \"rule_document\" to a JSON rule file")]
    MissingRuleDocument,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                tracing::debug!(path = %path, "loading engine configuration");
                Self::from_file(path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Store reading the configured rule document.
    pub fn rule_store(&self) -> Result<JsonRuleStore, ConfigError> {
        self.rule_document
            .as_ref()
            .map(|path| JsonRuleStore::new(path.clone()))
            .ok_or(ConfigError::MissingRuleDocument)
    }
}
