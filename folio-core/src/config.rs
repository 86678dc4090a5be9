//! Engine configuration, loaded from `folio.yml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Unknown counter style: {0}")]
    UnknownCounter(String),
}

/// Engine configuration matching the folio.yml schema
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on parts per document.
    #[serde(default = "default_max_parts")]
    pub max_parts: usize,

    /// Counter style labels per outline depth (`1 a A i I g G *`).
    #[serde(default = "default_counters")]
    pub counters: Vec<String>,

    /// User slug used in edit links.
    #[serde(default = "default_user")]
    pub user: String,

    /// Document slug used in edit links.
    #[serde(default = "default_document")]
    pub document: String,

    /// IANA timezone used to interpret `$ DATE` values.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// chrono format for the localized display date.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Seed for one-shot demo ids.
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_max_parts() -> usize {
    300
}

/// Numerals, lowercase alpha, lowercase roman, lowercase greek, then the
/// uppercase forms.
pub fn default_counters() -> Vec<String> {
    ["1", "a", "i", "g", "A", "I", "G"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_user() -> String {
    String::from("guest")
}

fn default_document() -> String {
    String::from("notebook")
}

fn default_timezone() -> String {
    String::from("UTC")
}

fn default_date_format() -> String {
    String::from("%d %b %Y")
}

fn default_seed() -> u64 {
    0x5eed
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parts: default_max_parts(),
            counters: default_counters(),
            user: default_user(),
            document: default_document(),
            timezone: default_timezone(),
            date_format: default_date_format(),
            seed: default_seed(),
            config_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Path this configuration was loaded from, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for label in &self.counters {
            if !crate::counters::is_counter_label(label) {
                return Err(ConfigError::UnknownCounter(label.clone()));
            }
        }
        Ok(())
    }
}
