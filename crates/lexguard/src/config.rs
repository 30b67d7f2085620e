//! Configuration management for lexguard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::automaton::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_IDLE_BUFFERS, MAX_BUFFER_CAPACITY};
use crate::error::{Error, Result};
use crate::policy::{
    FilterOptions, ParseMode, ReportMode, Syntax, DEFAULT_FIELD_SEPARATOR,
    DEFAULT_RECORD_SEPARATOR, DEFAULT_WORD_SEPARATOR,
};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "lexguard";

/// Environment variable prefix.
const ENV_PREFIX: &str = "LEXGUARD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LEXGUARD_`, sections split by `__`)
/// 2. TOML config file at `~/.config/lexguard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dictionary source and format.
    pub dictionary: DictionaryConfig,
    /// Matcher tuning.
    pub matcher: MatcherConfig,
    /// Classification behaviour.
    pub classify: ClassifyConfig,
}

/// Dictionary-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Path to the dictionary file.
    pub path: Option<PathBuf>,
    /// Separator between the sub-tokens of a compound key.
    pub word_separator: String,
    /// Separator between the fields of a record.
    pub field_separator: String,
    /// Separator between records.
    pub record_separator: String,
    /// Reject records with fewer than three fields instead of skipping them.
    pub strict: bool,
}

/// Matcher-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum raw hits recorded per scan; later hits are dropped.
    pub buffer_capacity: usize,
    /// Maximum idle scan buffers kept for reuse.
    pub max_idle_buffers: usize,
}

/// Classification-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Whether to stop reporting at the first forbidding hit.
    pub report: ReportMode,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            path: None,
            word_separator: DEFAULT_WORD_SEPARATOR.to_string(),
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            record_separator: DEFAULT_RECORD_SEPARATOR.to_string(),
            strict: false,
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_idle_buffers: DEFAULT_MAX_IDLE_BUFFERS,
        }
    }
}

impl DictionaryConfig {
    /// The separators to parse dictionaries with.
    #[must_use]
    pub fn syntax(&self) -> Syntax {
        Syntax {
            word_separator: self.word_separator.clone(),
            field_separator: self.field_separator.clone(),
            record_separator: self.record_separator.clone(),
        }
    }

    /// How to treat short records.
    #[must_use]
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let dictionary = &self.dictionary;
        let separators = [
            ("word_separator", &dictionary.word_separator),
            ("field_separator", &dictionary.field_separator),
            ("record_separator", &dictionary.record_separator),
        ];

        for (name, value) in &separators {
            if value.is_empty() {
                return Err(Error::config_validation(format!(
                    "{name} must not be empty"
                )));
            }
        }

        for (i, (name, value)) in separators.iter().enumerate() {
            for (other, other_value) in &separators[i + 1..] {
                if value == other_value {
                    return Err(Error::config_validation(format!(
                        "{name} and {other} must differ (both are {value:?})"
                    )));
                }
            }
        }

        let capacity = self.matcher.buffer_capacity;
        if capacity == 0 {
            return Err(Error::config_validation(
                "buffer_capacity must be greater than 0",
            ));
        }
        if capacity > MAX_BUFFER_CAPACITY {
            return Err(Error::config_validation(format!(
                "buffer_capacity must be at most {MAX_BUFFER_CAPACITY} (got {capacity})"
            )));
        }

        Ok(())
    }

    /// Filter tuning derived from this configuration.
    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            buffer_capacity: self.matcher.buffer_capacity,
            max_idle_buffers: self.matcher.max_idle_buffers,
            report: self.classify.report,
        }
    }
}
