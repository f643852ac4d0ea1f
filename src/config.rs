//! Configuration file parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::codec;
use crate::value::Value;

/// Configuration loaded from a TOML file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the database lives and which suite to use.
    pub store: StoreConfig,
    /// Logging settings for the CLI.
    pub logging: LoggingConfig,
    /// Values registered as defaults before any read.
    pub defaults: toml::Table,
}

/// Store location settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the database directory.
    pub path: PathBuf,
    /// Suite name (the default suite when unset).
    pub suite: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".prefs-kv"),
            suite: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"warn"` or `"prefs_kv=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// The `[defaults]` table converted to store values.
    ///
    /// Integers become `Long`, floats `Float`, datetimes `Date` (they must
    /// carry a UTC offset), arrays `Array` and tables `Map`.
    pub fn registered_defaults(&self) -> Result<HashMap<String, Value>, ConfigError> {
        self.defaults
            .iter()
            .map(|(key, value)| {
                toml_to_value(value)
                    .map(|v| (key.clone(), v))
                    .map_err(|reason| ConfigError::InvalidDefault {
                        key: key.clone(),
                        reason,
                    })
            })
            .collect()
    }
}

fn toml_to_value(value: &toml::Value) -> Result<Value, String> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Long(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => {
            let text = dt.to_string();
            Value::Date(
                codec::parse_date(&text)
                    .ok_or_else(|| format!("datetime '{text}' needs a date, time and offset"))?,
            )
        }
        toml::Value::Array(items) => {
            Value::Array(items.iter().map(toml_to_value).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(table) => Value::Map(
            table
                .iter()
                .map(|(k, v)| toml_to_value(v).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid default for '{key}': {reason}")]
    InvalidDefault { key: String, reason: String },
}
