use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use prefs_kv::backend::{BackendError, DiskDatabase};
use prefs_kv::codec;
use prefs_kv::config::{Config, ConfigError, LogFormat, LoggingConfig};
use prefs_kv::{PreferenceStore, Url, Value};

#[derive(Error, Debug)]
pub enum AppError {
    /// Library error (wraps all prefs_kv errors)
    #[error(transparent)]
    Library(#[from] prefs_kv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Key '{key}' not found in suite '{suite}'")]
    KeyNotFound { suite: String, key: String },

    #[error("Invalid {kind} value '{input}': {reason}")]
    InvalidValue {
        kind: &'static str,
        input: String,
        reason: String,
    },

    #[error("Values of kind '{0}' cannot be stored")]
    UnsupportedValue(&'static str),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        Self::Library(e.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Library(e.into())
    }
}

/// How `get` projects the stored value.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ReadAs {
    /// The decoded value as stored.
    #[default]
    Object,
    String,
    Integer,
    Double,
    Bool,
    Url,
    /// Blob, printed as base64.
    Data,
    /// Timestamp, printed as ISO-8601.
    Date,
}

/// How `set` interprets its input.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum WriteKind {
    Int,
    Long,
    Float,
    Bool,
    #[default]
    String,
    Url,
    /// Base64 input, stored as a blob.
    Data,
    /// RFC 3339 input, stored as a timestamp.
    Date,
    /// JSON scalar; numbers are stored as text.
    Json,
}

#[derive(Parser)]
#[command(name = "prefs-kv")]
#[command(about = "Inspect and edit typed preference suites")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "PREFS_KV_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long, global = true, env = "PREFS_KV_PATH")]
    path: Option<PathBuf>,

    /// Suite name (overrides the config file)
    #[arg(long, global = true, env = "PREFS_KV_SUITE")]
    suite: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a value, falling back to registered defaults
    Get {
        key: String,

        /// Typed projection to apply
        #[arg(long = "as", value_enum, default_value_t = ReadAs::Object)]
        read_as: ReadAs,
    },

    /// Write a value
    Set {
        key: String,

        value: String,

        /// How to interpret the value
        #[arg(short, long, value_enum, default_value_t = WriteKind::String)]
        kind: WriteKind,
    },

    /// Remove a persisted value (registered defaults still apply)
    Remove { key: String },

    /// Show every value visible in the suite
    List {
        /// Print a JSON object instead of one line per key
        #[arg(long)]
        json: bool,
    },

    /// List the suites in the database
    Suites,
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_logging(&config.logging)?;

    let path = cli.path.unwrap_or_else(|| config.store.path.clone());
    let suite = cli.suite.or_else(|| config.store.suite.clone());

    let db = DiskDatabase::open(&path)?;
    let backend = db.suite(suite.as_deref())?;
    let suite_name = backend.suite().to_string();

    let mut store = PreferenceStore::new(backend);
    store.register(config.registered_defaults()?);
    tracing::debug!(path = %path.display(), suite = %suite_name, "store ready");

    match cli.command {
        Commands::Get { key, read_as } => {
            let Some(text) = read(&store, &key, read_as) else {
                return Err(AppError::KeyNotFound {
                    suite: suite_name,
                    key,
                });
            };
            println!("{}", text);
            Ok(())
        }
        Commands::Set { key, value, kind } => {
            write(&store, &key, &value, kind)?;
            println!("Set '{}' in suite '{}'", key, suite_name);
            Ok(())
        }
        Commands::Remove { key } => {
            store.remove_object(&key);
            println!("Removed '{}' from suite '{}'", key, suite_name);
            Ok(())
        }
        Commands::List { json } => {
            let entries = store.dictionary_representation();
            if json {
                let object: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&object)?);
            } else {
                for (key, value) in &entries {
                    println!("{}\t{}\t{}", key, value.kind(), value);
                }
            }
            Ok(())
        }
        Commands::Suites => {
            for name in db.suites()? {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn read(store: &PreferenceStore, key: &str, read_as: ReadAs) -> Option<String> {
    match read_as {
        ReadAs::Object => store.object_for(key).map(|v| v.to_string()),
        ReadAs::String => store.string_for(key),
        ReadAs::Integer => store.integer_for(key).map(|v| v.to_string()),
        ReadAs::Double => store.double_for(key).map(|v| format!("{v:?}")),
        ReadAs::Bool => store.bool_for(key).map(|v| v.to_string()),
        ReadAs::Url => store.url_for(key).map(String::from),
        ReadAs::Data => store.data_for(key).map(|v| codec::encode_base64(&v)),
        ReadAs::Date => store.date_for(key).map(|v| codec::format_date(&v)),
    }
}

fn write(store: &PreferenceStore, key: &str, input: &str, kind: WriteKind) -> Result<(), AppError> {
    let invalid = |kind: &'static str, reason: String| AppError::InvalidValue {
        kind,
        input: input.to_string(),
        reason,
    };

    match kind {
        WriteKind::Int => {
            let v = input.parse().map_err(|e| invalid("int", format!("{e}")))?;
            store.set_integer(key, v);
        }
        WriteKind::Long => {
            let v: i64 = input.parse().map_err(|e| invalid("long", format!("{e}")))?;
            store.set_object(key, Some(Value::Long(v)));
        }
        WriteKind::Float => {
            let v = input.parse().map_err(|e| invalid("float", format!("{e}")))?;
            store.set_double(key, v);
        }
        WriteKind::Bool => {
            let v = input.parse().map_err(|e| invalid("bool", format!("{e}")))?;
            store.set_bool(key, v);
        }
        WriteKind::String => store.set_string(key, input),
        WriteKind::Url => {
            let v = Url::parse(input).map_err(|e| invalid("url", e.to_string()))?;
            store.set_object(key, Some(Value::Url(v)));
        }
        WriteKind::Data => {
            let v = codec::decode_base64(input)
                .ok_or_else(|| invalid("data", "not standard base64".to_string()))?;
            store.set_object(key, Some(Value::Data(v)));
        }
        WriteKind::Date => {
            let v = codec::parse_date(input)
                .ok_or_else(|| invalid("date", "not an RFC 3339 timestamp".to_string()))?;
            store.set_object(key, Some(Value::Date(v)));
        }
        WriteKind::Json => {
            let json: serde_json::Value = serde_json::from_str(input)?;
            match Value::from_json(json) {
                Some(v @ (Value::Array(_) | Value::Map(_))) => {
                    return Err(AppError::UnsupportedValue(v.kind()));
                }
                Some(v) => store.set_object(key, Some(v)),
                None => return Err(AppError::UnsupportedValue("null")),
            }
        }
    }
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| AppError::Logging(e.to_string()))?,
    };

    let layer = fmt::layer()
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
    }
    .map_err(|e| AppError::Logging(e.to_string()))
}
