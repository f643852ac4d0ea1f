//! Typed preference storage with registered defaults.
//!
//! prefs-kv keeps small application settings (integers, floats, booleans,
//! strings, URLs, blobs and timestamps) in a key-value backend that only
//! understands a handful of primitive slots. Kinds without a native slot are
//! written as strings with a reserved prefix and decoded again on read.
//!
//! # Quick Start
//!
//! ```ignore
//! use prefs_kv::prelude::*;
//!
//! let mut store = PreferenceStore::open(".prefs-kv", None)?;
//! store.register(HashMap::from([("volume".to_string(), Value::Float(0.5))]));
//!
//! assert_eq!(store.double_for("volume"), Some(0.5));
//! store.set_double("volume", 0.8);
//! store.set_object("avatar", Some(Value::Data(png_bytes)));
//! ```
//!
//! # Modules
//!
//! - [`store`] - The typed [`PreferenceStore`] and its [`Subscription`] handles
//! - [`backend`] - The [`PrefsBackend`] trait with memory and fjall implementations
//! - [`value`] - Value kinds accepted by the store
//! - [`codec`] - Prefixed string encoding for blobs and timestamps
//! - [`config`] - TOML configuration (requires `cli` feature)
//!
//! # Feature Flags
//!
//! - `kv` - Enable the on-disk fjall backend (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line interface binary and configuration loading
//! - `full` - Enable all features

pub mod backend;
pub mod codec;
#[cfg(feature = "cli")]
pub mod config;
mod error;
pub(crate) mod logging;
pub mod prelude;
pub mod store;
pub mod value;

pub use error::{Error, Result};

pub use backend::{
    BackendError, ChangeListener, Edit, ListenerId, ListenerRegistry, MemoryBackend, PrefsBackend,
};
#[cfg(feature = "kv")]
pub use backend::{DEFAULT_SUITE, DiskBackend, DiskDatabase};
pub use store::{PreferenceStore, Subscription};
pub use value::{Primitive, Value};

// Re-export the value payload types so callers need no direct dependency
pub use chrono::{DateTime, Utc};
pub use url::Url;
