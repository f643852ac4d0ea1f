//! Unified error type for the prefs-kv library.
//!
//! The [`PreferenceStore`](crate::PreferenceStore) itself never fails; errors
//! come from opening backends and loading configuration. [`Error`] wraps
//! both so applications can use a single `?` path.

use thiserror::Error;

use crate::backend::BackendError;
#[cfg(feature = "cli")]
use crate::config::ConfigError;

/// Unified error type for all prefs-kv operations.
///
/// # Example
///
/// ```ignore
/// use prefs_kv::{PreferenceStore, Result};
///
/// fn open_app_prefs() -> Result<PreferenceStore> {
///     Ok(PreferenceStore::open(".prefs-kv", Some("com.example.app"))?)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error from a persistence backend.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Error loading configuration.
    #[cfg(feature = "cli")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a backend error.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Returns `true` if this is a configuration error.
    #[cfg(feature = "cli")]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
