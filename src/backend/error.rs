//! Error types for the backend module.

use thiserror::Error;

/// Errors that can occur inside a preference backend.
///
/// The [`PreferenceStore`](crate::PreferenceStore) never surfaces these; they
/// are visible when a backend is opened or used directly.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "kv")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Invalid suite name: {0:?}")]
    InvalidSuite(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Corrupt entry for key '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },
}
