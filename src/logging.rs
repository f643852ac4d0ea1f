//! Feature-gated logging macros.
//!
//! With the `logging` feature these expand to the matching `tracing` macro.
//! Without it they expand to an empty block, so the library never requires a
//! subscriber and never pays for formatting.
//!
//! ```rust,ignore
//! use crate::logging::{debug, warn};
//!
//! debug!(key, "committing preference");
//! warn!(key, error = %e, "backend read failed");
//! ```

/// Very detailed internal operations (per-entry decode, listener fan-out).
macro_rules! prefs_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::trace!($($arg)*);
    }};
}

/// Operation details: writes, removals, dropped values.
macro_rules! prefs_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::debug!($($arg)*);
    }};
}

/// Lifecycle events such as opening a database or creating a suite.
macro_rules! prefs_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::info!($($arg)*);
    }};
}

/// Backend failures that the store absorbs instead of returning.
macro_rules! prefs_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::warn!($($arg)*);
    }};
}

/// Failures that stop an operation, such as an incompatible database.
macro_rules! prefs_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::error!($($arg)*);
    }};
}

pub(crate) use prefs_debug as debug;
pub(crate) use prefs_error as error;
pub(crate) use prefs_info as info;
pub(crate) use prefs_trace as trace;
pub(crate) use prefs_warn as warn;
