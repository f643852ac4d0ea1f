//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use prefs_kv::prelude::*;
//!
//! let store = PreferenceStore::in_memory();
//! store.set_bool("sync-enabled", true);
//! ```

pub use std::collections::HashMap;
pub use std::sync::Arc;

pub use crate::error::{Error, Result};

pub use crate::backend::{BackendError, MemoryBackend, PrefsBackend};
#[cfg(feature = "kv")]
pub use crate::backend::{DiskBackend, DiskDatabase};
pub use crate::store::{PreferenceStore, Subscription};
pub use crate::value::{Primitive, Value};

pub use crate::{DateTime, Url, Utc};
