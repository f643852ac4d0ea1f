//! Persistence backends for the preference store.
//!
//! A backend stores [`Primitive`] values under string keys, commits batches of
//! edits and tells registered listeners which keys changed. The store is
//! handed a backend at construction time; it never looks one up on its own.

#[cfg(feature = "kv")]
mod disk;
#[cfg(feature = "kv")]
mod entry;
mod error;
mod listeners;
mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::Primitive;

#[cfg(feature = "kv")]
pub use disk::{DEFAULT_SUITE, DiskBackend, DiskDatabase};
pub use error::BackendError;
pub use listeners::{ListenerId, ListenerRegistry};
pub use memory::MemoryBackend;

/// Callback invoked with the key that changed.
pub type ChangeListener = Arc<dyn Fn(&str) + Send + Sync>;

/// A single mutation in a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Put { key: String, value: Primitive },
    Remove { key: String },
}

impl Edit {
    /// Key touched by this edit.
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Key-value persistence used by [`PreferenceStore`](crate::PreferenceStore).
///
/// Implementations provide their own thread safety. After a successful
/// [`commit`](Self::commit) every listener is called once per edited key, on
/// the committing thread, with no internal locks held.
pub trait PrefsBackend: Send + Sync {
    /// Returns every stored entry.
    fn get_all(&self) -> Result<BTreeMap<String, Primitive>, BackendError>;

    /// Returns a single entry.
    fn get(&self, key: &str) -> Result<Option<Primitive>, BackendError> {
        Ok(self.get_all()?.remove(key))
    }

    /// Applies a batch of edits in order.
    fn commit(&self, edits: Vec<Edit>) -> Result<(), BackendError>;

    /// Registers a change listener.
    fn add_listener(&self, listener: ChangeListener) -> ListenerId;

    /// Removes a change listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
