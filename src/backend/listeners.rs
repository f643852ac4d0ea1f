//! Change-listener bookkeeping shared by the backends.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::trace;

use super::ChangeListener;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Set of change listeners with stable ids.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener with `key`.
    ///
    /// The lock is released before any callback runs, so callbacks may read
    /// the store or (un)register listeners.
    pub fn notify(&self, key: &str) {
        let snapshot: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(key, listeners = snapshot.len(), "notifying change listeners");
        for listener in snapshot {
            listener(key);
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_notify_reaches_every_listener() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = seen.clone();
            registry.add(Arc::new(move |key: &str| {
                seen.lock().push(format!("{tag}:{key}"));
            }));
        }
        registry.notify("theme");

        assert_eq!(*seen.lock(), vec!["a:theme", "b:theme"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ListenerRegistry::new();
        let id = registry.add(Arc::new(|_: &str| {}));

        assert_eq!(registry.len(), 1);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listener_may_unregister_itself() {
        let registry = Arc::new(ListenerRegistry::new());
        let own_id = Arc::new(Mutex::new(None));

        let handle = registry.clone();
        let slot = own_id.clone();
        let id = registry.add(Arc::new(move |_: &str| {
            if let Some(id) = *slot.lock() {
                handle.remove(id);
            }
        }));
        *own_id.lock() = Some(id);

        registry.notify("k");
        assert!(registry.is_empty());
    }
}
