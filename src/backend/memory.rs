//! In-memory backend.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::value::Primitive;

use super::{BackendError, ChangeListener, Edit, ListenerId, ListenerRegistry, PrefsBackend};

/// Backend that keeps entries in a map for the life of the process.
///
/// Useful for tests and for callers that only need registered defaults plus
/// session-local overrides.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Primitive>>,
    listeners: ListenerRegistry,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Primitive)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PrefsBackend for MemoryBackend {
    fn get_all(&self) -> Result<BTreeMap<String, Primitive>, BackendError> {
        Ok(self.entries.read().clone())
    }

    fn get(&self, key: &str) -> Result<Option<Primitive>, BackendError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn commit(&self, edits: Vec<Edit>) -> Result<(), BackendError> {
        let changed: Vec<String> = {
            let mut entries = self.entries.write();
            edits
                .into_iter()
                .map(|edit| match edit {
                    Edit::Put { key, value } => {
                        entries.insert(key.clone(), value);
                        key
                    }
                    Edit::Remove { key } => {
                        entries.remove(&key);
                        key
                    }
                })
                .collect()
        };

        for key in &changed {
            self.listeners.notify(key);
        }
        Ok(())
    }

    fn add_listener(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn test_commit_applies_edits_in_order() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![
                Edit::Put {
                    key: "a".into(),
                    value: Primitive::Int(1),
                },
                Edit::Put {
                    key: "a".into(),
                    value: Primitive::Bool(true),
                },
                Edit::Put {
                    key: "b".into(),
                    value: Primitive::String("x".into()),
                },
                Edit::Remove { key: "b".into() },
            ])
            .unwrap();

        assert_eq!(backend.get("a").unwrap(), Some(Primitive::Bool(true)));
        assert_eq!(backend.get("b").unwrap(), None);
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_listeners_see_committed_state() {
        let backend = Arc::new(MemoryBackend::new());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = backend.clone();
        let sink = observed.clone();
        backend.add_listener(Arc::new(move |key: &str| {
            let value = reader.get(key).ok().flatten();
            sink.lock().push((key.to_string(), value));
        }));

        backend
            .commit(vec![Edit::Put {
                key: "volume".into(),
                value: Primitive::Float(0.5),
            }])
            .unwrap();
        backend
            .commit(vec![Edit::Remove {
                key: "volume".into(),
            }])
            .unwrap();

        assert_eq!(
            *observed.lock(),
            vec![
                ("volume".to_string(), Some(Primitive::Float(0.5))),
                ("volume".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let backend = MemoryBackend::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let id = backend.add_listener(Arc::new(move |_: &str| *counter.lock() += 1));

        assert!(backend.remove_listener(id));
        backend
            .commit(vec![Edit::Remove { key: "k".into() }])
            .unwrap();
        assert_eq!(*hits.lock(), 0);
    }
}
