//! The typed preference store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use url::Url;

use crate::backend::{ChangeListener, Edit, ListenerId, MemoryBackend, PrefsBackend};
use crate::codec;
use crate::logging::{debug, trace, warn};
use crate::value::{Primitive, Value};

/// Strings that `bool_for` reads as `true`, compared case-insensitively.
const TRUE_STRINGS: [&str; 3] = ["true", "yes", "1"];

/// Typed preferences over a [`PrefsBackend`], with registered defaults.
///
/// Reads look at the backend first and fall back to the values passed to
/// [`register`](Self::register). No method returns an error: writes of kinds
/// the backend cannot hold are dropped, backend failures are logged, and
/// values that cannot be coerced read as `None`.
///
/// # Example
///
/// ```ignore
/// use prefs_kv::prelude::*;
///
/// let mut store = PreferenceStore::open(".prefs-kv", Some("com.example.app"))?;
/// store.register(HashMap::from([("launch-count".to_string(), Value::Int(0))]));
///
/// let launches = store.integer_for("launch-count").unwrap_or(0);
/// store.set_integer("launch-count", launches as i32 + 1);
///
/// let _sub = store.observe("theme", || println!("theme changed"));
/// store.set_string("theme", "dark");
/// ```
pub struct PreferenceStore {
    backend: Arc<dyn PrefsBackend>,
    registration: HashMap<String, Value>,
}

impl PreferenceStore {
    /// Create a store over an existing backend handle.
    pub fn new(backend: Arc<dyn PrefsBackend>) -> Self {
        Self {
            backend,
            registration: HashMap::new(),
        }
    }

    /// Create a store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open the on-disk database at `path` and bind to `suite`
    /// (the default suite when `None`).
    #[cfg(feature = "kv")]
    pub fn open(
        path: impl AsRef<std::path::Path>,
        suite: Option<&str>,
    ) -> Result<Self, crate::backend::BackendError> {
        let db = crate::backend::DiskDatabase::open(path)?;
        Ok(Self::new(db.suite(suite)?))
    }

    /// The underlying backend handle.
    pub fn backend(&self) -> &Arc<dyn PrefsBackend> {
        &self.backend
    }

    /// Replace the registered defaults. The previous table is discarded.
    pub fn register(&mut self, defaults: HashMap<String, Value>) {
        debug!(count = defaults.len(), "registering defaults");
        self.registration = defaults;
    }

    pub fn registered_defaults(&self) -> &HashMap<String, Value> {
        &self.registration
    }

    // Writes

    pub fn set_integer(&self, key: &str, value: i32) {
        self.put(key, Primitive::Int(value));
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.put(key, Primitive::Bool(value));
    }

    pub fn set_double(&self, key: &str, value: f64) {
        self.put(key, Primitive::Float(value));
    }

    pub fn set_string(&self, key: &str, value: &str) {
        self.put(key, Primitive::String(value.to_string()));
    }

    /// Store any supported value.
    ///
    /// Blobs and timestamps are written as prefixed strings, numbers of
    /// unspecified width and URLs as their text. `None`, arrays, maps and
    /// timestamps outside years 0000-9999 are ignored and leave the current
    /// value in place.
    pub fn set_object(&self, key: &str, value: Option<Value>) {
        let primitive = match value {
            Some(Value::Float(v)) => Primitive::Float(v),
            Some(Value::Long(v)) => Primitive::Long(v),
            Some(Value::Int(v)) => Primitive::Int(v),
            Some(Value::Bool(v)) => Primitive::Bool(v),
            Some(Value::Number(n)) => Primitive::String(n.to_string()),
            Some(Value::String(s)) => Primitive::String(s),
            Some(Value::Url(u)) => Primitive::String(u.into()),
            Some(Value::Data(bytes)) => Primitive::String(codec::encode_data(&bytes)),
            Some(Value::Date(date)) => match codec::encode_date(&date) {
                Some(text) => Primitive::String(text),
                None => {
                    debug!(key, %date, "ignoring timestamp outside years 0000-9999");
                    return;
                }
            },
            Some(other @ (Value::Array(_) | Value::Map(_))) => {
                debug!(key, kind = other.kind(), "ignoring unsupported value");
                return;
            }
            None => {
                debug!(key, "ignoring absent value");
                return;
            }
        };
        self.put(key, primitive);
    }

    /// Delete the persisted value. Registered defaults are untouched.
    pub fn remove_object(&self, key: &str) {
        self.commit(Edit::Remove {
            key: key.to_string(),
        });
    }

    fn put(&self, key: &str, value: Primitive) {
        self.commit(Edit::Put {
            key: key.to_string(),
            value,
        });
    }

    fn commit(&self, edit: Edit) {
        trace!(key = edit.key(), "committing edit");
        if let Err(e) = self.backend.commit(vec![edit]) {
            warn!(error = %e, "dropping preference write");
        }
    }

    // Reads

    /// The persisted value, else the registered default, else `None`.
    ///
    /// Strings carrying a reserved prefix are decoded into `Data` or `Date`;
    /// if the payload does not decode the result is `None`.
    pub fn object_for(&self, key: &str) -> Option<Value> {
        let value = match self.backend.get(key) {
            Ok(Some(primitive)) => Value::from(primitive),
            Ok(None) => self.registration.get(key)?.clone(),
            Err(e) => {
                warn!(key, error = %e, "backend read failed");
                self.registration.get(key)?.clone()
            }
        };
        decode_value(value)
    }

    /// Numbers as text, booleans as `"YES"`/`"NO"`, strings as themselves.
    pub fn string_for(&self, key: &str) -> Option<String> {
        match self.object_for(key)? {
            Value::Bool(b) => Some(if b { "YES" } else { "NO" }.to_string()),
            Value::String(s) => Some(codec::strip_reserved_prefix(&s).to_string()),
            other => other.numeric_text(),
        }
    }

    pub fn double_for(&self, key: &str) -> Option<f64> {
        match self.object_for(key)? {
            Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_f64(),
        }
    }

    pub fn integer_for(&self, key: &str) -> Option<i64> {
        match self.object_for(key)? {
            Value::Bool(b) => Some(i64::from(b)),
            Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        }
    }

    /// Numbers are true when non-zero; strings when they are "true", "yes"
    /// or "1" in any case.
    pub fn bool_for(&self, key: &str) -> Option<bool> {
        match self.object_for(key)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => {
                let lowered = s.to_lowercase();
                Some(TRUE_STRINGS.contains(&lowered.as_str()))
            }
            other => other.as_f64().map(|f| f != 0.0),
        }
    }

    /// Stored URLs, or strings that parse as an absolute URL.
    pub fn url_for(&self, key: &str) -> Option<Url> {
        match self.object_for(key)? {
            Value::Url(u) => Some(u),
            Value::String(s) => Url::parse(&s).ok(),
            _ => None,
        }
    }

    /// Stored blobs, or strings holding base64 (with or without the blob
    /// prefix).
    pub fn data_for(&self, key: &str) -> Option<Vec<u8>> {
        match self.object_for(key)? {
            Value::Data(bytes) => Some(bytes),
            Value::String(s) => {
                codec::decode_base64(s.strip_prefix(codec::DATA_PREFIX).unwrap_or(&s))
            }
            _ => None,
        }
    }

    /// Stored timestamps, or strings holding an RFC 3339 timestamp.
    pub fn date_for(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.object_for(key)? {
            Value::Date(date) => Some(date),
            Value::String(s) => codec::parse_date(&s),
            _ => None,
        }
    }

    /// Registered defaults overlaid with every persisted entry.
    ///
    /// Persisted strings whose reserved prefix does not decode are left out,
    /// as are entries the backend cannot read.
    pub fn dictionary_representation(&self) -> BTreeMap<String, Value> {
        let mut merged: BTreeMap<String, Value> = self
            .registration
            .iter()
            .filter_map(|(k, v)| decode_value(v.clone()).map(|v| (k.clone(), v)))
            .collect();

        match self.backend.get_all() {
            Ok(entries) => {
                for (key, primitive) in entries {
                    match decode_value(Value::from(primitive)) {
                        Some(value) => {
                            merged.insert(key, value);
                        }
                        None => {
                            merged.remove(&key);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "backend listing failed");
            }
        }
        merged
    }

    // Change notification

    /// Call `on_change` whenever `key` is written or removed.
    ///
    /// The registration lasts until [`Subscription::unsubscribe`] is called
    /// or the subscription is dropped.
    pub fn observe<F>(&self, key: &str, on_change: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let watched = key.to_string();
        let listener: ChangeListener = Arc::new(move |changed: &str| {
            if changed == watched {
                on_change();
            }
        });
        let id = self.backend.add_listener(listener);
        trace!(key, ?id, "observing key");

        Subscription {
            backend: self.backend.clone(),
            id,
            key: key.to_string(),
            active: true,
        }
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

fn decode_value(value: Value) -> Option<Value> {
    match value {
        Value::String(s) => codec::decode_string(s),
        other => Some(other),
    }
}

/// A live change registration created by [`PreferenceStore::observe`].
#[must_use = "dropping a Subscription stops its notifications"]
pub struct Subscription {
    backend: Arc<dyn PrefsBackend>,
    id: ListenerId,
    key: String,
    active: bool,
}

impl Subscription {
    /// Key being observed.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop notifications. Calling it again has no effect.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.active = false;
            self.backend.remove_listener(self.id);
            trace!(key = %self.key, id = ?self.id, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
