//! On-disk backend using fjall.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};
use parking_lot::Mutex;

use crate::logging::{debug, error, info, trace, warn};
use crate::value::Primitive;

use super::entry;
use super::{BackendError, ChangeListener, Edit, ListenerId, ListenerRegistry, PrefsBackend};

/// Suite used when the caller does not name one.
pub const DEFAULT_SUITE: &str = "defaults";

/// Keyspace holding database-level metadata.
const META_KEYSPACE: &str = "_meta";
const META_CONFIG_KEY: &str = "config";
const META_SUITES_PREFIX: &str = "suites/";

/// Keyspace name prefix for suite data.
const SUITE_PREFIX: &str = "suite_";

const MAX_SUITE_LEN: usize = 200;

/// Current on-disk layout version (1).
/// Increment this when changing the keyspace layout or entry format.
/// Databases written with a different version are rejected.
const STORE_VERSION: u32 = 1;

/// Databases currently open in this process, keyed by canonical path.
static OPEN_DATABASES: OnceLock<Mutex<HashMap<PathBuf, Weak<DiskDatabase>>>> = OnceLock::new();

/// A fjall database holding one keyspace per preference suite.
///
/// A path is opened at most once per process: opening it again returns the
/// live handle. Suites are created on first use, and asking for the same
/// suite twice returns the same [`DiskBackend`], so change listeners
/// registered through one handle see writes made through any other.
///
/// # Example
///
/// ```ignore
/// use prefs_kv::{DiskDatabase, PreferenceStore};
///
/// let db = DiskDatabase::open(".prefs-kv")?;
/// let store = PreferenceStore::new(db.suite(Some("com.example.app"))?);
/// store.set_bool("onboarding-done", true);
/// ```
pub struct DiskDatabase {
    path: PathBuf,
    db: fjall::Database,
    meta: Keyspace,
    suites: Mutex<HashMap<String, Weak<DiskBackend>>>,
}

impl DiskDatabase {
    /// Open the database at `path`, creating it if it does not exist.
    ///
    /// Returns the already open handle when this process has one for `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>, BackendError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let path = path.canonicalize()?;

        let mut registry = OPEN_DATABASES.get_or_init(Default::default).lock();
        if let Some(existing) = registry.get(&path).and_then(Weak::upgrade) {
            debug!(path = %path.display(), "reusing open preference database");
            return Ok(existing);
        }
        registry.retain(|_, db| db.strong_count() > 0);

        let db = Arc::new(Self::open_at(path.clone())?);
        registry.insert(path, Arc::downgrade(&db));
        Ok(db)
    }

    fn open_at(path: PathBuf) -> Result<Self, BackendError> {
        let db = fjall::Database::builder(&path).open()?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;

        match meta.get(META_CONFIG_KEY)? {
            Some(config) => {
                let version = u32::from_le_bytes(config.as_ref().try_into().map_err(|_| {
                    error!(path = %path.display(), "unreadable store config");
                    BackendError::InvalidFormat("Invalid config format".to_string())
                })?);
                if version != STORE_VERSION {
                    error!(
                        path = %path.display(),
                        expected = STORE_VERSION,
                        found = version,
                        "store version mismatch"
                    );
                    return Err(BackendError::InvalidFormat(format!(
                        "Store version mismatch: expected {}, got {}",
                        STORE_VERSION, version
                    )));
                }
                info!(path = %path.display(), "opened preference database");
            }
            None => {
                meta.insert(META_CONFIG_KEY, STORE_VERSION.to_le_bytes())?;
                db.persist(PersistMode::SyncAll)?;
                info!(path = %path.display(), version = STORE_VERSION, "created preference database");
            }
        }

        Ok(Self {
            path,
            db,
            meta,
            suites: Mutex::new(HashMap::new()),
        })
    }

    /// Canonical path of the database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the backend for `name`, creating the suite if absent.
    ///
    /// `None` selects [`DEFAULT_SUITE`].
    pub fn suite(self: &Arc<Self>, name: Option<&str>) -> Result<Arc<DiskBackend>, BackendError> {
        let name = name.unwrap_or(DEFAULT_SUITE);
        validate_suite_name(name)?;

        let mut suites = self.suites.lock();
        if let Some(existing) = suites.get(name).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let keyspace = self
            .db
            .keyspace(&format!("{}{}", SUITE_PREFIX, name), KeyspaceCreateOptions::default)?;

        let marker = format!("{}{}", META_SUITES_PREFIX, name);
        if self.meta.get(&marker)?.is_none() {
            self.meta.insert(&marker, name.as_bytes())?;
            self.db.persist(PersistMode::SyncAll)?;
            info!(suite = name, "created suite");
        }

        let backend = Arc::new(DiskBackend {
            suite: name.to_string(),
            database: Arc::clone(self),
            keyspace,
            listeners: ListenerRegistry::new(),
        });
        suites.insert(name.to_string(), Arc::downgrade(&backend));
        Ok(backend)
    }

    /// Names of every suite ever created in this database.
    pub fn suites(&self) -> Result<Vec<String>, BackendError> {
        let mut names = Vec::new();
        for kv in self.meta.prefix(META_SUITES_PREFIX) {
            let Ok(key_bytes) = kv.key() else {
                continue;
            };
            let key_str = String::from_utf8_lossy(&key_bytes);
            if let Some(name) = key_str.strip_prefix(META_SUITES_PREFIX) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

impl std::fmt::Debug for DiskDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskDatabase")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn validate_suite_name(name: &str) -> Result<(), BackendError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_SUITE_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BackendError::InvalidSuite(name.to_string()))
    }
}

/// One suite of a [`DiskDatabase`]. Keeps its database open while alive.
pub struct DiskBackend {
    suite: String,
    database: Arc<DiskDatabase>,
    keyspace: Keyspace,
    listeners: ListenerRegistry,
}

impl DiskBackend {
    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn database(&self) -> &Arc<DiskDatabase> {
        &self.database
    }

    fn decode_entry(&self, key: &str, bytes: &[u8]) -> Result<Primitive, BackendError> {
        entry::decode(bytes).map_err(|reason| BackendError::CorruptEntry {
            key: key.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for DiskBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskBackend")
            .field("suite", &self.suite)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl PrefsBackend for DiskBackend {
    fn get_all(&self) -> Result<BTreeMap<String, Primitive>, BackendError> {
        let mut entries = BTreeMap::new();

        for kv in self.keyspace.iter() {
            let (key_bytes, bytes) = kv.into_inner()?;
            let Ok(key) = String::from_utf8(key_bytes.to_vec()) else {
                warn!(suite = %self.suite, "skipping entry with non UTF-8 key");
                continue;
            };

            match self.decode_entry(&key, &bytes) {
                Ok(value) => {
                    entries.insert(key, value);
                }
                Err(e) => {
                    warn!(suite = %self.suite, key = %key, error = %e, "skipping unreadable entry");
                }
            }
        }

        trace!(suite = %self.suite, count = entries.len(), "loaded all entries");
        Ok(entries)
    }

    fn get(&self, key: &str) -> Result<Option<Primitive>, BackendError> {
        let Some(bytes) = self.keyspace.get(key)? else {
            return Ok(None);
        };
        self.decode_entry(key, &bytes).map(Some)
    }

    fn commit(&self, edits: Vec<Edit>) -> Result<(), BackendError> {
        let mut changed = Vec::with_capacity(edits.len());

        for edit in edits {
            match edit {
                Edit::Put { key, value } => {
                    self.keyspace.insert(&key, entry::encode(&value).as_slice())?;
                    changed.push(key);
                }
                Edit::Remove { key } => {
                    self.keyspace.remove(&key)?;
                    changed.push(key);
                }
            }
        }
        self.database.db.persist(PersistMode::SyncAll)?;
        debug!(suite = %self.suite, edits = changed.len(), "committed");

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
