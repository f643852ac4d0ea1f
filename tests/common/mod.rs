//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use prefs_kv::{DateTime, MemoryBackend, PreferenceStore, Utc, Value};

// =============================================================================
// Fixtures
// =============================================================================

/// Blob whose bytes spell out the reserved blob prefix.
pub const PREFIX_LOOKALIKE_BLOB: &[u8] = b"__data__:__date__:\x00\xff";

/// Timestamp with sub-second precision and a non-UTC offset.
pub const PRECISE_TIMESTAMP: &str = "2024-02-29T23:59:58.875-05:00";

/// Defaults used across the fallback tests.
pub fn sample_defaults() -> HashMap<String, Value> {
    HashMap::from([
        ("x".to_string(), Value::Int(5)),
        ("theme".to_string(), Value::String("light".to_string())),
        ("volume".to_string(), Value::Float(0.5)),
        (
            "homepage".to_string(),
            Value::String("https://example.com/start".to_string()),
        ),
    ])
}

// =============================================================================
// Helpers
// =============================================================================

/// Store over a fresh memory backend, also returning the backend handle.
pub fn memory_store() -> (PreferenceStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (PreferenceStore::new(backend.clone()), backend)
}

pub fn date(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .unwrap()
}

/// Thread-safe hit counter for change callbacks.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn callback(&self) -> impl Fn() + Send + Sync + 'static {
        let hits = self.0.clone();
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
