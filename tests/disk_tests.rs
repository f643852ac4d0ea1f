//! Persistence through the fjall-backed suites.

#![cfg(feature = "kv")]

mod common;

use std::collections::HashMap;

use prefs_kv::{BackendError, DiskDatabase, PreferenceStore, PrefsBackend, Primitive, Url, Value};
use tempfile::TempDir;

use common::{Hits, PREFIX_LOOKALIKE_BLOB, date};

#[test]
fn test_values_survive_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    {
        let store = PreferenceStore::open(dir.path(), None)?;
        store.set_integer("launches", 3);
        store.set_double("volume", 0.75);
        store.set_bool("muted", false);
        store.set_string("theme", "dark");
        store.set_object("big", Some(Value::Long(i64::MIN)));
        store.set_object("avatar", Some(Value::Data(PREFIX_LOOKALIKE_BLOB.to_vec())));
        store.set_object("since", Some(Value::Date(date("2023-07-04T09:00:00Z"))));
        store.set_object(
            "site",
            Some(Value::Url(Url::parse("https://example.com/x")?)),
        );
    }

    let store = PreferenceStore::open(dir.path(), None)?;
    assert_eq!(store.integer_for("launches"), Some(3));
    assert_eq!(store.double_for("volume"), Some(0.75));
    assert_eq!(store.bool_for("muted"), Some(false));
    assert_eq!(store.string_for("theme").as_deref(), Some("dark"));
    assert_eq!(store.integer_for("big"), Some(i64::MIN));
    assert_eq!(store.data_for("avatar").as_deref(), Some(PREFIX_LOOKALIKE_BLOB));
    assert_eq!(store.date_for("since"), Some(date("2023-07-04T09:00:00Z")));
    assert_eq!(
        store.url_for("site").map(String::from).as_deref(),
        Some("https://example.com/x")
    );
    Ok(())
}

#[test]
fn test_remove_persists_and_defaults_do_not() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    {
        let mut store = PreferenceStore::open(dir.path(), Some("app"))?;
        store.register(HashMap::from([("x".to_string(), Value::Int(5))]));
        store.set_integer("x", 7);
        store.set_integer("y", 1);
        store.remove_object("y");
        assert_eq!(store.integer_for("x"), Some(7));
    }

    let store = PreferenceStore::open(dir.path(), Some("app"))?;
    assert_eq!(store.integer_for("x"), Some(7));
    assert_eq!(store.integer_for("y"), None);
    store.remove_object("x");
    assert_eq!(store.integer_for("x"), None);
    Ok(())
}

#[test]
fn test_suites_are_isolated() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let db = DiskDatabase::open(dir.path())?;

    let first = PreferenceStore::new(db.suite(Some("first"))?);
    let second = PreferenceStore::new(db.suite(Some("second"))?);

    first.set_string("shared-key", "one");
    second.set_string("shared-key", "two");

    assert_eq!(first.string_for("shared-key").as_deref(), Some("one"));
    assert_eq!(second.string_for("shared-key").as_deref(), Some("two"));

    let mut suites = db.suites()?;
    suites.sort();
    assert_eq!(suites, vec!["first".to_string(), "second".to_string()]);
    Ok(())
}

#[test]
fn test_invalid_suite_name_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let db = DiskDatabase::open(dir.path())?;

    assert!(matches!(
        db.suite(Some("../escape")),
        Err(BackendError::InvalidSuite(_))
    ));
    Ok(())
}

#[test]
fn test_observers_share_suite_handle() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let db = DiskDatabase::open(dir.path())?;

    let writer = PreferenceStore::new(db.suite(None)?);
    let watcher = PreferenceStore::new(db.suite(None)?);
    let hits = Hits::default();
    let _sub = watcher.observe("theme", hits.callback());

    writer.set_string("theme", "dark");
    writer.set_string("font", "mono");

    assert_eq!(hits.count(), 1);
    assert_eq!(watcher.string_for("theme").as_deref(), Some("dark"));
    Ok(())
}

#[test]
fn test_backend_lists_native_primitives() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let db = DiskDatabase::open(dir.path())?;
    let backend = db.suite(None)?;
    let store = PreferenceStore::new(backend.clone());

    store.set_integer("a", 1);
    store.set_object("b", Some(Value::Data(vec![0xde, 0xad])));

    let all = backend.get_all()?;
    assert_eq!(all.get("a"), Some(&Primitive::Int(1)));
    assert_eq!(all.get("b"), Some(&Primitive::String("__data__:3q0=".into())));
    assert_eq!(all.len(), 2);
    Ok(())
}

#[test]
fn test_open_same_path_twice_shares_suite() -> anyhow::Result<()> {
    let dir = TempDir::new()?;

    let writer = PreferenceStore::open(dir.path(), None)?;
    let watcher = PreferenceStore::open(dir.path(), None)?;
    let other_suite = PreferenceStore::open(dir.path(), Some("other"))?;

    let hits = Hits::default();
    let _sub = watcher.observe("theme", hits.callback());

    writer.set_string("theme", "dark");
    other_suite.set_string("theme", "light");

    assert_eq!(hits.count(), 1);
    assert_eq!(watcher.string_for("theme").as_deref(), Some("dark"));
    assert_eq!(other_suite.string_for("theme").as_deref(), Some("light"));
    Ok(())
}

#[test]
fn test_open_over_a_file_is_an_io_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x")?;

    assert!(matches!(
        DiskDatabase::open(&file),
        Err(BackendError::Io(_))
    ));
    Ok(())
}
