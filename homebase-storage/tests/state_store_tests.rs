use homebase_storage::{MemoryStateStore, SqliteStateStore, StateStore};
use tempfile::TempDir;

fn exercise(store: &dyn StateStore) {
    assert_eq!(store.load("configuration").unwrap(), None);

    store.save("configuration", br#"{"isEnabled":true}"#).unwrap();
    assert_eq!(
        store.load("configuration").unwrap().as_deref(),
        Some(&br#"{"isEnabled":true}"#[..])
    );

    store.save("configuration", b"{}").unwrap();
    assert_eq!(store.load("configuration").unwrap().as_deref(), Some(&b"{}"[..]));

    store.remove("configuration").unwrap();
    assert_eq!(store.load("configuration").unwrap(), None);

    // Removing again is a no-op
    store.remove("configuration").unwrap();
}

#[test]
fn memory_store_semantics() {
    exercise(&MemoryStateStore::new());
}

#[test]
fn sqlite_in_memory_semantics() {
    exercise(&SqliteStateStore::open_in_memory().unwrap());
}

#[test]
fn sqlite_keys_are_independent() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    store.save("cursor/item", &[1, 2, 3]).unwrap();
    store.save("cursor/habit", &[9]).unwrap();

    assert_eq!(store.load("cursor/item").unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(store.load("cursor/habit").unwrap(), Some(vec![9]));
}

#[test]
fn sqlite_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.db");

    {
        let store = SqliteStateStore::open(&path).unwrap();
        store.save("last_sync", b"\"2026-01-01T00:00:00Z\"").unwrap();
    }

    let reopened = SqliteStateStore::open(&path).unwrap();
    assert_eq!(
        reopened.load("last_sync").unwrap(),
        Some(b"\"2026-01-01T00:00:00Z\"".to_vec())
    );
}

#[test]
fn memory_store_lists_keys() {
    let store = MemoryStateStore::new();
    store.save("b", b"2").unwrap();
    store.save("a", b"1").unwrap();
    assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
}
