use super::*;
use crate::storage::MemoryStorage;

fn store_with(storage: &MemoryStorage) -> SessionStore {
    SessionStore::load(Arc::new(storage.clone()))
}

// =============================================================
// SessionStore basics
// =============================================================

#[test]
fn empty_storage_yields_empty_session() {
    let store = store_with(&MemoryStorage::new());
    assert_eq!(store.snapshot(), Session::default());
    assert!(!store.is_authenticated());
}

#[test]
fn set_credential_authenticates_immediately() {
    for token in ["a", "tok1", "eyJhbGciOiJIUzI1NiJ9.payload.sig"] {
        let store = store_with(&MemoryStorage::new());
        store.set_credential(token);
        assert!(store.is_authenticated(), "token {token:?}");
        assert_eq!(store.credential(), token);
    }
}

#[test]
fn set_credential_writes_through() {
    let storage = MemoryStorage::new();
    let store = store_with(&storage);
    store.set_credential("tok1");
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("tok1"));
}

#[test]
fn clear_deauthenticates_and_removes_keys() {
    let storage = MemoryStorage::new();
    let store = store_with(&storage);
    store.set_credential("tok1");
    store.set_principal_name("alice");

    store.clear();

    assert!(!store.is_authenticated());
    assert_eq!(store.snapshot(), Session::default());
    assert!(storage.is_empty());
}

#[test]
fn clear_is_idempotent() {
    let storage = MemoryStorage::new();
    let store = store_with(&storage);
    store.set_credential("tok1");

    store.clear();
    let once = store.snapshot();
    store.clear();

    assert_eq!(store.snapshot(), once);
    assert!(storage.is_empty());
}

#[test]
fn principal_name_is_independent_of_credential() {
    let storage = MemoryStorage::new();
    let store = store_with(&storage);
    store.set_principal_name("alice");
    assert!(!store.is_authenticated());
    assert_eq!(store.principal_name(), "alice");
    assert_eq!(storage.get_item(USERNAME_KEY).as_deref(), Some("alice"));
}

#[test]
fn empty_credential_clears_whole_session() {
    let storage = MemoryStorage::new();
    let store = store_with(&storage);
    store.set_credential("tok1");
    store.set_principal_name("alice");

    store.set_credential("");

    assert_eq!(store.snapshot(), Session::default());
    assert!(storage.is_empty());
}

#[test]
fn clones_share_state() {
    let store = store_with(&MemoryStorage::new());
    let other = store.clone();
    store.set_credential("tok1");
    assert!(other.is_authenticated());
    other.clear();
    assert!(!store.is_authenticated());
}

#[test]
fn debug_output_hides_credential() {
    let store = store_with(&MemoryStorage::new());
    store.set_credential("super-secret");
    let rendered = format!("{store:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("authenticated: true"));
}

// =============================================================
// Restart round-trip
// =============================================================

#[test]
fn credential_survives_reload() {
    let storage = MemoryStorage::new();
    store_with(&storage).set_credential("tok1");

    let reloaded = store_with(&storage);
    assert!(reloaded.is_authenticated());
    assert_eq!(reloaded.credential(), "tok1");
}

#[test]
fn reload_without_username_tolerates_empty_principal() {
    let storage = MemoryStorage::new();
    storage.set_item(TOKEN_KEY, "legacy");

    let store = store_with(&storage);
    assert!(store.is_authenticated());
    assert_eq!(store.principal_name(), "");
}

#[test]
fn credential_survives_reload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = SessionStore::load(Arc::new(crate::storage::FileStorage::new(&path)));
    store.set_credential("tok1");
    store.set_principal_name("alice");
    drop(store);

    let reloaded = SessionStore::load(Arc::new(crate::storage::FileStorage::new(&path)));
    assert_eq!(
        reloaded.snapshot(),
        Session { credential: "tok1".into(), principal_name: "alice".into() }
    );
}

// =============================================================
// SessionContext lifecycle
// =============================================================

#[test]
fn context_uninitialized_until_initialize() {
    let ctx = SessionContext::new();
    assert!(!ctx.is_ready());
    assert_eq!(ctx.store().unwrap_err(), SessionError::Uninitialized);
}

#[test]
fn context_store_shares_state_with_initialize_result() {
    let ctx = SessionContext::new();
    let store = ctx.initialize(Arc::new(MemoryStorage::new()));
    store.set_credential("tok1");
    assert!(ctx.store().unwrap().is_authenticated());
}

#[test]
fn context_second_initialize_keeps_first_store() {
    let ctx = SessionContext::new();
    let first = ctx.initialize(Arc::new(MemoryStorage::new()));
    first.set_credential("tok1");

    let second = ctx.initialize(Arc::new(MemoryStorage::new()));
    assert_eq!(second.credential(), "tok1");
}

#[test]
fn context_teardown_keeps_persisted_state() {
    let storage = MemoryStorage::new();
    let ctx = SessionContext::new();
    ctx.initialize(Arc::new(storage.clone())).set_credential("tok1");

    ctx.teardown();
    assert!(!ctx.is_ready());
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("tok1"));

    let store = ctx.initialize(Arc::new(storage));
    assert!(store.is_authenticated());
}
