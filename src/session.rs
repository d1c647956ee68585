//! Session store: the credential, the principal name, and their persistence.
//!
//! DESIGN
//! ======
//! `SessionStore` is a cheap-to-clone handle; every clone points at the
//! same in-memory `Session` and the same storage backend. Navigation guard,
//! request pipeline and login flow all hold clones of one store, so a
//! `clear()` from the pipeline is visible to the next guard check and the
//! next outbound request.
//!
//! `SessionContext` is the process-wide slot the store lives in. It must be
//! initialized explicitly during startup; consumers that run before that
//! (the guard in particular) get `SessionError::Uninitialized` instead of an
//! implicitly empty session.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::SessionError;
use crate::storage::{KeyValueStorage, TOKEN_KEY, USERNAME_KEY};

// =============================================================================
// SESSION
// =============================================================================

/// Snapshot of the authentication state. Empty strings mean "absent".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub principal_name: String,
}

impl Session {
    /// Read the committed session from storage. Missing keys are empty.
    #[must_use]
    pub fn from_storage(storage: &dyn KeyValueStorage) -> Self {
        Self {
            credential: storage.get_item(TOKEN_KEY).unwrap_or_default(),
            principal_name: storage.get_item(USERNAME_KEY).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.credential.is_empty()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Shared, write-through session store.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SessionStore")
            .field("authenticated", &state.is_authenticated())
            .field("principal_name", &state.principal_name)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Build a store whose initial state is whatever `storage` holds.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let session = Session::from_storage(storage.as_ref());
        tracing::debug!(
            authenticated = session.is_authenticated(),
            principal = %session.principal_name,
            "session loaded from storage"
        );
        Self { state: Arc::new(RwLock::new(session)), storage }
    }

    /// Current credential; empty when logged out.
    #[must_use]
    pub fn credential(&self) -> String {
        self.read().credential.clone()
    }

    /// Current principal name; empty when unknown.
    #[must_use]
    pub fn principal_name(&self) -> String {
        self.read().principal_name.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    /// Derived from the credential on every call.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Store a credential. An empty token is a logout, not a half-set state.
    pub fn set_credential(&self, token: &str) {
        if token.is_empty() {
            tracing::warn!("empty credential supplied; clearing session");
            self.clear();
            return;
        }
        let mut state = self.write();
        self.storage.set_item(TOKEN_KEY, token);
        token.clone_into(&mut state.credential);
    }

    /// Store the display name; independent of credential validity.
    pub fn set_principal_name(&self, name: &str) {
        let mut state = self.write();
        self.storage.set_item(USERNAME_KEY, name);
        name.clone_into(&mut state.principal_name);
    }

    /// Forget credential and principal name, in memory and in storage.
    pub fn clear(&self) {
        let mut state = self.write();
        self.storage.remove_item(TOKEN_KEY);
        self.storage.remove_item(USERNAME_KEY);
        if state.is_authenticated() {
            tracing::info!(principal = %state.principal_name, "session cleared");
        }
        *state = Session::default();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Process-wide slot holding the one `SessionStore`.
///
/// Lifecycle: `new` (empty) → `initialize` during startup → shared by all
/// components → `teardown` on shutdown or between tests.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    slot: Arc<RwLock<Option<SessionStore>>>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `storage` and publish it. A second call keeps the
    /// existing store and returns it.
    pub fn initialize(&self, storage: Arc<dyn KeyValueStorage>) -> SessionStore {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = slot.as_ref() {
            tracing::warn!("session context already initialized");
            return store.clone();
        }
        let store = SessionStore::load(storage);
        *slot = Some(store.clone());
        tracing::info!("session context initialized");
        store
    }

    /// The initialized store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Uninitialized` before `initialize` or after
    /// `teardown`.
    pub fn store(&self) -> Result<SessionStore, SessionError> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SessionError::Uninitialized)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Drop the published store. Persisted state is left untouched.
    pub fn teardown(&self) {
        self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
    }
}
