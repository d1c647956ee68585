use super::*;
use std::sync::Arc;

use crate::error::SessionError;
use crate::routes::{EXPLORER_ROUTE, LOGIN_ROUTE};
use crate::storage::MemoryStorage;

fn login() -> Route {
    Route::public(LOGIN_ROUTE, "/")
}

fn explorer() -> Route {
    Route::protected(EXPLORER_ROUTE, "/explorer")
}

fn ready_guard() -> (NavigationGuard, crate::session::SessionStore) {
    let ctx = SessionContext::new();
    let store = ctx.initialize(Arc::new(MemoryStorage::new()));
    (NavigationGuard::new(ctx, login()), store)
}

// =============================================================
// Protected destinations
// =============================================================

#[test]
fn protected_unauthenticated_redirects_to_login() {
    let (guard, _store) = ready_guard();
    assert_eq!(guard.check(&explorer()), GuardDecision::Redirect(login()));
}

#[test]
fn protected_authenticated_proceeds() {
    let (guard, store) = ready_guard();
    store.set_credential("tok1");
    assert_eq!(guard.check(&explorer()), GuardDecision::Proceed);
}

#[test]
fn protected_after_clear_redirects_again() {
    let (guard, store) = ready_guard();
    store.set_credential("tok1");
    store.clear();
    assert_eq!(guard.check(&explorer()), GuardDecision::Redirect(login()));
}

// =============================================================
// Unprotected destinations
// =============================================================

#[test]
fn unprotected_proceeds_regardless_of_session() {
    let (guard, store) = ready_guard();
    let about = Route::public("about", "/about");

    assert_eq!(guard.check(&about), GuardDecision::Proceed);
    assert_eq!(guard.check(&login()), GuardDecision::Proceed);

    store.set_credential("tok1");
    assert_eq!(guard.check(&about), GuardDecision::Proceed);
    assert_eq!(guard.check(&login()), GuardDecision::Proceed);
}

// =============================================================
// Readiness
// =============================================================

#[test]
fn uninitialized_context_denies_protected() {
    let guard = NavigationGuard::new(SessionContext::new(), login());
    assert_eq!(
        guard.check(&explorer()),
        GuardDecision::Deny(GuardError::SessionNotReady {
            route: EXPLORER_ROUTE.into(),
            source: SessionError::Uninitialized,
        })
    );
}

#[test]
fn uninitialized_context_denies_unprotected_too() {
    let guard = NavigationGuard::new(SessionContext::new(), login());
    assert!(matches!(guard.check(&login()), GuardDecision::Deny(_)));
}

#[test]
fn torn_down_context_fails_closed() {
    let ctx = SessionContext::new();
    ctx.initialize(Arc::new(MemoryStorage::new())).set_credential("tok1");
    let guard = NavigationGuard::new(ctx.clone(), login());
    assert_eq!(guard.check(&explorer()), GuardDecision::Proceed);

    ctx.teardown();
    assert!(matches!(guard.check(&explorer()), GuardDecision::Deny(_)));
}
