use super::*;
use crate::error::GuardError;
use crate::storage::MemoryStorage;

fn ready_navigator() -> (Navigator, crate::session::SessionStore) {
    let ctx = SessionContext::new();
    let store = ctx.initialize(Arc::new(MemoryStorage::new()));
    (Navigator::new(RouteTable::standard(), ctx), store)
}

// =============================================================
// RouteTable
// =============================================================

#[test]
fn standard_table_has_public_login_and_protected_explorer() {
    let table = RouteTable::standard();
    assert_eq!(table.login(), &Route::public(LOGIN_ROUTE, "/"));
    assert!(table.by_name(EXPLORER_ROUTE).unwrap().requires_auth);
    assert_eq!(table.iter().count(), 2);
}

#[test]
fn login_route_is_forced_public() {
    let table = RouteTable::new(Route::protected("signin", "/signin"));
    assert!(!table.login().requires_auth);
}

#[test]
fn with_route_replaces_by_name_but_not_login() {
    let table = RouteTable::standard()
        .with_route(Route::public(EXPLORER_ROUTE, "/files"))
        .with_route(Route::protected(LOGIN_ROUTE, "/elsewhere"));
    assert_eq!(table.by_name(EXPLORER_ROUTE).unwrap().path, "/files");
    assert_eq!(table.login().path, "/");
    assert!(!table.login().requires_auth);
}

#[test]
fn by_path_ignores_trailing_slash() {
    let table = RouteTable::standard();
    assert_eq!(table.by_path("/explorer/").unwrap().name, EXPLORER_ROUTE);
    assert_eq!(table.by_path("/").unwrap().name, LOGIN_ROUTE);
    assert!(table.by_path("/missing").is_none());
}

// =============================================================
// Navigator
// =============================================================

#[test]
fn no_current_view_before_first_navigation() {
    let (nav, _store) = ready_navigator();
    assert!(nav.current().is_none());
}

#[test]
fn protected_push_without_session_lands_on_login() {
    let (nav, _store) = ready_navigator();
    let outcome = nav.push(EXPLORER_ROUTE).unwrap();
    assert_eq!(
        outcome,
        Navigation::Redirected { from: EXPLORER_ROUTE.into(), to: RouteTable::standard().login().clone() }
    );
    assert_eq!(nav.current().unwrap().name, LOGIN_ROUTE);
}

#[test]
fn protected_push_with_session_enters() {
    let (nav, store) = ready_navigator();
    store.set_credential("tok1");
    let outcome = nav.push_path("/explorer").unwrap();
    assert_eq!(outcome.route().name, EXPLORER_ROUTE);
    assert!(matches!(outcome, Navigation::Entered(_)));
    assert_eq!(nav.current().unwrap().name, EXPLORER_ROUTE);
}

#[test]
fn unknown_route_leaves_current_view() {
    let (nav, _store) = ready_navigator();
    nav.push(LOGIN_ROUTE).unwrap();
    assert_eq!(nav.push("nope").unwrap_err(), NavigationError::UnknownRoute("nope".into()));
    assert_eq!(nav.push_path("/nope").unwrap_err(), NavigationError::UnknownPath("/nope".into()));
    assert_eq!(nav.current().unwrap().name, LOGIN_ROUTE);
}

#[test]
fn redirect_to_login_replaces_current_view() {
    let (nav, store) = ready_navigator();
    store.set_credential("tok1");
    nav.push(EXPLORER_ROUTE).unwrap();

    let outcome = nav.redirect_to_login().unwrap();
    assert_eq!(outcome.route().name, LOGIN_ROUTE);
    assert_eq!(nav.current().unwrap().name, LOGIN_ROUTE);
}

#[test]
fn uninitialized_session_denies_and_never_enters() {
    let nav = Navigator::new(RouteTable::standard(), SessionContext::new());
    let err = nav.push(EXPLORER_ROUTE).unwrap_err();
    assert!(matches!(err, NavigationError::Denied(GuardError::SessionNotReady { .. })));
    assert!(nav.current().is_none());
}

#[test]
fn clones_share_current_view() {
    let (nav, _store) = ready_navigator();
    let other = nav.clone();
    nav.push(LOGIN_ROUTE).unwrap();
    assert_eq!(other.current().unwrap().name, LOGIN_ROUTE);
}
