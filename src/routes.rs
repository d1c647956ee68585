//! Route table and navigator.
//!
//! DESIGN
//! ======
//! Routes are plain data: a name, a path and the `requires_auth` flag the
//! guard consumes. The `Navigator` owns the current view and is the only
//! thing that changes it; every `push` goes through the guard first. The
//! request pipeline holds a clone so it can force the login view after a
//! 401.

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::NavigationError;
use crate::guard::{GuardDecision, NavigationGuard};
use crate::session::SessionContext;

pub const LOGIN_ROUTE: &str = "login";
pub const EXPLORER_ROUTE: &str = "explorer";

// =============================================================================
// ROUTES
// =============================================================================

/// A routable view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub path: String,
    pub requires_auth: bool,
}

impl Route {
    #[must_use]
    pub fn public(name: &str, path: &str) -> Self {
        Self { name: name.to_owned(), path: path.to_owned(), requires_auth: false }
    }

    #[must_use]
    pub fn protected(name: &str, path: &str) -> Self {
        Self { name: name.to_owned(), path: path.to_owned(), requires_auth: true }
    }
}

/// Named routes plus the designated login route.
#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
    login: usize,
}

impl RouteTable {
    /// Start a table from its login route. The login route is always
    /// public, whatever flag it was built with.
    #[must_use]
    pub fn new(mut login: Route) -> Self {
        login.requires_auth = false;
        Self { routes: vec![login], login: 0 }
    }

    /// Add a route, replacing any route with the same name. The login
    /// route itself cannot be replaced.
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        match self.routes.iter().position(|r| r.name == route.name) {
            Some(i) if i == self.login => {
                tracing::warn!(route = %route.name, "login route cannot be replaced");
            }
            Some(i) => self.routes[i] = route,
            None => self.routes.push(route),
        }
        self
    }

    /// Login at `/`, file explorer at `/explorer` behind authentication.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Route::public(LOGIN_ROUTE, "/")).with_route(Route::protected(EXPLORER_ROUTE, "/explorer"))
    }

    #[must_use]
    pub fn login(&self) -> &Route {
        &self.routes[self.login]
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Exact path match; a trailing `/` is ignored except on the root.
    #[must_use]
    pub fn by_path(&self, path: &str) -> Option<&Route> {
        let wanted = normalize_path(path);
        self.routes.iter().find(|r| normalize_path(&r.path) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Result of a completed navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The requested route is now the current view.
    Entered(Route),
    /// The requested route was refused; `to` is now the current view.
    Redirected { from: String, to: Route },
}

impl Navigation {
    /// The route that ended up current.
    #[must_use]
    pub fn route(&self) -> &Route {
        match self {
            Self::Entered(route) | Self::Redirected { to: route, .. } => route,
        }
    }
}

/// Owns the current view. Clones share it.
#[derive(Clone, Debug)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

#[derive(Debug)]
struct NavigatorInner {
    routes: RouteTable,
    guard: NavigationGuard,
    current: RwLock<Option<Route>>,
}

impl Navigator {
    #[must_use]
    pub fn new(routes: RouteTable, context: SessionContext) -> Self {
        let guard = NavigationGuard::new(context, routes.login().clone());
        Self { inner: Arc::new(NavigatorInner { routes, guard, current: RwLock::new(None) }) }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// The view currently entered, if any navigation has happened.
    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.inner.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Navigate to a route by name.
    ///
    /// # Errors
    ///
    /// `UnknownRoute` for names not in the table; `Denied` when the guard
    /// refuses outright. The current view is unchanged in both cases.
    pub fn push(&self, name: &str) -> Result<Navigation, NavigationError> {
        let route = self
            .inner
            .routes
            .by_name(name)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownRoute(name.to_owned()))?;
        self.enter(route)
    }

    /// Navigate to a route by path.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::push`], with `UnknownPath` for unmatched paths.
    pub fn push_path(&self, path: &str) -> Result<Navigation, NavigationError> {
        let route = self
            .inner
            .routes
            .by_path(path)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownPath(path.to_owned()))?;
        self.enter(route)
    }

    /// Force the login view, cancelling whatever view is current.
    ///
    /// # Errors
    ///
    /// `Denied` if the session context is not initialized.
    pub fn redirect_to_login(&self) -> Result<Navigation, NavigationError> {
        let login = self.inner.routes.login().clone();
        self.enter(login)
    }

    fn enter(&self, route: Route) -> Result<Navigation, NavigationError> {
        match self.inner.guard.check(&route) {
            GuardDecision::Proceed => {
                self.set_current(route.clone());
                tracing::debug!(route = %route.name, "navigated");
                Ok(Navigation::Entered(route))
            }
            GuardDecision::Redirect(to) => {
                self.set_current(to.clone());
                Ok(Navigation::Redirected { from: route.name, to })
            }
            GuardDecision::Deny(e) => Err(e.into()),
        }
    }

    fn set_current(&self, route: Route) {
        *self.inner.current.write().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}
