//! Navigation guard for protected views.
//!
//! Runs synchronously before every transition and only reads in-memory
//! state. The guard never touches the network and never retries.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use crate::error::GuardError;
use crate::routes::Route;
use crate::session::SessionContext;

/// Outcome of a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Enter the destination unmodified.
    Proceed,
    /// Cancel the transition and enter this route instead.
    Redirect(Route),
    /// Cancel the transition and stay where we are.
    Deny(GuardError),
}

/// Checks each destination's `requires_auth` flag against the session.
#[derive(Clone, Debug)]
pub struct NavigationGuard {
    context: SessionContext,
    login: Route,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(context: SessionContext, login: Route) -> Self {
        Self { context, login }
    }

    #[must_use]
    pub fn login_route(&self) -> &Route {
        &self.login
    }

    /// Decide whether `to` may be entered.
    ///
    /// Fails closed when the session context has not been initialized,
    /// whatever the destination: that is a startup-ordering bug, not a
    /// logged-out user.
    #[must_use]
    pub fn check(&self, to: &Route) -> GuardDecision {
        let store = match self.context.store() {
            Ok(store) => store,
            Err(source) => {
                tracing::error!(route = %to.name, error = %source, "navigation guard ran before session init");
                return GuardDecision::Deny(GuardError::SessionNotReady { route: to.name.clone(), source });
            }
        };

        if !to.requires_auth {
            return GuardDecision::Proceed;
        }

        if store.is_authenticated() {
            GuardDecision::Proceed
        } else {
            tracing::info!(route = %to.name, login = %self.login.name, "unauthenticated; redirecting to login");
            GuardDecision::Redirect(self.login.clone())
        }
    }
}
