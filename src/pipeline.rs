//! Request/response middleware around every outbound API call.
//!
//! DESIGN
//! ======
//! The two stages are separate methods so they can be exercised without a
//! network: `authorize` mutates a built `reqwest::Request`, and `settle`
//! maps a status code to its session side effects. `finish` glues `settle`
//! onto a real `reqwest::Response` and turns failures into `ApiError`.
//!
//! The store is looked up in the `SessionContext` on every call, so a
//! re-initialized context is picked up immediately. Before initialization
//! requests go out without a credential.
//!
//! A 401 clears the session and forces the login view, and the caller
//! still gets `ApiError::Unauthorized`. Requests already in flight are not
//! cancelled; they settle on their own and deliver their own outcome.

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::error::ApiError;
use crate::routes::Navigator;
use crate::error::SessionError;
use crate::session::{SessionContext, SessionStore};

/// What the response stage does for a given status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseAction {
    /// Hand the outcome to the caller untouched.
    PassThrough,
    /// Clear the session and force the login view, then hand the failure on.
    InvalidateSession,
}

/// Pure status classification.
#[must_use]
pub fn classify(status: StatusCode) -> ResponseAction {
    if status == StatusCode::UNAUTHORIZED {
        ResponseAction::InvalidateSession
    } else {
        ResponseAction::PassThrough
    }
}

/// `Bearer <credential>`, or `None` when there is no credential.
#[must_use]
pub fn bearer_value(credential: &str) -> Option<String> {
    if credential.is_empty() {
        None
    } else {
        Some(format!("Bearer {credential}"))
    }
}

/// The paired middleware, sharing the session context and navigator.
#[derive(Clone, Debug)]
pub struct RequestPipeline {
    context: SessionContext,
    navigator: Navigator,
}

impl RequestPipeline {
    #[must_use]
    pub fn new(context: SessionContext, navigator: Navigator) -> Self {
        Self { context, navigator }
    }

    /// The store currently published in the context.
    ///
    /// # Errors
    ///
    /// `SessionError::Uninitialized` before `initialize` or after `teardown`.
    pub fn session(&self) -> Result<SessionStore, SessionError> {
        self.context.store()
    }

    /// Request stage: attach the current credential, if any.
    ///
    /// The credential is read at call time, so a request built before a
    /// `clear()` but authorized after it goes out without a header.
    pub fn authorize(&self, request: &mut reqwest::Request) {
        let credential = match self.session() {
            Ok(store) => store.credential(),
            Err(e) => {
                tracing::error!(error = %e, "request issued before session init; sending without credential");
                String::new()
            }
        };
        let Some(value) = bearer_value(&credential) else {
            request.headers_mut().remove(AUTHORIZATION);
            return;
        };
        match HeaderValue::from_str(&value) {
            Ok(mut header) => {
                header.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, header);
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored credential is not a valid header value; sending without it");
                request.headers_mut().remove(AUTHORIZATION);
            }
        }
    }

    /// Response stage side effects for `status`.
    pub fn settle(&self, status: StatusCode) -> ResponseAction {
        let action = classify(status);
        if action == ResponseAction::InvalidateSession {
            tracing::warn!(status = status.as_u16(), "credential rejected; clearing session");
            match self.session() {
                Ok(store) => store.clear(),
                Err(e) => tracing::error!(error = %e, "no session to clear after 401"),
            }
            if let Err(e) = self.navigator.redirect_to_login() {
                tracing::error!(error = %e, "redirect to login after 401 failed");
            }
        }
        action
    }

    /// Response stage for a received response.
    ///
    /// # Errors
    ///
    /// `ApiError::Unauthorized` for 401 (after the session was cleared),
    /// `ApiError::Status` for every other non-success status.
    pub async fn finish(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let action = self.settle(status);
        let body = response.text().await.unwrap_or_default();
        match action {
            ResponseAction::InvalidateSession => Err(ApiError::Unauthorized { body }),
            ResponseAction::PassThrough => Err(ApiError::Status { status: status.as_u16(), body }),
        }
    }
}
