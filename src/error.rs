//! Error types for the session layer.
//!
//! ERROR HANDLING
//! ==============
//! The session store itself is total and never appears here: storage
//! failures are logged and absorbed. Everything that can fail at a call site
//! (configuration, navigation, HTTP) gets a typed enum so callers can match
//! on the cases they care about, most importantly `ApiError::Unauthorized`.

/// Configuration could not be assembled from the environment or flags.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API base URL is not an absolute `http(s)` URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// The process-wide session container was used before `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session state has not been initialized")]
    Uninitialized,
}

/// Reason the navigation guard refused a transition outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The guard ran before the session container was initialized.
    #[error("navigation to `{route}` denied: {source}")]
    SessionNotReady { route: String, source: SessionError },
}

/// A navigation request could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route named `{0}`")]
    UnknownRoute(String),

    #[error("no route for path `{0}`")]
    UnknownPath(String),

    #[error(transparent)]
    Denied(#[from] GuardError),
}

/// An outbound API call failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the credential (HTTP 401). The session has
    /// already been cleared when this is returned.
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    /// The backend returned any other non-success status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The explorer action was sent through a helper that cannot decode
    /// its response.
    #[error("explorer action `{action}` must go through `{helper}`")]
    UnsupportedAction { action: &'static str, helper: &'static str },

    /// An explorer call needs the principal name to build its URL.
    #[error("no principal name in session; log in first")]
    MissingPrincipal,

    /// The session context was not initialized when the call needed it.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// HTTP status carried by the failure, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
