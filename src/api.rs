//! HTTP client for the cloud backend.
//!
//! Every call goes through the `RequestPipeline`: the credential is attached
//! right before sending, and the response stage runs before the caller sees
//! the outcome. Thin wrappers on top cover the login flow and the file
//! explorer endpoints; explorer payloads stay opaque JSON.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::pipeline::RequestPipeline;
use crate::routes::{EXPLORER_ROUTE, Navigator};
use crate::session::{SessionContext, SessionStore};

// =============================================================================
// EXPLORER ACTIONS
// =============================================================================

/// File explorer operations understood by `/cloud/{principal}?q=<action>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerAction {
    Index,
    Subfolders,
    Search,
    Preview,
    Download,
    NewFolder,
    NewFile,
    Rename,
    Move,
    Delete,
    Archive,
    DownloadArchive,
    Unarchive,
    Upload,
    Save,
}

impl ExplorerAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Subfolders => "subfolders",
            Self::Search => "search",
            Self::Preview => "preview",
            Self::Download => "download",
            Self::NewFolder => "newfolder",
            Self::NewFile => "newfile",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::Delete => "delete",
            Self::Archive => "archive",
            Self::DownloadArchive => "download_archive",
            Self::Unarchive => "unarchive",
            Self::Upload => "upload",
            Self::Save => "save",
        }
    }

    /// Whether the backend expects this action as a `POST` with a body.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Index | Self::Subfolders | Self::Search | Self::Preview | Self::Download)
    }

    /// Whether the backend answers with raw file bytes instead of JSON.
    #[must_use]
    pub fn returns_bytes(self) -> bool {
        matches!(self, Self::Preview | Self::Download | Self::DownloadArchive)
    }

    /// Byte-returning and multipart actions have their own client method.
    fn ensure_json(self) -> Result<(), ApiError> {
        let helper = match self {
            Self::Preview | Self::Download => "explorer_bytes",
            Self::DownloadArchive => "download_archive",
            Self::Upload => "upload",
            _ => return Ok(()),
        };
        Err(ApiError::UnsupportedAction { action: self.as_str(), helper })
    }
}

/// Storage adapter and path an explorer call targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerTarget {
    pub adapter: Option<String>,
    pub path: Option<String>,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body of `POST /auth/token`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Pipeline-wrapped HTTP client. Clones share the session and navigator.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    navigator: Navigator,
    pipeline: RequestPipeline,
}

impl ApiClient {
    /// Build a client for `config.base_url` sharing `context` and `navigator`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, context: SessionContext, navigator: Navigator) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        let pipeline = RequestPipeline::new(context, navigator.clone());
        Ok(Self { http, base_url: config.base_url.clone(), navigator, pipeline })
    }

    /// The store currently published in the session context.
    ///
    /// # Errors
    ///
    /// `ApiError::Session` when the context is not initialized.
    pub fn session(&self) -> Result<SessionStore, ApiError> {
        Ok(self.pipeline.session()?)
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Absolute URL for a backend path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Send a request through both pipeline stages.
    ///
    /// # Errors
    ///
    /// `ApiError::Http` when no response arrives (session untouched),
    /// otherwise whatever the response stage reports.
    pub async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let mut request = builder.build()?;
        self.pipeline.authorize(&mut request);

        let method = request.method().clone();
        let path = request.url().path().to_owned();
        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "request failed before a response arrived");
            ApiError::Http(e)
        })?;
        tracing::debug!(%method, %path, status = response.status().as_u16(), "response received");

        self.pipeline.finish(response).await
    }

    /// Send a request and decode a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::execute`], plus `ApiError::Parse` for bad JSON.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let text = self.execute(builder).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    // -------------------------------------------------------------------------
    // Login flow
    // -------------------------------------------------------------------------

    /// Exchange username and password for a token, store it, and enter the
    /// explorer view.
    ///
    /// # Errors
    ///
    /// Backend rejections surface as `ApiError::Unauthorized`/`Status`; a
    /// response without a token is `ApiError::Parse`. The session is only
    /// written on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self.post("auth/token").form(&[("username", username), ("password", password)]);
        let token: TokenResponse = self.execute_json(request).await?;
        if token.access_token.is_empty() {
            return Err(ApiError::Parse("empty access_token".into()));
        }

        let session = self.session()?;
        session.set_credential(&token.access_token);
        session.set_principal_name(username);
        tracing::info!(principal = %username, "logged in");

        if let Err(e) = self.navigator.push(EXPLORER_ROUTE) {
            tracing::error!(error = %e, "navigation after login failed");
        }
        Ok(token)
    }

    /// Forget the session and show the login view.
    pub fn logout(&self) {
        match self.session() {
            Ok(session) => session.clear(),
            Err(e) => tracing::error!(error = %e, "logout without an initialized session"),
        }
        if let Err(e) = self.navigator.redirect_to_login() {
            tracing::error!(error = %e, "navigation after logout failed");
        }
    }

    // -------------------------------------------------------------------------
    // File explorer
    // -------------------------------------------------------------------------

    /// Read-only explorer call (`GET`) with a JSON answer.
    ///
    /// # Errors
    ///
    /// `ApiError::UnsupportedAction` for byte-returning actions and
    /// `upload`, `ApiError::MissingPrincipal` without a principal name,
    /// otherwise as [`ApiClient::execute_json`].
    pub async fn explorer(
        &self,
        action: ExplorerAction,
        target: &ExplorerTarget,
        extra: &[(&str, &str)],
    ) -> Result<serde_json::Value, ApiError> {
        action.ensure_json()?;
        let request = self.explorer_request(reqwest::Method::GET, action, target, extra)?;
        self.execute_json(request).await
    }

    /// Mutating explorer call (`POST` with a JSON body).
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::explorer`].
    pub async fn explorer_mutate(
        &self,
        action: ExplorerAction,
        target: &ExplorerTarget,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        action.ensure_json()?;
        let request = self.explorer_request(reqwest::Method::POST, action, target, &[])?.json(body);
        self.execute_json(request).await
    }

    /// Fetch file contents (`preview` or `download`) as raw bytes.
    ///
    /// # Errors
    ///
    /// `ApiError::UnsupportedAction` for any other action, otherwise as
    /// [`ApiClient::execute`].
    pub async fn explorer_bytes(
        &self,
        action: ExplorerAction,
        target: &ExplorerTarget,
        extra: &[(&str, &str)],
    ) -> Result<Bytes, ApiError> {
        let helper = match action {
            ExplorerAction::Preview | ExplorerAction::Download => None,
            ExplorerAction::DownloadArchive => Some("download_archive"),
            ExplorerAction::Upload => Some("upload"),
            _ => Some("explorer"),
        };
        if let Some(helper) = helper {
            return Err(ApiError::UnsupportedAction { action: action.as_str(), helper });
        }
        let request = self.explorer_request(reqwest::Method::GET, action, target, extra)?;
        Ok(self.execute(request).await?.bytes().await?)
    }

    /// Zip `items` (explorer paths) under `name` and return the archive.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::execute`].
    pub async fn download_archive(
        &self,
        target: &ExplorerTarget,
        name: &str,
        items: &[String],
    ) -> Result<Bytes, ApiError> {
        let items: Vec<serde_json::Value> = items.iter().map(|path| serde_json::json!({ "path": path })).collect();
        let body = serde_json::json!({ "name": name, "items": items });
        let request = self
            .explorer_request(reqwest::Method::POST, ExplorerAction::DownloadArchive, target, &[])?
            .json(&body);
        Ok(self.execute(request).await?.bytes().await?)
    }

    /// Upload one file into the target directory as a multipart form.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::execute_json`].
    pub async fn upload(
        &self,
        target: &ExplorerTarget,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<serde_json::Value, ApiError> {
        let part = Part::bytes(contents).file_name(file_name.to_owned());
        let form = Form::new().part("file", part);
        let request = self
            .explorer_request(reqwest::Method::POST, ExplorerAction::Upload, target, &[])?
            .multipart(form);
        self.execute_json(request).await
    }

    /// List a directory.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::explorer`].
    pub async fn list(&self, target: &ExplorerTarget) -> Result<serde_json::Value, ApiError> {
        self.explorer(ExplorerAction::Index, target, &[]).await
    }

    fn explorer_request(
        &self,
        method: reqwest::Method,
        action: ExplorerAction,
        target: &ExplorerTarget,
        extra: &[(&str, &str)],
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let principal = self.session()?.principal_name();
        if principal.is_empty() {
            return Err(ApiError::MissingPrincipal);
        }

        let mut query: Vec<(&str, &str)> = vec![("q", action.as_str())];
        if let Some(adapter) = target.adapter.as_deref() {
            query.push(("adapter", adapter));
        }
        if let Some(path) = target.path.as_deref() {
            query.push(("path", path));
        }
        query.extend_from_slice(extra);

        let url = self.url(&format!("cloud/{principal}"));
        Ok(self.http.request(method, url).query(&query))
    }
}
