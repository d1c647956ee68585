//! # cloud-explorer
//!
//! Session layer for the cloud file explorer: a persisted bearer-token
//! session, a navigation guard for protected views, and a request pipeline
//! that attaches the token to API calls and logs out on 401.
//!
//! DESIGN
//! ======
//! Components are wired explicitly rather than through globals:
//!
//! 1. `SessionContext::initialize` loads the `SessionStore` from storage.
//! 2. `Navigator` (which owns the `NavigationGuard`) reads the context.
//! 3. `ApiClient` runs every call through the `RequestPipeline`, which
//!    resolves the store from the same context on every call and shares
//!    the navigator.
//!
//! The native build persists the session in a JSON file; the `hydrate`
//! feature adds a `localStorage` backend for the browser.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ExplorerAction, ExplorerTarget};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, GuardError, NavigationError, SessionError};
pub use guard::{GuardDecision, NavigationGuard};
pub use pipeline::RequestPipeline;
pub use routes::{Navigation, Navigator, Route, RouteTable};
pub use session::{Session, SessionContext, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
