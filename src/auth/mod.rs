//! Session handling and route guarding
//!
//! The client never issues or verifies credentials itself. It keeps the
//! session returned by `/auth/login` and hands its access token to the
//! [`ApiClient`](crate::api::ApiClient) through the [`SessionSource`] seam.
//!
//! # Module Structure
//!
//! - [`auth::session`](crate::auth::session) - Session persistence and token sources
//! - [`auth::guard`](crate::auth::guard) - Protected/auth route decisions
//!
//! # Usage
//!
//! ```ignore
//! use glimps::auth::{SessionStore, RouteGuard, GuardDecision};
//!
//! let store = Arc::new(SessionStore::open(&config.auth.session_file)?);
//! let client = ApiClient::new(&config.api.base_url, store.clone(), options)?;
//!
//! match RouteGuard::default().check("/projects", store.is_authenticated()) {
//!     GuardDecision::Allow => { /* render */ }
//!     GuardDecision::RedirectToLogin { location } => { /* go to location */ }
//!     GuardDecision::RedirectToDashboard => { /* go to dashboard */ }
//! }
//! ```

use async_trait::async_trait;

/// Route guard for protected and auth-only pages.
pub mod guard;
/// Session persistence and static token sources.
pub mod session;

pub use guard::{GuardDecision, RouteGuard};
pub use session::{Session, SessionStore, StaticSession};

/// Anything that can hand out the current access token.
///
/// Consulted by the HTTP adapter whenever its cached token is missing or
/// about to expire. Returning `None` keeps whatever token is already cached.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}
