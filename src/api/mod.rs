//! REST client for the GLIMPS backend
//!
//! [`ApiClient`] is the single HTTP adapter: it attaches the bearer credential,
//! caches it for a fixed validity window, and turns backend failures into
//! [`AppError`](crate::types::AppError). The resource modules are thin typed
//! wrappers over it, one per backend resource.
//!
//! # Endpoints (`/api/v1`)
//!
//! ## Auth
//! - `POST /auth/login`, `POST /auth/register`, `GET /auth/me`
//!
//! ## Projects
//! - `GET /projects/`, `POST /projects/`, `GET|PATCH|DELETE /projects/{id}`
//! - `GET /projects/stats/trained-models`
//!
//! ## Molecules
//! - `GET /molecules/?project_id=`, `POST /molecules/` (multipart)
//! - `GET|DELETE /molecules/{id}`, `GET /molecules/{id}/structure`
//!
//! ## Models
//! - `GET /models/?project_id=`, `POST /models/`, `GET|DELETE /models/{id}`
//! - `POST /models/{id}/train`, `POST /models/{id}/inference` (multipart)
//!
//! ## Jobs
//! - `GET /jobs/`, `GET|DELETE /jobs/{id}`
//! - `GET /jobs/{id}/download`, `POST /jobs/{id}/create-molecule`

/// HTTP adapter with token caching.
pub mod client;
/// Job endpoints.
pub mod jobs;
/// GLIMPS model endpoints.
pub mod models;
/// Molecule endpoints.
pub mod molecules;
/// Project endpoints.
pub mod projects;
/// Auth and current-user endpoints.
pub mod user;

pub use client::{ApiClient, ClientOptions, TokenCache, UnauthorizedHandler};

/// Prefix shared by every backend route.
pub const API_PREFIX: &str = "/api/v1";
