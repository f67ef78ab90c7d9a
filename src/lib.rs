//! # GLIMPS client
//!
//! Client library and terminal front end for the GLIMPS molecular
//! backmapping platform. GLIMPS learns a mapping from coarse-grained
//! molecular structures back to atomistic detail; this crate talks to its
//! REST backend and hosts the 3D structure viewer lifecycle.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a CLI** - Run the `glimps` binary
//! 2. **As a library** - Embed the API client or the viewer in another host
//!
//! ### Viewing a structure
//!
//! ```rust,ignore
//! use glimps::viewer::*;
//! use std::sync::Arc;
//!
//! let loader = Arc::new(CapabilityLoader::new());
//! let viewer = StructureViewer::new(
//!     loader.clone(),
//!     Arc::new(HttpStructureSource::new()),
//!     Arc::new(MemoryContainer::new()),
//!     EngineOptions::default(),
//! );
//!
//! let pending = viewer.set_input(ViewerInput::from_url(url, StructureFormat::Pdb, None));
//! loader.resolve(Arc::new(HtmlSceneCapability::remote(LIBRARY_URL)));
//! pending.await?;
//! ```
//!
//! ### Talking to the backend
//!
//! ```rust,ignore
//! use glimps::{api, ApiClient, ClientOptions, SessionStore};
//! use std::sync::Arc;
//!
//! let session = Arc::new(SessionStore::open("~/.glimps/session.json")?);
//! let client = ApiClient::new("http://localhost:8000", session, ClientOptions::default())?;
//! let projects = api::projects::list(&client, 50, 0).await?;
//! ```
//!
//! ## Architecture
//!
//! - [`viewer`]: capability acquisition, instance ownership, style policy
//! - [`api`]: bearer-authenticated REST client and endpoint groups
//! - [`jobs`]: background job polling with backoff
//! - [`views`] and [`forms`]: list/detail state and validated submissions
//! - [`auth`]: persisted session and route guard

#![warn(rustdoc::missing_crate_level_docs)]

/// REST client and endpoint groups.
pub mod api;
/// Session persistence and route guard.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Validated form submissions.
pub mod forms;
/// Job list polling.
pub mod jobs;
/// Process-wide viewer UI state.
pub mod store;
/// Core types (resources, requests, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// 3D structure viewer lifecycle.
pub mod viewer;
/// List and detail view state.
pub mod views;

// Re-export commonly used types
pub use api::{ApiClient, ClientOptions};
pub use auth::{Session, SessionSource, SessionStore};
pub use jobs::{JobPoller, PollerConfig};
pub use types::{AppError, Result};
pub use utils::config::{ConfigError, GlimpsConfig};
pub use viewer::{StructureViewer, ViewerInput, ViewerState};
