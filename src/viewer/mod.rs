//! 3D structure viewer lifecycle
//!
//! The viewer does not draw anything itself. It obtains a
//! [`RenderingCapability`] from an injected [`CapabilityProvider`], binds one
//! [`ViewerInstance`] to a [`SurfaceNode`] inside a host-owned
//! [`ViewerContainer`], feeds it structure text, and applies a style chosen by
//! molecule category.
//!
//! # Lifecycle
//!
//! ```text
//!            input changed / mount
//!                    │
//!                    ▼
//!   ┌──────────── Loading ─────────────┐
//!   │  wait for capability             │
//!   │  dispose previous instance       │
//!   │  attach node, create instance    │
//!   │  resolve payload (data or url)   │
//!   │  add model, style, zoom, render  │
//!   └────────┬─────────────────┬───────┘
//!            ▼                 ▼
//!    Ready { rendered }     Error(message)
//! ```
//!
//! Every load sequence supersedes the previous one. Only the newest sequence
//! may publish state or touch the tracked instance, and nothing is published
//! after [`StructureViewer::unmount`].
//!
//! # Example
//!
//! ```rust,ignore
//! use glimps::viewer::*;
//!
//! let loader = Arc::new(CapabilityLoader::new());
//! let container = Arc::new(MemoryContainer::new());
//! let viewer = StructureViewer::new(
//!     loader.clone(),
//!     Arc::new(HttpStructureSource::new()),
//!     container.clone(),
//!     EngineOptions::default(),
//! );
//!
//! loader.resolve(Arc::new(HtmlSceneCapability::remote(LIBRARY_URL)));
//! viewer.run(ViewerInput::from_data(pdb_text, StructureFormat::Pdb, None)).await;
//! assert_eq!(viewer.state(), ViewerState::Ready { rendered: true });
//! ```

/// Rendering capability contract and providers.
pub mod capability;
/// Host container and surface nodes.
pub mod container;
/// 3Dmol.js scene export capability.
pub mod html;
/// Load sequence and instance ownership.
pub mod lifecycle;
/// Remote structure fetching.
pub mod source;
/// Category-driven style policy.
pub mod style;

pub use capability::{
    CapabilityLoader, CapabilityProvider, CapabilityStatus, EngineOptions, RenderingCapability,
    StaticCapability, ViewerInstance,
};
pub use container::{MemoryContainer, NodeId, SurfaceNode, ViewerContainer};
pub use html::{HtmlSceneCapability, LIBRARY_URL};
pub use lifecycle::{StructureViewer, ViewerInput, ViewerNotice, ViewerState};
pub use source::{HttpStructureSource, StructureSource};
pub use style::{Representation, Style, StyleKind, StylePlan};

use crate::types::{AppError, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything that can end a load sequence in the error state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("Failed to load 3Dmol library: {0}")]
    CapabilityUnavailable(String),

    #[error("Failed to fetch: {0}")]
    Fetch(String),

    #[error("Could not create viewer: {0}")]
    EngineInit(String),

    #[error("Failed to render structure: {0}")]
    Render(String),
}

impl ViewerError {
    /// The diagnostic without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            ViewerError::CapabilityUnavailable(detail)
            | ViewerError::Fetch(detail)
            | ViewerError::EngineInit(detail)
            | ViewerError::Render(detail) => detail,
        }
    }
}

/// Serializations of atomic coordinates the viewer can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    #[default]
    Pdb,
    Gro,
    Mol2,
}

impl StructureFormat {
    /// Format tag understood by the rendering engine.
    pub fn tag(&self) -> &'static str {
        match self {
            StructureFormat::Pdb => "pdb",
            StructureFormat::Gro => "gro",
            StructureFormat::Mol2 => "mol2",
        }
    }

    /// Viewer format for a stored molecule, if it is one the viewer can load.
    pub fn from_file_format(format: FileFormat) -> Option<Self> {
        match format {
            FileFormat::Pdb => Some(StructureFormat::Pdb),
            FileFormat::Gro => Some(StructureFormat::Gro),
            FileFormat::Mol2 => Some(StructureFormat::Mol2),
            FileFormat::Xtc | FileFormat::Dcd | FileFormat::Xyz => None,
        }
    }

    /// Parse the `format` field of a structure response.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "pdb" => Some(StructureFormat::Pdb),
            "gro" => Some(StructureFormat::Gro),
            "mol2" => Some(StructureFormat::Mol2),
            _ => None,
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for StructureFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Unsupported structure format '{}' (expected pdb, gro or mol2)",
                s
            ))
        })
    }
}
