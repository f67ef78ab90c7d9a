//! Process-wide viewer UI state

use crate::types::AppError;
use crate::viewer::ViewerState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// How atoms are drawn in the interactive viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[default]
    Cartoon,
    BallAndStick,
    Surface,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Cartoon => "cartoon",
            DisplayMode::BallAndStick => "ball-and-stick",
            DisplayMode::Surface => "surface",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cartoon" => Ok(DisplayMode::Cartoon),
            "ball-and-stick" => Ok(DisplayMode::BallAndStick),
            "surface" => Ok(DisplayMode::Surface),
            other => Err(AppError::InvalidInput(format!(
                "Unknown representation '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerSnapshot {
    pub is_loading: bool,
    pub error: Option<String>,
    pub selected_atoms: Vec<u32>,
    pub representation: DisplayMode,
}

/// Shared viewer state, readable from any task.
#[derive(Debug, Default)]
pub struct ViewerStore {
    inner: RwLock<ViewerSnapshot>,
}

static GLOBAL: OnceLock<ViewerStore> = OnceLock::new();

impl ViewerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> &'static ViewerStore {
        GLOBAL.get_or_init(ViewerStore::new)
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.inner.read().clone()
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.write().is_loading = loading;
    }

    pub fn set_error(&self, error: Option<String>) {
        self.inner.write().error = error;
    }

    pub fn set_selected_atoms(&self, atoms: Vec<u32>) {
        self.inner.write().selected_atoms = atoms;
    }

    pub fn set_representation(&self, representation: DisplayMode) {
        self.inner.write().representation = representation;
    }

    /// Copy loading and error from a viewer's state.
    pub fn mirror(&self, state: &ViewerState) {
        let mut inner = self.inner.write();
        inner.is_loading = state.is_loading();
        inner.error = state.error().map(str::to_string);
    }

    pub fn reset(&self) {
        *self.inner.write() = ViewerSnapshot::default();
    }
}
