use super::capability::{CapabilityProvider, CapabilityStatus, EngineOptions, ViewerInstance};
use super::container::{NodeId, SurfaceNode, ViewerContainer};
use super::source::StructureSource;
use super::style::StylePlan;
use super::{StructureFormat, ViewerError};
use crate::types::MoleculeType;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What the viewer should show.
///
/// Inline data takes precedence over the URL; the URL is only fetched when
/// no data is given. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerInput {
    pub structure_url: Option<String>,
    pub structure_data: Option<String>,
    pub format: StructureFormat,
    pub category: Option<MoleculeType>,
}

impl ViewerInput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_data(
        data: impl Into<String>,
        format: StructureFormat,
        category: Option<MoleculeType>,
    ) -> Self {
        Self {
            structure_data: Some(data.into()),
            format,
            category,
            ..Default::default()
        }
    }

    pub fn from_url(
        url: impl Into<String>,
        format: StructureFormat,
        category: Option<MoleculeType>,
    ) -> Self {
        Self {
            structure_url: Some(url.into()),
            format,
            category,
            ..Default::default()
        }
    }

    fn data(&self) -> Option<&str> {
        self.structure_data.as_deref().filter(|d| !d.is_empty())
    }

    fn url(&self) -> Option<&str> {
        self.structure_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn has_source(&self) -> bool {
        self.data().is_some() || self.url().is_some()
    }
}

/// Observable state of the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerState {
    Loading,
    /// `rendered` is false when the input had nothing to show.
    Ready { rendered: bool },
    Error(String),
}

impl ViewerState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewerState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewerState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// User-facing notice for the error state.
    pub fn notice(&self) -> Option<ViewerNotice> {
        self.error().map(|message| ViewerNotice {
            title: "3D Viewer Unavailable",
            message: message.to_string(),
            hint: "You can still download the structure file to view it in other software.",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerNotice {
    pub title: &'static str,
    pub message: String,
    pub hint: &'static str,
}

struct Tracked {
    generation: u64,
    instance: Arc<dyn ViewerInstance>,
}

#[derive(Default)]
struct Slot {
    instance: Option<Tracked>,
    node: Option<NodeId>,
}

struct ViewerCore {
    provider: Arc<dyn CapabilityProvider>,
    source: Arc<dyn StructureSource>,
    container: Arc<dyn ViewerContainer>,
    options: EngineOptions,
    slot: Mutex<Slot>,
    state: watch::Sender<ViewerState>,
    generation: AtomicU64,
    alive: AtomicBool,
}

/// Owns at most one engine instance and drives it through load sequences.
///
/// Each call to [`run`](Self::run) or [`set_input`](Self::set_input) starts a
/// new sequence and supersedes any sequence still in flight. A superseded
/// sequence stops at its next suspension point without publishing state,
/// and disposes any instance it created but never handed over.
///
/// Dropping the viewer unmounts it.
pub struct StructureViewer {
    core: Arc<ViewerCore>,
}

impl StructureViewer {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        source: Arc<dyn StructureSource>,
        container: Arc<dyn ViewerContainer>,
        options: EngineOptions,
    ) -> Self {
        let (state, _) = watch::channel(ViewerState::Loading);
        Self {
            core: Arc::new(ViewerCore {
                provider,
                source,
                container,
                options,
                slot: Mutex::new(Slot::default()),
                state,
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Run a load sequence for `input` to completion.
    pub async fn run(&self, input: ViewerInput) {
        self.core.run(input).await
    }

    /// Start a load sequence in the background.
    pub fn set_input(&self, input: ViewerInput) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        tokio::spawn(async move { core.run(input).await })
    }

    pub fn state(&self) -> ViewerState {
        self.core.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerState> {
        self.core.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.core.alive.load(Ordering::SeqCst)
    }

    /// Node of the tracked instance, if one is attached.
    pub fn attached_node(&self) -> Option<NodeId> {
        self.core.slot.lock().node
    }

    pub fn has_instance(&self) -> bool {
        self.core.slot.lock().instance.is_some()
    }

    /// Dispose the instance, detach its node and stop all in-flight work.
    ///
    /// State is frozen at whatever was last published. Idempotent.
    pub fn unmount(&self) {
        self.core.unmount();
    }
}

impl Drop for StructureViewer {
    fn drop(&mut self) {
        self.core.unmount();
    }
}

impl ViewerCore {
    fn is_current(&self, generation: u64) -> bool {
        self.alive.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(&self, input: ViewerInput) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let _slot = self.slot.lock();
            if !self.is_current(generation) {
                return;
            }
            self.state.send_replace(ViewerState::Loading);
        }

        if !input.has_source() {
            let mut slot = self.slot.lock();
            if !self.is_current(generation) {
                return;
            }
            self.release(&mut slot);
            // A failed capability wins over an empty input; a pending one is not awaited.
            if let CapabilityStatus::Failed(message) = self.provider.status() {
                let err = ViewerError::CapabilityUnavailable(message);
                error!(generation, "Structure viewer failed: {}", err);
                self.state.send_replace(ViewerState::Error(err.to_string()));
                return;
            }
            self.state.send_replace(ViewerState::Ready { rendered: false });
            debug!(generation, "No structure to show");
            return;
        }

        let capability = match self.provider.ready().await {
            Ok(capability) => capability,
            Err(e) => return self.fail(generation, e),
        };

        let node = SurfaceNode::filling();
        {
            let mut slot = self.slot.lock();
            if !self.is_current(generation) {
                return;
            }
            self.release(&mut slot);
            self.container.attach(&node);
            slot.node = Some(node.id);
        }

        let instance = match capability.create_viewer(&node, &self.options).await {
            Ok(instance) => instance,
            Err(e) => return self.fail(generation, e),
        };

        {
            let mut slot = self.slot.lock();
            if !self.is_current(generation) {
                // Never handed over, so nobody else will dispose it.
                dispose(&instance);
                return;
            }
            slot.instance = Some(Tracked {
                generation,
                instance: Arc::clone(&instance),
            });
        }

        let payload = match (input.data(), input.url()) {
            (Some(data), _) => data.to_string(),
            (None, Some(url)) => match self.source.fetch(url).await {
                Ok(text) => text,
                Err(e) => return self.fail(generation, e),
            },
            (None, None) => return,
        };

        if !self.is_current(generation) {
            return;
        }
        if let Err(e) = instance.add_model(&payload, input.format).await {
            return self.fail(generation, e);
        }

        let plan = StylePlan::for_category(input.category);
        let outcome = {
            let _slot = self.slot.lock();
            if !self.is_current(generation) {
                return;
            }
            let outcome = apply_plan(instance.as_ref(), &plan);
            if outcome.is_ok() {
                self.state.send_replace(ViewerState::Ready { rendered: true });
                info!(
                    generation,
                    format = %input.format,
                    style = ?plan.kind,
                    "Structure rendered"
                );
            }
            outcome
        };

        if let Err(e) = outcome {
            self.fail(generation, e);
        }
    }

    /// Publish the error for `generation` and tear down whatever it built.
    fn fail(&self, generation: u64, err: ViewerError) {
        let mut slot = self.slot.lock();
        if !self.is_current(generation) {
            debug!(generation, "Dropping error from superseded load: {}", err);
            return;
        }
        error!(generation, "Structure viewer failed: {}", err);
        self.release(&mut slot);
        self.state.send_replace(ViewerState::Error(err.to_string()));
    }

    /// Dispose the tracked instance, then detach its node.
    fn release(&self, slot: &mut Slot) {
        if let Some(tracked) = slot.instance.take() {
            debug!(generation = tracked.generation, "Disposing viewer instance");
            dispose(&tracked.instance);
        }
        if let Some(node) = slot.node.take() {
            if self.container.contains(node) {
                self.container.detach(node);
            }
        }
    }

    fn unmount(&self) {
        let mut slot = self.slot.lock();
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.release(&mut slot);
        debug!("Structure viewer unmounted");
    }
}

fn apply_plan(instance: &dyn ViewerInstance, plan: &StylePlan) -> Result<(), ViewerError> {
    instance.set_style(&plan.base)?;
    if let Some(overlay) = &plan.overlay {
        instance.add_style(overlay)?;
    }
    instance.zoom_to()?;
    instance.render()
}

fn dispose(instance: &Arc<dyn ViewerInstance>) {
    if let Err(e) = instance.clear() {
        warn!("Ignoring viewer disposal failure: {}", e);
    }
}
