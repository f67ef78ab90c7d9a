use super::container::SurfaceNode;
use super::style::Style;
use super::{StructureFormat, ViewerError};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Construction options handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub background_color: String,
    pub antialias: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            background_color: "white".to_string(),
            antialias: true,
        }
    }
}

/// A live engine instance bound to one surface node.
///
/// `clear` releases everything the instance holds. Once cleared, the
/// instance is never used again.
#[async_trait]
pub trait ViewerInstance: Send + Sync {
    async fn add_model(&self, data: &str, format: StructureFormat) -> Result<(), ViewerError>;

    fn set_style(&self, style: &Style) -> Result<(), ViewerError>;

    fn add_style(&self, style: &Style) -> Result<(), ViewerError>;

    fn zoom_to(&self) -> Result<(), ViewerError>;

    fn render(&self) -> Result<(), ViewerError>;

    fn clear(&self) -> Result<(), ViewerError>;
}

/// Factory for viewer instances, obtained asynchronously.
#[async_trait]
pub trait RenderingCapability: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    async fn create_viewer(
        &self,
        node: &SurfaceNode,
        options: &EngineOptions,
    ) -> Result<Arc<dyn ViewerInstance>, ViewerError>;
}

/// Where a capability provider currently stands.
#[derive(Clone)]
pub enum CapabilityStatus {
    Pending,
    Ready(Arc<dyn RenderingCapability>),
    Failed(String),
}

impl CapabilityStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, CapabilityStatus::Pending)
    }
}

impl fmt::Debug for CapabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityStatus::Pending => f.write_str("Pending"),
            CapabilityStatus::Ready(capability) => {
                f.debug_tuple("Ready").field(&capability.name()).finish()
            }
            CapabilityStatus::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

/// Source of the rendering capability.
///
/// `ready` resolves once the capability is available or has definitively
/// failed. It waits on a notification and never polls.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn status(&self) -> CapabilityStatus;

    async fn ready(&self) -> Result<Arc<dyn RenderingCapability>, ViewerError>;
}

/// Capability provider settled by an external loader.
///
/// The first call to [`resolve`](Self::resolve) or [`fail`](Self::fail)
/// wins; later ones are ignored. Every waiter is woken when it settles.
pub struct CapabilityLoader {
    status: watch::Sender<CapabilityStatus>,
}

impl CapabilityLoader {
    pub fn new() -> Self {
        let (status, _) = watch::channel(CapabilityStatus::Pending);
        Self { status }
    }

    pub fn resolve(&self, capability: Arc<dyn RenderingCapability>) {
        let name = capability.name().to_string();
        let settled = self.settle(CapabilityStatus::Ready(capability));
        if settled {
            info!(engine = %name, "Rendering capability ready");
        }
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        if self.settle(CapabilityStatus::Failed(message.clone())) {
            error!("Rendering capability failed to load: {}", message);
        }
    }

    /// Drive `load` in the background and settle with its outcome.
    pub fn spawn_load<F>(self: &Arc<Self>, load: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Arc<dyn RenderingCapability>, ViewerError>> + Send + 'static,
    {
        let loader = Arc::clone(self);
        tokio::spawn(async move {
            match load.await {
                Ok(capability) => loader.resolve(capability),
                Err(e) => loader.fail(e.detail()),
            }
        })
    }

    fn settle(&self, next: CapabilityStatus) -> bool {
        self.status.send_if_modified(|current| {
            if current.is_pending() {
                *current = next;
                true
            } else {
                debug!("Ignoring capability update, already settled");
                false
            }
        })
    }
}

impl Default for CapabilityLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for CapabilityLoader {
    fn status(&self) -> CapabilityStatus {
        self.status.borrow().clone()
    }

    async fn ready(&self) -> Result<Arc<dyn RenderingCapability>, ViewerError> {
        let mut rx = self.status.subscribe();
        let settled = {
            let status = rx
                .wait_for(|status| !status.is_pending())
                .await
                .map_err(|_| {
                    ViewerError::CapabilityUnavailable("capability loader closed".to_string())
                })?;
            status.clone()
        };

        match settled {
            CapabilityStatus::Ready(capability) => Ok(capability),
            CapabilityStatus::Failed(message) => Err(ViewerError::CapabilityUnavailable(message)),
            CapabilityStatus::Pending => Err(ViewerError::CapabilityUnavailable(
                "capability still pending".to_string(),
            )),
        }
    }
}

/// Provider whose capability is available from the start.
#[derive(Clone)]
pub struct StaticCapability(pub Arc<dyn RenderingCapability>);

impl StaticCapability {
    pub fn new(capability: Arc<dyn RenderingCapability>) -> Self {
        Self(capability)
    }
}

#[async_trait]
impl CapabilityProvider for StaticCapability {
    fn status(&self) -> CapabilityStatus {
        CapabilityStatus::Ready(self.0.clone())
    }

    async fn ready(&self) -> Result<Arc<dyn RenderingCapability>, ViewerError> {
        Ok(self.0.clone())
    }
}
