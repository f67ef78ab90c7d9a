//! Mock implementations for testing.
//!
//! Fake rendering engines, structure sources and job feeds shared by the
//! integration tests. Everything records into a shared [`CallLog`] so tests
//! can assert on ordering across components.

#![allow(dead_code)]

use async_trait::async_trait;
use glimps::types::{AppError, Job, JobFilter, Result};
use glimps::viewer::{
    CapabilityProvider, CapabilityStatus, EngineOptions, RenderingCapability, StructureFormat,
    StructureSource, Style, SurfaceNode, ViewerError, ViewerInstance,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ordered record of engine calls, e.g. `"add_model:1:pdb"`.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries for one instance, with the instance number stripped.
    pub fn for_instance(&self, id: usize) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| {
                let mut parts = entry.splitn(3, ':');
                let call = parts.next()?;
                let owner: usize = parts.next()?.parse().ok()?;
                if owner != id {
                    return None;
                }
                Some(match parts.next() {
                    Some(detail) => format!("{}:{}", call, detail),
                    None => call.to_string(),
                })
            })
            .collect()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

/// Representation names in a style, e.g. `"cartoon+stick"`.
pub fn style_names(style: &Style) -> String {
    match style.to_json() {
        serde_json::Value::Object(fields) => fields.keys().cloned().collect::<Vec<_>>().join("+"),
        _ => String::new(),
    }
}

/// Engine instance that logs every call.
pub struct RecordingInstance {
    pub id: usize,
    log: CallLog,
    add_model_error: Option<ViewerError>,
    render_error: Option<ViewerError>,
    cleared: AtomicBool,
}

impl RecordingInstance {
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewerInstance for RecordingInstance {
    async fn add_model(&self, data: &str, format: StructureFormat) -> std::result::Result<(), ViewerError> {
        self.log
            .push(format!("add_model:{}:{}:{}", self.id, format, data.len()));
        match &self.add_model_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn set_style(&self, style: &Style) -> std::result::Result<(), ViewerError> {
        self.log
            .push(format!("set_style:{}:{}", self.id, style_names(style)));
        Ok(())
    }

    fn add_style(&self, style: &Style) -> std::result::Result<(), ViewerError> {
        self.log
            .push(format!("add_style:{}:{}", self.id, style_names(style)));
        Ok(())
    }

    fn zoom_to(&self) -> std::result::Result<(), ViewerError> {
        self.log.push(format!("zoom_to:{}", self.id));
        Ok(())
    }

    fn render(&self) -> std::result::Result<(), ViewerError> {
        self.log.push(format!("render:{}", self.id));
        match &self.render_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn clear(&self) -> std::result::Result<(), ViewerError> {
        self.cleared.store(true, Ordering::SeqCst);
        self.log.push(format!("clear:{}", self.id));
        Ok(())
    }
}

/// Rendering capability producing [`RecordingInstance`]s numbered from 1.
pub struct RecordingEngine {
    log: CallLog,
    next_id: AtomicUsize,
    create_delay: Option<Duration>,
    create_error: Option<ViewerError>,
    add_model_error: Option<ViewerError>,
    render_error: Option<ViewerError>,
    instances: Mutex<Vec<Arc<RecordingInstance>>>,
    nodes: Mutex<Vec<SurfaceNode>>,
}

impl RecordingEngine {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            next_id: AtomicUsize::new(1),
            create_delay: None,
            create_error: None,
            add_model_error: None,
            render_error: None,
            instances: Mutex::new(Vec::new()),
            nodes: Mutex::new(Vec::new()),
        }
    }

    /// Instance creation suspends for `delay` first.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn failing_create(mut self, message: &str) -> Self {
        self.create_error = Some(ViewerError::EngineInit(message.to_string()));
        self
    }

    pub fn failing_add_model(mut self, message: &str) -> Self {
        self.add_model_error = Some(ViewerError::Render(message.to_string()));
        self
    }

    pub fn failing_render(mut self, message: &str) -> Self {
        self.render_error = Some(ViewerError::Render(message.to_string()));
        self
    }

    pub fn instances(&self) -> Vec<Arc<RecordingInstance>> {
        self.instances.lock().clone()
    }

    pub fn nodes(&self) -> Vec<SurfaceNode> {
        self.nodes.lock().clone()
    }
}

#[async_trait]
impl RenderingCapability for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn create_viewer(
        &self,
        node: &SurfaceNode,
        _options: &EngineOptions,
    ) -> std::result::Result<Arc<dyn ViewerInstance>, ViewerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("create:{}", id));
        self.nodes.lock().push(node.clone());

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }

        let instance = Arc::new(RecordingInstance {
            id,
            log: self.log.clone(),
            add_model_error: self.add_model_error.clone(),
            render_error: self.render_error.clone(),
            cleared: AtomicBool::new(false),
        });
        self.instances.lock().push(instance.clone());
        Ok(instance)
    }
}

/// Provider that never settles.
pub struct NeverReady;

#[async_trait]
impl CapabilityProvider for NeverReady {
    fn status(&self) -> CapabilityStatus {
        CapabilityStatus::Pending
    }

    async fn ready(&self) -> std::result::Result<Arc<dyn RenderingCapability>, ViewerError> {
        std::future::pending().await
    }
}

/// Provider that counts how often it is asked.
pub struct CountingProvider {
    inner: Arc<dyn RenderingCapability>,
    pub calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(inner: Arc<dyn RenderingCapability>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProvider for CountingProvider {
    fn status(&self) -> CapabilityStatus {
        CapabilityStatus::Ready(self.inner.clone())
    }

    async fn ready(&self) -> std::result::Result<Arc<dyn RenderingCapability>, ViewerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.clone())
    }
}

/// Structure source answering from a fixed table.
#[derive(Default)]
pub struct FakeSource {
    responses: Mutex<HashMap<String, std::result::Result<String, ViewerError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: &str) -> Self {
        self.responses
            .lock()
            .insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_status(self, url: &str, reason: &str) -> Self {
        self.responses
            .lock()
            .insert(url.to_string(), Err(ViewerError::Fetch(reason.to_string())));
        self
    }

    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().insert(url.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StructureSource for FakeSource {
    async fn fetch(&self, url: &str) -> std::result::Result<String, ViewerError> {
        self.requests.lock().push(url.to_string());
        let delay = self.delays.lock().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ViewerError::Fetch("Not Found".to_string())))
    }
}

/// Job feed replaying a script of outcomes, then repeating the last success.
pub struct ScriptedFeed {
    script: Mutex<VecDeque<Result<Vec<Job>>>>,
    fallback: Vec<Job>,
    calls: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedFeed {
    pub fn new(script: Vec<Result<Vec<Job>>>, fallback: Vec<Job>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl glimps::jobs::JobFeed for ScriptedFeed {
    async fn fetch_jobs(&self, _filter: &JobFilter) -> Result<Vec<Job>> {
        self.calls.lock().push(tokio::time::Instant::now());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub fn network_error() -> AppError {
    AppError::Network("connection refused".to_string())
}

/// A job in `status`, as the backend would return it.
pub fn job(id: &str, status: &str) -> Job {
    serde_json::from_value(json!({
        "id": id,
        "job_type": "training",
        "status": status,
        "project_id": "project-1",
        "model_id": "model-1",
        "progress_percent": 40.0,
        "progress_message": "Epoch 4/10",
        "error_message": null,
        "started_at": "2024-01-01T00:00:00Z",
        "completed_at": null,
        "created_at": "2024-01-01T00:00:00Z"
    }))
    .expect("valid job json")
}

pub const PDB: &str = "ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N\nEND\n";
