//! List and detail view state
//!
//! Views hold what a page shows about a backend resource: whether the
//! first fetch is still in flight, a user-facing error, and the items.
//! They never talk to the backend directly; callers pass the fetch or
//! delete call in, usually one of the [`api`](crate::api) functions.

use crate::api::{self, ApiClient};
use crate::types::{AppError, GlimpsModel, Job, JobFilter, JobStatus, Molecule, Project, Result};
use parking_lot::Mutex;
use std::future::Future;
use tracing::{debug, warn};

/// Resources addressable by a backend id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Molecule {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for GlimpsModel {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Job {
    fn id(&self) -> &str {
        &self.id
    }
}

// ============= List View =============

#[derive(Debug)]
struct ListInner<T> {
    loading: bool,
    error: Option<String>,
    items: Vec<T>,
    deleting: Option<String>,
}

/// Fetch-on-mount list with optimistic removal.
///
/// Removal takes the item out of the list before the delete call is made
/// and puts it back at its old position if the call fails.
#[derive(Debug)]
pub struct ResourceList<T> {
    resource: &'static str,
    inner: Mutex<ListInner<T>>,
}

impl<T: Identified + Clone> ResourceList<T> {
    /// `resource` is the plural noun used in messages, e.g. `"projects"`.
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            inner: Mutex::new(ListInner {
                loading: true,
                error: None,
                items: Vec::new(),
                deleting: None,
            }),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Id of the item whose delete call is in flight.
    pub fn deleting(&self) -> Option<String> {
        self.inner.lock().deleting.clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.inner.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    /// Replace the items with the result of `fetch`.
    pub async fn load<F, Fut>(&self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        {
            let mut inner = self.inner.lock();
            inner.loading = true;
            inner.error = None;
        }

        let outcome = fetch().await;

        let mut inner = self.inner.lock();
        inner.loading = false;
        match outcome {
            Ok(items) => {
                debug!(resource = self.resource, count = items.len(), "List loaded");
                inner.items = items;
            }
            Err(e) => {
                warn!(resource = self.resource, "Failed to load list: {}", e);
                inner.error = Some(format!("Failed to load {}", self.resource));
            }
        }
    }

    /// Remove `id` locally, then call `delete`. Restores the item on failure.
    pub async fn remove<F, Fut>(&self, id: &str, delete: F) -> Result<()>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let (position, item) = {
            let mut inner = self.inner.lock();
            let position = inner
                .items
                .iter()
                .position(|item| item.id() == id)
                .ok_or_else(|| AppError::NotFound(format!("{} {}", self.resource, id)))?;
            let item = inner.items.remove(position);
            inner.deleting = Some(id.to_string());
            (position, item)
        };

        let outcome = delete(id.to_string()).await;

        let mut inner = self.inner.lock();
        inner.deleting = None;
        if let Err(e) = outcome {
            warn!(resource = self.resource, id, "Delete failed, restoring item: {}", e);
            let position = position.min(inner.items.len());
            inner.items.insert(position, item);
            return Err(e);
        }
        Ok(())
    }
}

// ============= Detail View =============

/// A single fetched resource.
#[derive(Debug)]
pub struct DetailView<T> {
    resource: &'static str,
    loading: bool,
    error: Option<String>,
    item: Option<T>,
}

impl<T> DetailView<T> {
    /// `resource` is the singular noun used in messages, e.g. `"project"`.
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            loading: true,
            error: None,
            item: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn into_item(self) -> Option<T> {
        self.item
    }

    pub async fn load<Fut>(&mut self, fetch: Fut)
    where
        Fut: Future<Output = Result<T>>,
    {
        self.loading = true;
        self.error = None;

        match fetch.await {
            Ok(item) => self.item = Some(item),
            Err(AppError::NotFound(_)) => {
                self.item = None;
                self.error = Some(format!("{} not found", capitalize(self.resource)));
            }
            Err(e) => {
                warn!(resource = self.resource, "Failed to load: {}", e);
                self.item = None;
                self.error = Some(format!("Failed to load {}", self.resource));
            }
        }
        self.loading = false;
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============= Dashboard =============

/// Counts shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub projects: u64,
    pub trained_models: u64,
    pub active_jobs: usize,
    pub recent_jobs: Vec<Job>,
}

impl DashboardSummary {
    /// Number of recent jobs kept for display.
    pub const RECENT_JOBS: u32 = 5;

    pub async fn load(client: &ApiClient) -> Result<Self> {
        let filter = JobFilter::default();
        let (projects, trained_models, jobs) = futures::try_join!(
            api::projects::list(client, 1, 0),
            api::projects::trained_models_count(client),
            api::jobs::list(client, &filter),
        )?;

        let active_jobs = jobs
            .jobs
            .iter()
            .filter(|job| matches!(job.status, JobStatus::Running | JobStatus::Queued))
            .count();
        let recent_jobs = jobs
            .jobs
            .into_iter()
            .take(Self::RECENT_JOBS as usize)
            .collect();

        Ok(Self {
            projects: projects.total,
            trained_models,
            active_jobs,
            recent_jobs,
        })
    }
}
