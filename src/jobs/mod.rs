//! Job list polling
//!
//! [`JobPoller`] keeps a [`JobListState`] current by fetching the job list
//! on a fixed interval. Consecutive failures stretch the interval
//! exponentially up to a ceiling; the first success resets it.
//!
//! ```ignore
//! let poller = JobPoller::spawn(client.clone(), JobFilter::for_project(id), PollerConfig::default());
//! let mut rx = poller.subscribe();
//! while rx.changed().await.is_ok() {
//!     render(&rx.borrow());
//! }
//! ```

use crate::api::{self, ApiClient};
use crate::types::{Job, JobFilter, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Message shown when the job list could not be loaded at all.
pub const LOAD_ERROR: &str = "Failed to load jobs";

/// Anything that can list jobs.
#[async_trait]
pub trait JobFeed: Send + Sync {
    async fn fetch_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;
}

#[async_trait]
impl JobFeed for ApiClient {
    async fn fetch_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        api::jobs::list(self, filter).await.map(|list| list.jobs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl PollerConfig {
    pub fn new(interval: Duration, max_backoff: Duration) -> Self {
        Self {
            interval,
            max_backoff,
        }
    }

    /// Delay before the next fetch after `failures` consecutive failures.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Snapshot of the polled job list.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListState {
    /// True until the first fetch completes, successfully or not.
    pub loading: bool,
    /// Set only when the very first fetch failed; later failures keep the last list.
    pub error: Option<String>,
    pub jobs: Vec<Job>,
    pub consecutive_failures: u32,
}

impl Default for JobListState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            jobs: Vec::new(),
            consecutive_failures: 0,
        }
    }
}

/// Background task polling a [`JobFeed`].
///
/// The task stops on [`stop`](Self::stop) or when the poller is dropped.
pub struct JobPoller {
    state: watch::Receiver<JobListState>,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl JobPoller {
    pub fn spawn(feed: Arc<dyn JobFeed>, filter: JobFilter, config: PollerConfig) -> Self {
        let (tx, rx) = watch::channel(JobListState::default());
        let refresh = Arc::new(Notify::new());
        let task = tokio::spawn(poll_loop(feed, filter, config, tx, Arc::clone(&refresh)));
        info!(interval = ?config.interval, "Job poller started");

        Self {
            state: rx,
            refresh,
            task: Some(task),
        }
    }

    pub fn state(&self) -> JobListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobListState> {
        self.state.clone()
    }

    /// Fetch again now instead of waiting for the next tick.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Job poller stopped");
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    feed: Arc<dyn JobFeed>,
    filter: JobFilter,
    config: PollerConfig,
    state: watch::Sender<JobListState>,
    refresh: Arc<Notify>,
) {
    let mut failures: u32 = 0;
    let mut loaded = false;

    loop {
        match feed.fetch_jobs(&filter).await {
            Ok(jobs) => {
                failures = 0;
                loaded = true;
                debug!(count = jobs.len(), "Jobs refreshed");
                state.send_modify(|s| {
                    s.loading = false;
                    s.error = None;
                    s.jobs = jobs;
                    s.consecutive_failures = 0;
                });
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                warn!(failures, "Failed to poll jobs: {}", e);
                state.send_modify(|s| {
                    s.loading = false;
                    s.consecutive_failures = failures;
                    if !loaded {
                        s.error = Some(LOAD_ERROR.to_string());
                    }
                });
            }
        }

        let delay = config.delay_after(failures);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = refresh.notified() => debug!("Manual job refresh"),
        }
    }
}
