//! Job poller tests on a paused clock

mod common;

use common::mocks::{job, network_error, ScriptedFeed};
use glimps::jobs::{JobFeed, JobPoller, PollerConfig, LOAD_ERROR};
use glimps::types::{Job, JobFilter, Result};
use std::sync::Arc;
use std::time::Duration;

fn failures(n: usize) -> Vec<Result<Vec<Job>>> {
    (0..n).map(|_| Err(network_error())).collect()
}

fn spawn(feed: &Arc<ScriptedFeed>) -> JobPoller {
    let feed: Arc<dyn JobFeed> = feed.clone();
    JobPoller::spawn(feed, JobFilter::for_project("project-1"), PollerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_backoff_then_reset() {
    let mut script = failures(3);
    script.push(Ok(vec![job("job-1", "running")]));
    let feed = Arc::new(ScriptedFeed::new(script, vec![job("job-1", "completed")]));
    let poller = spawn(&feed);

    tokio::time::sleep(Duration::from_secs(77)).await;

    let times = feed.call_times();
    assert_eq!(times.len(), 5);
    let deltas: Vec<u64> = times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_secs())
        .collect();
    assert_eq!(deltas, vec![10, 20, 40, 5]);

    let state = poller.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.consecutive_failures, 0);
    assert_eq!(state.jobs.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_failure_sets_error() {
    let feed = Arc::new(ScriptedFeed::new(failures(1), vec![job("job-1", "queued")]));
    let poller = spawn(&feed);
    assert!(poller.state().loading);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let state = poller.state();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(LOAD_ERROR));
    assert!(state.jobs.is_empty());

    // Next attempt after the doubled interval clears the error
    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = poller.state();
    assert!(state.error.is_none());
    assert_eq!(state.jobs.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_later_failure_keeps_previous_list() {
    let mut script = vec![Ok(vec![job("job-1", "running"), job("job-2", "pending")])];
    script.extend(failures(1));
    let feed = Arc::new(ScriptedFeed::new(script, Vec::new()));
    let poller = spawn(&feed);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let state = poller.state();
    assert_eq!(feed.call_count(), 2);
    assert!(state.error.is_none());
    assert_eq!(state.consecutive_failures, 1);
    assert_eq!(state.jobs.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_polls_immediately() {
    let feed = Arc::new(ScriptedFeed::new(Vec::new(), vec![job("job-1", "running")]));
    let poller = spawn(&feed);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(feed.call_count(), 1);

    poller.refresh();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(feed.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_updates() {
    let feed = Arc::new(ScriptedFeed::new(Vec::new(), vec![job("job-1", "completed")]));
    let poller = spawn(&feed);
    let mut rx = poller.subscribe();

    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.jobs[0].status.is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_stop_and_drop_end_polling() {
    let feed = Arc::new(ScriptedFeed::new(Vec::new(), Vec::new()));
    let mut poller = spawn(&feed);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(poller.is_running());

    poller.stop();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!poller.is_running());
    let calls = feed.call_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.call_count(), calls);

    let other = spawn(&feed);
    tokio::time::sleep(Duration::from_millis(1)).await;
    drop(other);
    let calls = feed.call_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(feed.call_count(), calls);
}
