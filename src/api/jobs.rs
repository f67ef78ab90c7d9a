//! Job endpoints

use super::{ApiClient, API_PREFIX};
use crate::types::{Job, JobFilter, JobList, Molecule, Result};
use std::path::{Path, PathBuf};

pub async fn list(client: &ApiClient, filter: &JobFilter) -> Result<JobList> {
    client
        .get(&format!("{}/jobs/", API_PREFIX), &filter.query())
        .await
}

pub async fn get(client: &ApiClient, job_id: &str) -> Result<Job> {
    client
        .get(&format!("{}/jobs/{}", API_PREFIX, job_id), &[])
        .await
}

/// Cancel a pending, queued or running job.
pub async fn cancel(client: &ApiClient, job_id: &str) -> Result<()> {
    client
        .delete(&format!("{}/jobs/{}", API_PREFIX, job_id))
        .await
}

/// File name the backend's inference result is saved under.
pub fn result_file_name(job_id: &str) -> String {
    format!("inference_result_{}.npy", job_id)
}

/// Download an inference result into `dir`, returning the written path.
pub async fn download_result(client: &ApiClient, job_id: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = client
        .get_bytes(&format!("{}/jobs/{}/download", API_PREFIX, job_id))
        .await?;
    let path = dir.join(result_file_name(job_id));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Turn a completed inference job into a backmapped molecule.
pub async fn create_molecule(
    client: &ApiClient,
    job_id: &str,
    name: Option<&str>,
) -> Result<Molecule> {
    let query: Vec<(&str, String)> = name
        .map(|n| vec![("name", n.to_string())])
        .unwrap_or_default();
    client
        .post_query(
            &format!("{}/jobs/{}/create-molecule", API_PREFIX, job_id),
            &query,
        )
        .await
}
