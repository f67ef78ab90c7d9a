//! Project endpoints

use super::{ApiClient, API_PREFIX};
use crate::types::{
    CreateProjectRequest, Project, ProjectDetail, ProjectList, Result, TrainedModelsCount,
    UpdateProjectRequest,
};

/// List projects the current user owns or collaborates on.
pub async fn list(client: &ApiClient, limit: u32, offset: u32) -> Result<ProjectList> {
    client
        .get(
            &format!("{}/projects/", API_PREFIX),
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
}

/// Fetch a project with owner and counts.
pub async fn get(client: &ApiClient, project_id: &str) -> Result<ProjectDetail> {
    client
        .get(&format!("{}/projects/{}", API_PREFIX, project_id), &[])
        .await
}

pub async fn create(client: &ApiClient, request: &CreateProjectRequest) -> Result<Project> {
    client
        .post_json(&format!("{}/projects/", API_PREFIX), request)
        .await
}

pub async fn update(
    client: &ApiClient,
    project_id: &str,
    request: &UpdateProjectRequest,
) -> Result<Project> {
    client
        .patch_json(&format!("{}/projects/{}", API_PREFIX, project_id), request)
        .await
}

pub async fn delete(client: &ApiClient, project_id: &str) -> Result<()> {
    client
        .delete(&format!("{}/projects/{}", API_PREFIX, project_id))
        .await
}

/// Number of trained models across all of the user's projects.
pub async fn trained_models_count(client: &ApiClient) -> Result<u64> {
    let stats: TrainedModelsCount = client
        .get(&format!("{}/projects/stats/trained-models", API_PREFIX), &[])
        .await?;
    Ok(stats.trained_models_count)
}
