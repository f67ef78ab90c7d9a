//! GLIMPS model endpoints

use super::{ApiClient, API_PREFIX};
use crate::types::{CreateModelRequest, GlimpsModel, GlimpsOptions, JobStarted, ModelList, Result};
use reqwest::multipart::Form;

pub async fn list(
    client: &ApiClient,
    project_id: &str,
    limit: u32,
    offset: u32,
) -> Result<ModelList> {
    client
        .get(
            &format!("{}/models/", API_PREFIX),
            &[
                ("project_id", project_id.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
}

pub async fn get(client: &ApiClient, model_id: &str) -> Result<GlimpsModel> {
    client
        .get(&format!("{}/models/{}", API_PREFIX, model_id), &[])
        .await
}

pub async fn create(client: &ApiClient, request: &CreateModelRequest) -> Result<GlimpsModel> {
    client
        .post_json(&format!("{}/models/", API_PREFIX), request)
        .await
}

/// Start a training job from a coarse-grained / atomistic molecule pair.
pub async fn train(
    client: &ApiClient,
    model_id: &str,
    cg_molecule_id: &str,
    atomistic_molecule_id: &str,
    options: GlimpsOptions,
) -> Result<JobStarted> {
    let form = Form::new()
        .text("cg_molecule_id", cg_molecule_id.to_string())
        .text("atomistic_molecule_id", atomistic_molecule_id.to_string())
        .text("pca", options.pca.to_string())
        .text("refine", options.refine.to_string())
        .text("shave", options.shave.to_string())
        .text("triangulate", options.triangulate.to_string());

    client
        .post_form(&format!("{}/models/{}/train", API_PREFIX, model_id), form)
        .await
}

/// Start a backmapping inference job on a coarse-grained molecule.
pub async fn infer(
    client: &ApiClient,
    model_id: &str,
    input_molecule_id: &str,
) -> Result<JobStarted> {
    let form = Form::new().text("input_molecule_id", input_molecule_id.to_string());

    client
        .post_form(&format!("{}/models/{}/inference", API_PREFIX, model_id), form)
        .await
}

pub async fn delete(client: &ApiClient, model_id: &str) -> Result<()> {
    client
        .delete(&format!("{}/models/{}", API_PREFIX, model_id))
        .await
}
