//! Molecule endpoints

use super::{ApiClient, API_PREFIX};
use crate::types::{
    AppError, FileFormat, Molecule, MoleculeList, MoleculeStructure, MoleculeType, Result,
};
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Optional metadata sent alongside an uploaded structure file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub molecule_type: Option<MoleculeType>,
}

/// A structure file ready to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a file from disk, keeping its base name for the multipart part.
    pub async fn read(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid file path: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    fn mime_type(&self) -> String {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match FileFormat::from_extension(ext) {
            Some(format) => format.mime_type().to_string(),
            None => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

pub async fn list(
    client: &ApiClient,
    project_id: &str,
    limit: u32,
    offset: u32,
) -> Result<MoleculeList> {
    client
        .get(
            &format!("{}/molecules/", API_PREFIX),
            &[
                ("project_id", project_id.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
}

pub async fn get(client: &ApiClient, molecule_id: &str) -> Result<Molecule> {
    client
        .get(&format!("{}/molecules/{}", API_PREFIX, molecule_id), &[])
        .await
}

/// Raw structure text, used as the viewer's inline data.
pub async fn structure(client: &ApiClient, molecule_id: &str) -> Result<MoleculeStructure> {
    client
        .get(
            &format!("{}/molecules/{}/structure", API_PREFIX, molecule_id),
            &[],
        )
        .await
}

/// Upload a structure file as multipart form data.
pub async fn upload(
    client: &ApiClient,
    project_id: &str,
    file: UploadFile,
    options: &UploadOptions,
) -> Result<Molecule> {
    let mime = file.mime_type();
    let part = Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&mime)
        .map_err(|e| AppError::InvalidInput(format!("Invalid content type: {}", e)))?;

    let mut form = Form::new()
        .part("file", part)
        .text("project_id", project_id.to_string());
    if let Some(name) = &options.name {
        form = form.text("name", name.clone());
    }
    if let Some(description) = &options.description {
        form = form.text("description", description.clone());
    }
    if let Some(molecule_type) = options.molecule_type {
        form = form.text("molecule_type", molecule_type.as_str());
    }

    client
        .post_form(&format!("{}/molecules/", API_PREFIX), form)
        .await
}

pub async fn delete(client: &ApiClient, molecule_id: &str) -> Result<()> {
    client
        .delete(&format!("{}/molecules/{}", API_PREFIX, molecule_id))
        .await
}
