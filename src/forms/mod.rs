//! Form validation and submission
//!
//! Each form checks its required fields on the client, then makes exactly
//! one backend call. Validation failures never reach the network.

use crate::api::molecules::{UploadFile, UploadOptions};
use crate::api::{self, ApiClient};
use crate::types::{
    AppError, CreateModelRequest, CreateProjectRequest, FileFormat, GlimpsModel, GlimpsOptions,
    JobStarted, Molecule, MoleculeType, Project, UpdateProjectRequest,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Invalid(String),

    /// The backend rejected the submission.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: AppError,
    },
}

impl FormError {
    fn failed(message: &str, source: AppError) -> Self {
        warn!("{}: {}", message, source);
        FormError::Failed {
            message: message.to_string(),
            source,
        }
    }
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn required(value: &str, message: &str) -> Result<String, FormError> {
    trimmed(value).ok_or_else(|| FormError::Invalid(message.to_string()))
}

// ============= Projects =============

#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
}

impl ProjectForm {
    pub fn validate(&self) -> Result<CreateProjectRequest, FormError> {
        Ok(CreateProjectRequest {
            name: required(&self.name, "Project name is required")?,
            description: trimmed(&self.description),
        })
    }

    pub async fn submit(&self, client: &ApiClient) -> Result<Project, FormError> {
        let request = self.validate()?;
        let project = api::projects::create(client, &request)
            .await
            .map_err(|e| FormError::failed("Failed to create project. Please try again.", e))?;
        info!(project = %project.id, "Project created");
        Ok(project)
    }
}

/// Rename or re-describe an existing project.
#[derive(Debug, Clone, Default)]
pub struct ProjectSettingsForm {
    pub name: String,
    pub description: String,
}

impl ProjectSettingsForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            description: project.description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<UpdateProjectRequest, FormError> {
        Ok(UpdateProjectRequest {
            name: Some(required(&self.name, "Project name is required")?),
            description: trimmed(&self.description),
        })
    }

    pub async fn submit(&self, client: &ApiClient, project_id: &str) -> Result<Project, FormError> {
        let request = self.validate()?;
        api::projects::update(client, project_id, &request)
            .await
            .map_err(|e| FormError::failed("Failed to save project settings", e))
    }
}

// ============= Models =============

#[derive(Debug, Clone, Default)]
pub struct ModelForm {
    pub project_id: String,
    pub name: String,
    pub description: String,
}

impl ModelForm {
    pub fn validate(&self) -> Result<CreateModelRequest, FormError> {
        Ok(CreateModelRequest {
            project_id: self.project_id.clone(),
            name: required(&self.name, "Model name is required")?,
            description: trimmed(&self.description),
        })
    }

    pub async fn submit(&self, client: &ApiClient) -> Result<GlimpsModel, FormError> {
        let request = self.validate()?;
        api::models::create(client, &request)
            .await
            .map_err(|e| FormError::failed("Failed to create model. Please try again.", e))
    }
}

/// Pick the molecule pair a model is trained on.
#[derive(Debug, Clone, Default)]
pub struct TrainModelForm {
    pub cg_molecule_id: Option<String>,
    pub atomistic_molecule_id: Option<String>,
    pub options: GlimpsOptions,
}

impl TrainModelForm {
    /// Candidates for each side of the training pair.
    pub fn candidates(molecules: &[Molecule]) -> (Vec<&Molecule>, Vec<&Molecule>) {
        let cg = molecules
            .iter()
            .filter(|m| m.molecule_type == MoleculeType::CoarseGrained)
            .collect();
        let atomistic = molecules
            .iter()
            .filter(|m| m.molecule_type == MoleculeType::Atomistic)
            .collect();
        (cg, atomistic)
    }

    pub fn validate(&self) -> Result<(String, String), FormError> {
        let cg = self
            .cg_molecule_id
            .as_deref()
            .and_then(trimmed)
            .ok_or_else(|| {
                FormError::Invalid("Please select a coarse-grained molecule".to_string())
            })?;
        let atomistic = self
            .atomistic_molecule_id
            .as_deref()
            .and_then(trimmed)
            .ok_or_else(|| FormError::Invalid("Please select an atomistic molecule".to_string()))?;
        Ok((cg, atomistic))
    }

    pub async fn submit(&self, client: &ApiClient, model_id: &str) -> Result<JobStarted, FormError> {
        let (cg, atomistic) = self.validate()?;
        let started = api::models::train(client, model_id, &cg, &atomistic, self.options)
            .await
            .map_err(|e| FormError::failed("Failed to start training. Please try again.", e))?;
        info!(job = %started.job_id, model = model_id, "Training started");
        Ok(started)
    }
}

/// Backmap a coarse-grained molecule with a trained model.
#[derive(Debug, Clone, Default)]
pub struct InferenceForm {
    pub input_molecule_id: Option<String>,
}

impl InferenceForm {
    /// Only coarse-grained molecules can be backmapped.
    pub fn candidates(molecules: &[Molecule]) -> Vec<&Molecule> {
        molecules
            .iter()
            .filter(|m| m.molecule_type == MoleculeType::CoarseGrained)
            .collect()
    }

    pub fn validate(&self) -> Result<String, FormError> {
        self.input_molecule_id
            .as_deref()
            .and_then(trimmed)
            .ok_or_else(|| FormError::Invalid("Please select an input molecule".to_string()))
    }

    pub async fn submit(&self, client: &ApiClient, model_id: &str) -> Result<JobStarted, FormError> {
        let input = self.validate()?;
        let started = api::models::infer(client, model_id, &input)
            .await
            .map_err(|e| FormError::failed("Failed to start inference. Please try again.", e))?;
        info!(job = %started.job_id, model = model_id, "Inference started");
        Ok(started)
    }
}

// ============= Molecules =============

#[derive(Debug, Clone, Default)]
pub struct UploadMoleculeForm {
    pub project_id: String,
    pub file: Option<PathBuf>,
    pub name: String,
    pub description: String,
    pub molecule_type: MoleculeType,
}

/// Upload request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub path: PathBuf,
    pub format: FileFormat,
    pub options: UploadOptions,
}

impl UploadMoleculeForm {
    pub fn validate(&self) -> Result<ValidatedUpload, FormError> {
        let path = self
            .file
            .clone()
            .ok_or_else(|| FormError::Invalid("Please select a file".to_string()))?;
        let format = accepted_format(&path)?;

        // An empty name falls back to the file name without its extension.
        let name = trimmed(&self.name).or_else(|| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        });

        Ok(ValidatedUpload {
            path,
            format,
            options: UploadOptions {
                name,
                description: trimmed(&self.description),
                molecule_type: Some(self.molecule_type),
            },
        })
    }

    pub async fn submit(&self, client: &ApiClient) -> Result<Molecule, FormError> {
        const FAILED: &str = "Failed to upload molecule. Please try again.";

        let upload = self.validate()?;
        let file = UploadFile::read(&upload.path)
            .await
            .map_err(|e| FormError::failed(FAILED, e))?;
        let molecule = api::molecules::upload(client, &self.project_id, file, &upload.options)
            .await
            .map_err(|e| FormError::failed(FAILED, e))?;
        info!(molecule = %molecule.id, format = %upload.format, "Molecule uploaded");
        Ok(molecule)
    }
}

fn accepted_format(path: &Path) -> Result<FileFormat, FormError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileFormat::from_extension)
        .ok_or_else(|| {
            let accepted: Vec<String> = FileFormat::ALL
                .iter()
                .map(|f| format!(".{}", f.extension()))
                .collect();
            FormError::Invalid(format!(
                "Unsupported file format. Accepted formats: {}",
                accepted.join(", ")
            ))
        })
}
