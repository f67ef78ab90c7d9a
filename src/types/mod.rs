use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============= User & Auth Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenResponse,
}

// ============= Project Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub owner: User,
    #[serde(default)]
    pub molecule_count: u64,
    #[serde(default)]
    pub model_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainedModelsCount {
    pub trained_models_count: u64,
}

// ============= Molecule Types =============

/// Molecular resolution class of a structure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MoleculeType {
    CoarseGrained,
    #[default]
    Atomistic,
    Backmapped,
}

impl MoleculeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoleculeType::CoarseGrained => "coarse_grained",
            MoleculeType::Atomistic => "atomistic",
            MoleculeType::Backmapped => "backmapped",
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MoleculeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "coarse_grained" | "cg" => Ok(MoleculeType::CoarseGrained),
            "atomistic" => Ok(MoleculeType::Atomistic),
            "backmapped" => Ok(MoleculeType::Backmapped),
            other => Err(AppError::InvalidInput(format!(
                "Unknown molecule type '{}'",
                other
            ))),
        }
    }
}

/// File format of an uploaded molecule, as stored by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdb,
    Gro,
    Xtc,
    Dcd,
    Mol2,
    Xyz,
}

impl FileFormat {
    pub const ALL: [FileFormat; 6] = [
        FileFormat::Pdb,
        FileFormat::Gro,
        FileFormat::Xtc,
        FileFormat::Dcd,
        FileFormat::Mol2,
        FileFormat::Xyz,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdb => "pdb",
            FileFormat::Gro => "gro",
            FileFormat::Xtc => "xtc",
            FileFormat::Dcd => "dcd",
            FileFormat::Mol2 => "mol2",
            FileFormat::Xyz => "xyz",
        }
    }

    /// Resolve a format from a file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Content type sent with multipart uploads.
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Pdb => "chemical/x-pdb",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Molecule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_id: String,
    pub molecule_type: MoleculeType,
    pub file_format: FileFormat,
    pub n_atoms: u64,
    pub n_frames: u64,
    pub source_molecule_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoleculeList {
    pub molecules: Vec<Molecule>,
    pub total: u64,
}

/// Raw structure text of a molecule, as returned by `/molecules/{id}/structure`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoleculeStructure {
    pub id: String,
    pub name: String,
    pub format: String,
    pub content: String,
}

// ============= GLIMPS Model Types =============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlimpsModel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_id: String,
    pub is_trained: bool,
    pub training_config: Option<serde_json::Value>,
    pub training_metrics: Option<serde_json::Value>,
    pub cg_molecule_id: Option<String>,
    pub atomistic_molecule_id: Option<String>,
    pub trained_at: Option<DateTime<Utc>>,
    pub training_duration_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub models: Vec<GlimpsModel>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CreateModelRequest {
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// GLIMPS training switches forwarded to the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlimpsOptions {
    pub pca: bool,
    pub refine: bool,
    pub shave: bool,
    pub triangulate: bool,
}

impl Default for GlimpsOptions {
    fn default() -> Self {
        Self {
            pca: false,
            refine: true,
            shave: true,
            triangulate: false,
        }
    }
}

/// Acknowledgement for a training or inference request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStarted {
    pub job_id: String,
    pub model_id: String,
    pub status: String,
}

// ============= Job Types =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Training,
    Inference,
    FileProcessing,
}

impl JobType {
    pub fn label(&self) -> &'static str {
        match self {
            JobType::Training => "Training",
            JobType::Inference => "Inference",
            JobType::FileProcessing => "File Processing",
        }
    }
}

/// Job status, declared in lifecycle order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Queued | JobStatus::Running
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(AppError::InvalidInput(format!(
                "Unknown job status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub project_id: String,
    pub model_id: Option<String>,
    #[serde(default)]
    pub input_params: Option<serde_json::Value>,
    #[serde(default)]
    pub output_params: Option<serde_json::Value>,
    #[serde(default)]
    pub progress_percent: f64,
    pub progress_message: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    pub jobs: Vec<Job>,
    pub total: u64,
}

/// Query filter for the job list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub project_id: Option<String>,
    pub status: Option<JobStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl JobFilter {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Default::default()
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(project_id) = &self.project_id {
            params.push(("project_id", project_id.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            params.push(("offset", offset.to_string()));
        }
        params
    }
}

// ============= Error Types =============

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status associated with the error, when it came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Unauthorized(_) => Some(401),
            AppError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Serialization(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_order_and_classes() {
        assert!(JobStatus::Pending < JobStatus::Queued);
        assert!(JobStatus::Running < JobStatus::Completed);
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Queued.is_cancellable());
        assert!(!JobStatus::Failed.is_cancellable());
    }

    #[test]
    fn test_job_deserialization() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "job-1",
            "job_type": "file_processing",
            "status": "running",
            "project_id": "p-1",
            "model_id": null,
            "progress_percent": 42.5,
            "progress_message": "Epoch 3/10",
            "error_message": null,
            "started_at": "2024-01-01T00:00:00Z",
            "completed_at": null,
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .expect("job should deserialize");

        assert_eq!(job.job_type, JobType::FileProcessing);
        assert_eq!(job.job_type.label(), "File Processing");
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress_message.as_deref(), Some("Epoch 3/10"));
    }

    #[test]
    fn test_job_filter_query_skips_empty_values() {
        let filter = JobFilter {
            project_id: Some("p-1".to_string()),
            status: Some(JobStatus::Failed),
            limit: Some(0),
            offset: None,
        };
        assert_eq!(
            filter.query(),
            vec![
                ("project_id", "p-1".to_string()),
                ("status", "failed".to_string())
            ]
        );
    }

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_extension(".PDB"), Some(FileFormat::Pdb));
        assert_eq!(FileFormat::from_extension("mol2"), Some(FileFormat::Mol2));
        assert_eq!(FileFormat::from_extension("cif"), None);
        assert_eq!(FileFormat::Pdb.mime_type(), "chemical/x-pdb");
        assert_eq!(FileFormat::Xtc.mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_molecule_type_parsing() {
        assert_eq!(
            "coarse-grained".parse::<MoleculeType>().unwrap(),
            MoleculeType::CoarseGrained
        );
        assert_eq!(
            "Backmapped".parse::<MoleculeType>().unwrap(),
            MoleculeType::Backmapped
        );
        assert!("protein".parse::<MoleculeType>().is_err());
        assert_eq!(MoleculeType::default(), MoleculeType::Atomistic);
    }

    #[test]
    fn test_api_error_body_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail": "Project not found"}"#).unwrap();
        assert_eq!(body.message(), "Project not found");
    }
}
