use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Entry of `GET /projects/:id/pipelines`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSummary {
    pub id: u64,
    /// Commit SHA the pipeline ran for
    pub sha: String,
    /// Raw GitLab status (e.g., "success", "waiting_for_resource")
    pub status: String,
}

/// Response of `GET /projects/:id/pipelines/:pipeline_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDetail {
    pub id: u64,
    /// Branch or tag the pipeline ran on
    #[serde(rename = "ref", default)]
    pub ref_: Option<String>,
    /// Whether `ref_` is a tag
    #[serde(default)]
    pub tag: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Run time in seconds, null while the pipeline is still running
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Response of `GET /projects/:id/repository/commits/:sha`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
}

/// Entry of `GET /projects/:id/pipelines/:pipeline_id/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabJob {
    /// Job name as defined in .gitlab-ci.yml
    pub name: String,
    /// Stage this job belongs to
    pub stage: String,
    /// Raw GitLab job status
    pub status: String,
    #[serde(default)]
    pub failure_reason: Option<String>,
}
