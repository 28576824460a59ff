use chrono::SecondsFormat;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{PipemonError, Result};

use super::provider::DateWindow;
use super::types::{CommitDetail, GitLabJob, PipelineDetail, PipelineSummary};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const JOBS_PAGE_SIZE: usize = 100;

/// Thin REST v4 client. Every request carries the user's token; any non-2xx
/// response becomes `UpstreamRequestFailed` and is never retried.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Token,
}

impl GitLabClient {
    pub fn new(api_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pipemon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipemonError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        let api_url = Url::parse(&normalized)
            .map_err(|e| PipemonError::Config(format!("Invalid API URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Construct project base URL
    fn project_url(&self, project_path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("projects/{}/", urlencoding::encode(project_path)))
            .map_err(|e| PipemonError::Config(format!("Invalid project URL: {e}")))
    }

    fn endpoint(&self, project_path: &str, path: &str) -> Result<Url> {
        self.project_url(project_path)?
            .join(path)
            .map_err(|e| PipemonError::Config(format!("Invalid endpoint URL: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(PRIVATE_TOKEN_HEADER, self.token.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PipemonError::UpstreamRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn list_pipelines(
        &self,
        project_path: &str,
        per_page: usize,
        window: &DateWindow,
    ) -> Result<Vec<PipelineSummary>> {
        let mut url = self.endpoint(project_path, "pipelines")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("per_page", &per_page.to_string());
            if let Some(from) = window.from {
                query.append_pair(
                    "updated_after",
                    &from.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
            if let Some(to) = window.to {
                query.append_pair(
                    "updated_before",
                    &to.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
            }
        }

        self.get_json(url).await
    }

    pub async fn pipeline(&self, project_path: &str, pipeline_id: u64) -> Result<PipelineDetail> {
        let url = self.endpoint(project_path, &format!("pipelines/{pipeline_id}"))?;
        self.get_json(url).await
    }

    pub async fn commit(&self, project_path: &str, sha: &str) -> Result<CommitDetail> {
        let url = self.endpoint(
            project_path,
            &format!("repository/commits/{}", urlencoding::encode(sha)),
        )?;
        self.get_json(url).await
    }

    /// Fetches every job of a pipeline, following pages until a short page.
    pub async fn pipeline_jobs(
        &self,
        project_path: &str,
        pipeline_id: u64,
    ) -> Result<Vec<GitLabJob>> {
        let mut all_jobs = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.endpoint(project_path, &format!("pipelines/{pipeline_id}/jobs"))?;
            url.query_pairs_mut()
                .append_pair("per_page", &JOBS_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let jobs: Vec<GitLabJob> = self.get_json(url).await?;
            let fetched = jobs.len();
            all_jobs.extend(jobs);

            if fetched < JOBS_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(all_jobs)
    }
}
