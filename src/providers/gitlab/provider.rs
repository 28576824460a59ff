use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};

use crate::auth::Token;
use crate::error::Result;
use crate::model::Pipeline;
use crate::output::PhaseProgress;

use super::client::GitLabClient;
use super::links::ProjectRef;
use super::mapper::map_pipeline;
use super::types::PipelineSummary;

/// Optional server-side filter on pipeline update time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Knobs for a single repository fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Pipelines requested from the list endpoint
    pub per_page: usize,
    /// Pipelines kept after dropping skipped ones
    pub limit: usize,
    /// Pipelines whose details are fetched at the same time (1 = sequential)
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            per_page: 10,
            limit: 5,
            concurrency: 1,
        }
    }
}

/// GitLab pipeline provider for a single repository.
///
/// Lists recent pipelines, then fetches detail, commit and jobs for each one
/// and normalizes them into [`Pipeline`] records.
pub struct GitLabProvider {
    client: GitLabClient,
    project: ProjectRef,
    settings: FetchSettings,
}

impl GitLabProvider {
    /// Creates a provider for the repository at `repository_url`.
    ///
    /// # Arguments
    ///
    /// * `repository_url` - Repository web or clone URL (e.g., <https://gitlab.com/group/project.git>)
    /// * `token` - Access token sent with every request
    /// * `api_url` - REST base URL override; defaults to `/api/v4/` on the repository host
    /// * `settings` - Page size, limit and concurrency
    ///
    /// # Errors
    ///
    /// Returns `InvalidRepositoryUrl` before any network activity when the URL
    /// cannot be resolved to a project path.
    pub fn new(
        repository_url: &str,
        token: Token,
        api_url: Option<&str>,
        settings: FetchSettings,
    ) -> Result<Self> {
        let project = ProjectRef::parse(repository_url)?;
        let api_url = api_url.map_or_else(|| project.default_api_url(), ToString::to_string);
        let client = GitLabClient::new(&api_url, token)?;

        Ok(Self {
            client,
            project,
            settings,
        })
    }

    /// Fetches and normalizes the most recent pipelines of the repository.
    ///
    /// Skipped pipelines are dropped. The result keeps the upstream order.
    ///
    /// # Errors
    ///
    /// The first failing request (non-2xx, network or decoding error) aborts
    /// the whole batch; no partial results are returned.
    pub async fn collect_pipelines(&self, window: &DateWindow) -> Result<Vec<Pipeline>> {
        info!(
            "Collecting pipelines for project: {} via {}",
            self.project.path,
            self.client.api_url()
        );

        let progress = PhaseProgress::start_listing(&self.project.path);

        let summaries = match self.list_retained_pipelines(window).await {
            Ok(summaries) => summaries,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        let progress = progress.finish_listing_start_details(summaries.len());

        let result: Result<Vec<Pipeline>> = stream::iter(summaries)
            .map(|summary| self.load_pipeline(summary))
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await;

        match result {
            Ok(pipelines) => {
                progress.finish_details();
                info!("Processed {} pipelines", pipelines.len());
                Ok(pipelines)
            }
            Err(e) => {
                progress.abandon();
                warn!("Aborting fetch for {}: {e}", self.project.path);
                Err(e)
            }
        }
    }

    async fn list_retained_pipelines(&self, window: &DateWindow) -> Result<Vec<PipelineSummary>> {
        let listed = self
            .client
            .list_pipelines(&self.project.path, self.settings.per_page, window)
            .await?;

        let listed_count = listed.len();
        let retained: Vec<_> = listed
            .into_iter()
            .filter(|pipeline| pipeline.status != "skipped")
            .take(self.settings.limit)
            .collect();

        debug!(
            "Listed {listed_count} pipelines, retained {} after dropping skipped",
            retained.len()
        );

        if retained.is_empty() {
            warn!("No pipelines found for project: {}", self.project.path);
        }

        Ok(retained)
    }

    async fn load_pipeline(&self, summary: PipelineSummary) -> Result<Pipeline> {
        let path = &self.project.path;

        let detail = self.client.pipeline(path, summary.id).await?;
        let commit = self.client.commit(path, &summary.sha).await?;
        let jobs = self.client.pipeline_jobs(path, summary.id).await?;

        debug!(
            "Pipeline {} ({}): {} jobs [{}]",
            summary.id,
            summary.status,
            jobs.len(),
            jobs.iter()
                .map(|job| job.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(map_pipeline(&self.project, detail, commit, &jobs))
    }
}
