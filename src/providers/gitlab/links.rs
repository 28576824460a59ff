use url::Url;

use crate::error::{PipemonError, Result};

/// A repository URL resolved to its GitLab project coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// Project web URL without query, fragment, trailing slash or `.git`
    pub web_url: String,
    /// Scheme, host and port (e.g., <https://gitlab.com>)
    pub origin: String,
    /// Project path without `.git` (e.g., "group/project")
    pub path: String,
    /// Last path segment without `.git`
    pub name: String,
}

impl ProjectRef {
    /// Resolves a repository URL such as `https://gitlab.com/group/project.git`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRepositoryUrl` when the input is not an absolute URL
    /// with a host and at least two non-empty path segments.
    pub fn parse(repository_url: &str) -> Result<Self> {
        let repository_url = repository_url.trim();
        let invalid = |reason: &str| {
            PipemonError::InvalidRepositoryUrl(format!("{repository_url} ({reason})"))
        };

        let url = Url::parse(repository_url).map_err(|e| invalid(&e.to_string()))?;
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }

        let mut segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .map(|segment| {
                        urlencoding::decode(segment)
                            .map(|decoded| decoded.into_owned())
                            .unwrap_or_else(|_| segment.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(last) = segments.last_mut() {
            if let Some(stripped) = last.strip_suffix(".git") {
                *last = stripped.to_string();
            }
        }
        segments.retain(|segment| !segment.is_empty());

        if segments.len() < 2 {
            return Err(invalid("expected at least a group and a project"));
        }

        let name = segments.last().cloned().unwrap_or_default();

        let mut web = url.clone();
        web.set_query(None);
        web.set_fragment(None);
        let web_url = web.as_str().trim_end_matches('/');
        let web_url = web_url.strip_suffix(".git").unwrap_or(web_url);

        Ok(Self {
            web_url: web_url.to_string(),
            origin: url.origin().ascii_serialization(),
            path: segments.join("/"),
            name,
        })
    }

    /// Default REST endpoint of the instance hosting this repository.
    pub fn default_api_url(&self) -> String {
        format!("{}/api/v4/", self.origin)
    }

    /// Web URL of a pipeline (e.g., <https://gitlab.com/group/project/-/pipelines/123>).
    pub fn pipeline_url(&self, pipeline_id: u64) -> String {
        format!("{}/-/pipelines/{pipeline_id}", self.web_url)
    }
}
