use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CanonicalStatus, Pipeline};

pub const UNKNOWN_VERSION: &str = "Unknown";
const UNKNOWN_ERROR: &str = "Unknown error";

/// Aggregate view over one fetched batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_pipelines: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    /// Executions per version tag; untagged pipelines count as "Unknown"
    pub executions_by_version: BTreeMap<String, usize>,
    pub versions: Vec<String>,
    /// How often each failure reason caused a failed pipeline
    pub failure_reasons: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_pipelines(pipelines: &[Pipeline]) -> Self {
        let mut summary = Self {
            total_pipelines: pipelines.len(),
            executions_by_version: executions_by_version(pipelines),
            ..Self::default()
        };

        for pipeline in pipelines {
            *summary.by_status.entry(pipeline.status.as_str()).or_default() += 1;

            if pipeline.status == CanonicalStatus::Error {
                let reason = pipeline
                    .failure_summary
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                *summary.failure_reasons.entry(reason).or_default() += 1;
            }
        }

        summary.versions = pipelines
            .iter()
            .filter_map(|pipeline| pipeline.version_tag.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        summary
    }

    pub fn count(&self, status: CanonicalStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Number of pipelines per version tag in the batch.
pub fn executions_by_version(pipelines: &[Pipeline]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for pipeline in pipelines {
        let version = pipeline
            .version_tag
            .clone()
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        *counts.entry(version).or_default() += 1;
    }
    counts
}
