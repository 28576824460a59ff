use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::model::Stage;

use super::mapper::{map_status, status_precedence};
use super::types::GitLabJob;

const UNKNOWN_FAILURE: &str = "Unknown failure";

/// Collapses a pipeline's jobs into one stage per stage name.
///
/// Stages keep the order in which their name first appears. When several jobs
/// share a stage, the job whose raw status ranks strictly higher replaces the
/// current one; ties keep the job seen first. Ranking uses the raw GitLab
/// status, not the canonical one.
pub fn aggregate_stages(jobs: &[GitLabJob]) -> Vec<Stage> {
    let mut stages: IndexMap<&str, (u8, Stage)> = IndexMap::new();

    for job in jobs {
        let rank = status_precedence(&job.status);

        match stages.entry(job.stage.as_str()) {
            Entry::Occupied(mut entry) => {
                if rank > entry.get().0 {
                    entry.insert((rank, stage_from_job(job)));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((rank, stage_from_job(job)));
            }
        }
    }

    stages.into_values().map(|(_, stage)| stage).collect()
}

fn stage_from_job(job: &GitLabJob) -> Stage {
    let failure_reason = (job.status == "failed").then(|| {
        job.failure_reason
            .clone()
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| UNKNOWN_FAILURE.to_string())
    });

    Stage {
        name: job.stage.clone(),
        status: map_status(&job.status),
        failure_reason,
    }
}
