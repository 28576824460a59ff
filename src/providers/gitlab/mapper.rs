use crate::model::{CanonicalStatus, Commit, Pipeline};

use super::links::ProjectRef;
use super::stages::aggregate_stages;
use super::types::{CommitDetail, GitLabJob, PipelineDetail};

/// Maps a raw GitLab job/pipeline status onto the canonical set.
///
/// Case-sensitive; anything unrecognized (e.g., "manual", "created") is
/// treated as pending.
pub fn map_status(raw: &str) -> CanonicalStatus {
    match raw {
        "success" => CanonicalStatus::Success,
        "failed" => CanonicalStatus::Error,
        "canceled" => CanonicalStatus::Warning,
        "running" => CanonicalStatus::Running,
        "pending" | "waiting_for_resource" | "preparing" | "scheduled" => {
            CanonicalStatus::Pending
        }
        "skipped" => CanonicalStatus::Skipped,
        _ => CanonicalStatus::Pending,
    }
}

/// Rank of a raw status when several jobs compete for the same stage.
pub fn status_precedence(raw: &str) -> u8 {
    match raw {
        "failed" => 5,
        "canceled" => 4,
        "running" => 3,
        "pending" => 2,
        "success" => 1,
        _ => 0,
    }
}

/// Formats a duration in seconds as `"{m}m {s}s"`, dropping the minutes when
/// zero. `None` renders as `"Unknown"`.
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return "Unknown".to_string();
    };

    let minutes = seconds / 60;
    let remaining = seconds % 60;

    if minutes > 0 {
        format!("{minutes}m {remaining}s")
    } else {
        format!("{remaining}s")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn display_duration(detail: &PipelineDetail) -> String {
    match detail.duration {
        Some(seconds) => format_duration(Some(seconds.max(0.0).floor() as u64)),
        None if detail.finished_at.is_none() => "In progress".to_string(),
        None => format_duration(None),
    }
}

/// Assembles the normalized pipeline record from the three upstream responses.
pub fn map_pipeline(
    project: &ProjectRef,
    detail: PipelineDetail,
    commit: CommitDetail,
    jobs: &[GitLabJob],
) -> Pipeline {
    let stages = aggregate_stages(jobs);
    let failure_summary = stages
        .iter()
        .find_map(|stage| stage.failure_reason.clone());
    let version_tag = if detail.tag { detail.ref_.clone() } else { None };

    Pipeline {
        id: detail.id,
        repository: project.path.clone(),
        name: format!("{} #{}", project.name, detail.id),
        status: map_status(&detail.status),
        commit: Commit {
            id: commit.id,
            message: commit.message,
            author: commit.author_name,
            email: commit.author_email.filter(|email| !email.is_empty()),
        },
        started_at: detail.created_at,
        duration: display_duration(&detail),
        stages,
        url: Some(project.pipeline_url(detail.id)),
        version_tag,
        failure_summary,
    }
}
