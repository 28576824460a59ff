use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Token;

/// Normalized pipeline/stage state. Raw upstream strings never leave the
/// provider layer; everything downstream sees one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Success,
    Error,
    Warning,
    Running,
    Pending,
    Skipped,
}

impl CanonicalStatus {
    pub const ALL: [CanonicalStatus; 6] = [
        Self::Success,
        Self::Error,
        Self::Warning,
        Self::Running,
        Self::Pending,
        Self::Skipped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Running => "running",
            Self::Pending => "pending",
            Self::Skipped => "skipped",
        }
    }

    pub fn capitalized(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Running => "Running",
            Self::Pending => "Pending",
            Self::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown status '{s}' (expected one of: {})",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit SHA
    pub id: String,
    pub message: String,
    pub author: String,
    pub email: Option<String>,
}

impl Commit {
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique within a pipeline
    pub name: String,
    pub status: CanonicalStatus,
    pub failure_reason: Option<String>,
}

/// A normalized pipeline run, identified by `repository` + `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub repository: String,
    pub name: String,
    pub status: CanonicalStatus,
    pub commit: Commit,
    pub started_at: DateTime<Utc>,
    pub duration: String,
    pub stages: Vec<Stage>,
    pub url: Option<String>,
    pub version_tag: Option<String>,
    pub failure_summary: Option<String>,
}

/// A repository the user has analyzed, persisted for quick re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCredential {
    pub url: String,
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CanonicalStatus::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("error".parse::<CanonicalStatus>(), Ok(CanonicalStatus::Error));
        assert_eq!("Running".parse::<CanonicalStatus>(), Ok(CanonicalStatus::Running));
        assert!("failed".parse::<CanonicalStatus>().is_err());
    }

    #[test]
    fn test_commit_title_and_short_id() {
        let commit = Commit {
            id: "0123456789abcdef".to_string(),
            message: "Fix flaky test\n\nLonger body".to_string(),
            author: "Dana".to_string(),
            email: None,
        };
        assert_eq!(commit.short_id(), "01234567");
        assert_eq!(commit.title(), "Fix flaky test");
    }
}
