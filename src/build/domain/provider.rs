//! CI/CD provider identity and the provider-agnostic status vocabulary.

use super::{ParseBuildValueError, RunId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CI/CD provider that executes a build workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiProviderType {
    /// Jenkins job queued through the remote trigger API.
    Jenkins,
    /// GitHub Actions workflow dispatch.
    GithubActions,
    /// CircleCI pipeline. Declared but not yet implemented.
    CircleCi,
    /// GitLab CI pipeline. Declared but not yet implemented.
    GitlabCi,
}

impl CiProviderType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jenkins => "jenkins",
            Self::GithubActions => "github_actions",
            Self::CircleCi => "circle_ci",
            Self::GitlabCi => "gitlab_ci",
        }
    }
}

impl fmt::Display for CiProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CiProviderType {
    type Error = ParseBuildValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "jenkins" => Ok(Self::Jenkins),
            "github_actions" => Ok(Self::GithubActions),
            "circle_ci" => Ok(Self::CircleCi),
            "gitlab_ci" => Ok(Self::GitlabCi),
            _ => Err(ParseBuildValueError::new("ci provider type", value)),
        }
    }
}

/// Provider-agnostic status reported by a status adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    /// Waiting in the provider queue.
    Pending,
    /// Executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully, including provider-side timeouts.
    Failed,
    /// Removed from the queue before execution.
    Cancelled,
}

impl CanonicalStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a queue-status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatusReport {
    /// Canonical status of the queued workflow.
    pub status: CanonicalStatus,
    /// Run handle, present once the provider has started execution.
    pub run_id: Option<RunId>,
}

impl QueueStatusReport {
    /// Report for a workflow still waiting in the queue.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            status: CanonicalStatus::Pending,
            run_id: None,
        }
    }

    /// Report for a workflow removed from the queue.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            status: CanonicalStatus::Cancelled,
            run_id: None,
        }
    }

    /// Report for a workflow that has left the queue with a run handle.
    #[must_use]
    pub const fn started(status: CanonicalStatus, run_id: RunId) -> Self {
        Self {
            status,
            run_id: Some(run_id),
        }
    }
}

/// Result of a run-status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatusReport {
    /// Canonical status of the running workflow.
    pub status: CanonicalStatus,
}

impl BuildStatusReport {
    /// Creates a report for the given status.
    #[must_use]
    pub const fn new(status: CanonicalStatus) -> Self {
        Self { status }
    }
}
