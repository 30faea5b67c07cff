//! Identifier and opaque handle types for the build domain.

use super::BuildDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a build record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(Uuid);

impl BuildId {
    /// Creates a new random build identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a build identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates and trims an opaque, non-empty string value.
fn non_empty(value: impl Into<String>, name: &'static str) -> Result<String, BuildDomainError> {
    let raw = value.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BuildDomainError::EmptyValue(name));
    }
    Ok(trimmed.to_owned())
}

/// Provider handle assigned when a workflow is queued.
///
/// For Jenkins this is the queue item URL; for GitHub Actions it is the
/// workflow run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueLocation(String);

impl QueueLocation {
    /// Creates a validated queue location.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::EmptyValue`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, BuildDomainError> {
        non_empty(value, "queue location").map(Self)
    }

    /// Returns the raw handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider run handle assigned once execution has started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a validated run identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::EmptyValue`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, BuildDomainError> {
        non_empty(value, "run id").map(Self)
    }

    /// Returns the raw handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build target within a platform, such as a store or test channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildTarget(String);

impl BuildTarget {
    /// Creates a validated build target.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::EmptyValue`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, BuildDomainError> {
        non_empty(value, "build target").map(Self)
    }

    /// Returns the target name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Weak reference to an external release task fed by this build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a validated task reference.
    ///
    /// # Errors
    ///
    /// Returns [`BuildDomainError::EmptyValue`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, BuildDomainError> {
        non_empty(value, "task id").map(Self)
    }

    /// Returns the raw task reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
