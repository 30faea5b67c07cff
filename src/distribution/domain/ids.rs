//! Identifier and value types for store submissions.

use super::DistributionDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a store submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Creates a new random submission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a submission identifier from an existing UUID.
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

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-visible version name of a submitted binary, for example `2.4.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionName(String);

impl VersionName {
    /// Creates a validated version name.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::EmptyValue`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, DistributionDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DistributionDomainError::EmptyValue("version name"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the version name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Share of users receiving a release, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ExposurePercent(u8);

impl ExposurePercent {
    /// No users.
    pub const ZERO: Self = Self(0);
    /// Every user.
    pub const FULL: Self = Self(100);

    /// Creates a validated exposure percentage.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionDomainError::ExposureOutOfRange`] above 100.
    pub const fn new(value: u8) -> Result<Self, DistributionDomainError> {
        if value > 100 {
            return Err(DistributionDomainError::ExposureOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns whether every user receives the release.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 == 100
    }
}

impl TryFrom<u8> for ExposurePercent {
    type Error = DistributionDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExposurePercent> for u8 {
    fn from(value: ExposurePercent) -> Self {
        value.0
    }
}

impl fmt::Display for ExposurePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
