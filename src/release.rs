//! Release-scoped identifiers and platform values shared by the build and
//! distribution modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(Uuid);

impl ReleaseId {
    /// Creates a new random release identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a release identifier from an existing UUID.
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

impl Default for ReleaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant (organisation) that owns integrations and releases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a validated tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseValueError::EmptyTenantId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ReleaseValueError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReleaseValueError::EmptyTenantId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the tenant identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mobile platform targeted by a build or store submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Google Play / Android.
    Android,
    /// App Store / iOS.
    Ios,
}

impl Platform {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = ReleaseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            _ => Err(ReleaseValueError::UnknownPlatform(value.to_owned())),
        }
    }
}

/// Errors returned while constructing release-scoped values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReleaseValueError {
    /// The tenant identifier is empty after trimming.
    #[error("tenant identifier must not be empty")]
    EmptyTenantId,

    /// The platform string is not recognised.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}

#[cfg(test)]
mod tests {
    use super::{Platform, ReleaseValueError, TenantId};
    use rstest::rstest;

    #[rstest]
    #[case("android", Platform::Android)]
    #[case(" IOS ", Platform::Ios)]
    fn platform_parses_canonical_values(#[case] raw: &str, #[case] expected: Platform) {
        assert_eq!(Platform::try_from(raw), Ok(expected));
    }

    #[rstest]
    fn platform_rejects_unknown_value() {
        assert_eq!(
            Platform::try_from("windows"),
            Err(ReleaseValueError::UnknownPlatform("windows".to_owned()))
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn tenant_id_rejects_blank_values(#[case] raw: &str) {
        assert_eq!(TenantId::new(raw), Err(ReleaseValueError::EmptyTenantId));
    }

    #[rstest]
    fn tenant_id_trims_whitespace() {
        let tenant = TenantId::new("  acme ").expect("valid tenant");
        assert_eq!(tenant.as_str(), "acme");
    }
}
