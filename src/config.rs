//! Engine configuration for reconciliation passes and store calls.
//!
//! Values are loaded from `SHIPWRIGHT_*` environment variables with strict
//! validation. Missing variables fall back to [`EngineConfig::default`].

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Environment key for the provider status-check timeout, in seconds.
pub const ENV_STATUS_CHECK_TIMEOUT_SECS: &str = "SHIPWRIGHT_STATUS_CHECK_TIMEOUT_SECS";
/// Environment key for the store call timeout, in seconds.
pub const ENV_STORE_CALL_TIMEOUT_SECS: &str = "SHIPWRIGHT_STORE_CALL_TIMEOUT_SECS";
/// Environment key for the task callback timeout, in seconds.
pub const ENV_CALLBACK_TIMEOUT_SECS: &str = "SHIPWRIGHT_CALLBACK_TIMEOUT_SECS";
/// Environment key for the per-pass concurrent provider check limit.
pub const ENV_MAX_CONCURRENT_CHECKS: &str = "SHIPWRIGHT_MAX_CONCURRENT_CHECKS";

const DEFAULT_STATUS_CHECK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_CALL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 8;

/// Runtime configuration shared by the reconciliation and rollout services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on a single provider status check.
    #[serde(with = "duration_secs")]
    pub status_check_timeout: Duration,
    /// Upper bound on a single remote store call.
    #[serde(with = "duration_secs")]
    pub store_call_timeout: Duration,
    /// Upper bound on a single task callback.
    #[serde(with = "duration_secs")]
    pub callback_timeout: Duration,
    /// Maximum provider checks in flight within one reconciliation pass.
    pub max_concurrent_checks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            status_check_timeout: Duration::from_secs(DEFAULT_STATUS_CHECK_TIMEOUT_SECS),
            store_call_timeout: Duration::from_secs(DEFAULT_STORE_CALL_TIMEOUT_SECS),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

/// Error raised when configuration values are invalid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The value is not a positive integer.
    #[error("{key} must be a positive integer, got '{value}'")]
    NotPositiveInteger {
        /// Environment key.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The value exceeds the supported range.
    #[error("{key} value {value} exceeds supported range")]
    OutOfRange {
        /// Environment key.
        key: String,
        /// Parsed value.
        value: u64,
    },
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a provided value is not a positive
    /// integer or exceeds the supported range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration with a custom environment source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a provided value is not a positive
    /// integer or exceeds the supported range.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let status_check_secs = parse_positive_u64_env(&get_env, ENV_STATUS_CHECK_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_STATUS_CHECK_TIMEOUT_SECS);
        let store_call_secs = parse_positive_u64_env(&get_env, ENV_STORE_CALL_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_STORE_CALL_TIMEOUT_SECS);
        let callback_secs = parse_positive_u64_env(&get_env, ENV_CALLBACK_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_CALLBACK_TIMEOUT_SECS);
        let max_concurrent_checks = parse_positive_u64_env(&get_env, ENV_MAX_CONCURRENT_CHECKS)?
            .map(|value| {
                usize::try_from(value).map_err(|_| ConfigError::OutOfRange {
                    key: ENV_MAX_CONCURRENT_CHECKS.to_owned(),
                    value,
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_CONCURRENT_CHECKS);

        Ok(Self {
            status_check_timeout: Duration::from_secs(status_check_secs),
            store_call_timeout: Duration::from_secs(store_call_secs),
            callback_timeout: Duration::from_secs(callback_secs),
            max_concurrent_checks,
        })
    }

    /// Returns a copy with a different status-check timeout.
    #[must_use]
    pub const fn with_status_check_timeout(mut self, timeout: Duration) -> Self {
        self.status_check_timeout = timeout;
        self
    }

    /// Returns a copy with a different store call timeout.
    #[must_use]
    pub const fn with_store_call_timeout(mut self, timeout: Duration) -> Self {
        self.store_call_timeout = timeout;
        self
    }

    /// Returns a copy with a different task callback timeout.
    #[must_use]
    pub const fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Returns a copy with a different concurrency limit (minimum 1).
    #[must_use]
    pub fn with_max_concurrent_checks(mut self, limit: usize) -> Self {
        self.max_concurrent_checks = limit.max(1);
        self
    }
}

fn parse_positive_u64_env<F>(get_env: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get_env(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::NotPositiveInteger {
            key: key.to_owned(),
            value: raw,
        }),
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
