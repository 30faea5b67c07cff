//! Credential store port for decrypted CI/CD integration settings.

use crate::build::domain::CiProviderType;
use crate::release::TenantId;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Decrypted connection settings for one tenant's provider integration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    base_url: String,
    username: Option<String>,
    token: String,
}

impl ProviderCredentials {
    /// Creates credentials for the given provider host and API token.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            token: token.into(),
        }
    }

    /// Sets the user the token belongs to (Jenkins basic auth).
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Returns the provider base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the user name, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the API token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of decrypted integration credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns ready-to-use credentials for a tenant's provider integration.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::NotConfigured`] when the tenant has no
    /// integration for the provider.
    async fn get_credentials(
        &self,
        tenant_id: &TenantId,
        provider: CiProviderType,
    ) -> Result<ProviderCredentials, CredentialStoreError>;
}

/// Errors returned by credential store implementations.
#[derive(Debug, Clone, Error)]
pub enum CredentialStoreError {
    /// No integration exists for the tenant and provider.
    #[error("no {provider} integration configured for tenant {tenant_id}")]
    NotConfigured {
        /// Tenant identifier.
        tenant_id: TenantId,
        /// Provider type.
        provider: CiProviderType,
    },

    /// Secret-store failure.
    #[error("credential store error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl CredentialStoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
