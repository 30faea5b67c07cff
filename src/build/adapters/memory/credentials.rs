//! In-memory credential store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::build::{
    domain::CiProviderType,
    ports::{CredentialStore, CredentialStoreError, ProviderCredentials},
};
use crate::release::TenantId;

/// Thread-safe in-memory credential store keyed by tenant and provider.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    state: Arc<RwLock<CredentialState>>,
}

#[derive(Debug, Default)]
struct CredentialState {
    entries: HashMap<(TenantId, CiProviderType), ProviderCredentials>,
    delay: Option<Duration>,
}

fn lock_error(err: impl std::fmt::Display) -> CredentialStoreError {
    CredentialStoreError::backend(std::io::Error::other(err.to_string()))
}

impl InMemoryCredentialStore {
    /// Creates an empty credential store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers credentials for a tenant's provider integration.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Backend`] when lock acquisition fails.
    pub fn insert(
        &self,
        tenant_id: TenantId,
        provider: CiProviderType,
        credentials: ProviderCredentials,
    ) -> Result<(), CredentialStoreError> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.entries.insert((tenant_id, provider), credentials);
        Ok(())
    }

    /// Delays every lookup by `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Backend`] when lock acquisition fails.
    pub fn set_delay(&self, delay: Duration) -> Result<(), CredentialStoreError> {
        self.state.write().map_err(lock_error)?.delay = Some(delay);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_credentials(
        &self,
        tenant_id: &TenantId,
        provider: CiProviderType,
    ) -> Result<ProviderCredentials, CredentialStoreError> {
        let delay = self.state.read().map_err(lock_error)?.delay;
        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        let state = self.state.read().map_err(lock_error)?;
        state
            .entries
            .get(&(tenant_id.clone(), provider))
            .cloned()
            .ok_or_else(|| CredentialStoreError::NotConfigured {
                tenant_id: tenant_id.clone(),
                provider,
            })
    }
}
