//! Service layer for triggering CI/CD workflows.

use super::status_adapter::{ProviderRegistry, ProviderStatusError};
use crate::build::{
    domain::{Build, BuildDomainError, BuildTarget, CiProviderType, NewBuild, TaskId},
    ports::{
        BuildRepository, BuildRepositoryError, CredentialStore, CredentialStoreError,
        WorkflowTrigger,
    },
};
use crate::config::EngineConfig;
use crate::release::{Platform, ReleaseId, TenantId};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for triggering a build workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBuildRequest {
    release_id: ReleaseId,
    tenant_id: TenantId,
    platform: Platform,
    target: String,
    provider_type: CiProviderType,
    trigger: WorkflowTrigger,
    task_id: Option<String>,
}

impl TriggerBuildRequest {
    /// Creates a request with required fields.
    #[must_use]
    pub fn new(
        release_id: ReleaseId,
        tenant_id: TenantId,
        platform: Platform,
        target: impl Into<String>,
        provider_type: CiProviderType,
        trigger: WorkflowTrigger,
    ) -> Self {
        Self {
            release_id,
            tenant_id,
            platform,
            target: target.into(),
            provider_type,
            trigger,
            task_id: None,
        }
    }

    /// Links the build to a release task.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

/// Service-level errors for workflow triggering.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BuildDomainError),
    /// Provider resolution or the trigger call failed.
    #[error(transparent)]
    Provider(#[from] ProviderStatusError),
    /// Tenant credentials could not be loaded.
    #[error(transparent)]
    Credentials(#[from] CredentialStoreError),
    /// The credential lookup or trigger call did not answer in time.
    #[error("{provider} trigger timed out")]
    TimedOut {
        /// Provider type.
        provider: CiProviderType,
    },
    /// Persisting the build failed.
    #[error(transparent)]
    Repository(#[from] BuildRepositoryError),
}

/// Result type for trigger operations.
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Triggers workflows and records the resulting `PENDING` builds.
#[derive(Clone)]
pub struct BuildTriggerService<R, S, C>
where
    R: BuildRepository,
    S: CredentialStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    credentials: Arc<S>,
    registry: Arc<ProviderRegistry>,
    clock: Arc<C>,
    config: EngineConfig,
}

impl<R, S, C> BuildTriggerService<R, S, C>
where
    R: BuildRepository,
    S: CredentialStore,
    C: Clock + Send + Sync,
{
    /// Creates a trigger service with default configuration.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        credentials: Arc<S>,
        registry: Arc<ProviderRegistry>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            credentials,
            registry,
            clock,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Triggers the workflow and stores a `PENDING` build for it.
    ///
    /// No build is stored when the trigger call fails.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] when validation fails, the provider is not
    /// usable, the trigger call fails or times out, or persistence fails.
    pub async fn trigger(&self, request: TriggerBuildRequest) -> TriggerResult<Build> {
        let target = BuildTarget::new(request.target)?;
        let task_id = request.task_id.map(TaskId::new).transpose()?;
        let provider = request.provider_type;
        let adapter = self.registry.resolve(provider)?;
        let credentials = tokio::time::timeout(
            self.config.status_check_timeout,
            self.credentials.get_credentials(&request.tenant_id, provider),
        )
        .await
        .map_err(|_| TriggerError::TimedOut { provider })??;

        let queue_location = tokio::time::timeout(
            self.config.status_check_timeout,
            adapter.trigger(&credentials, &request.trigger),
        )
        .await
        .map_err(|_| TriggerError::TimedOut { provider })??;

        let build = Build::new(
            NewBuild {
                release_id: request.release_id,
                platform: request.platform,
                target,
                provider_type: provider,
                queue_location,
                task_id,
            },
            &*self.clock,
        );
        self.repository.store(&build).await?;
        tracing::info!(
            build_id = %build.id(),
            release_id = %build.release_id(),
            provider = %provider,
            "build workflow triggered"
        );
        Ok(build)
    }
}
