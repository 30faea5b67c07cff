//! Shared wiring for in-memory pipeline integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use shipwright::build::{
    adapters::memory::{
        InMemoryBuildRepository, InMemoryCredentialStore, RecordingTaskCallbackSink,
        ScriptedJenkinsApi,
    },
    domain::CiProviderType,
    ports::{
        CredentialStoreError, JenkinsBuild, JenkinsExecutable, JenkinsQueueItem,
        ProviderCredentials,
    },
    services::{BuildStatusReconciler, BuildTriggerService, ProviderRegistry},
};
use shipwright::distribution::{
    adapters::memory::{InMemoryDistributionRepository, ScriptedStoreClient},
    services::{ConflictResolver, RolloutController, SubmissionTracker},
};
use shipwright::release::{ReleaseId, TenantId};
use std::sync::Arc;

/// Trigger service wired to in-memory collaborators.
pub type TestTrigger =
    BuildTriggerService<InMemoryBuildRepository, InMemoryCredentialStore, DefaultClock>;

/// Reconciler wired to in-memory collaborators.
pub type TestReconciler = BuildStatusReconciler<
    InMemoryBuildRepository,
    InMemoryCredentialStore,
    RecordingTaskCallbackSink,
    DefaultClock,
>;

/// Submission tracker wired to in-memory collaborators.
pub type TestTracker =
    SubmissionTracker<InMemoryDistributionRepository, ScriptedStoreClient, DefaultClock>;

/// Rollout controller wired to in-memory collaborators.
pub type TestController =
    RolloutController<InMemoryDistributionRepository, ScriptedStoreClient, DefaultClock>;

/// Every service of one tenant's release, sharing in-memory state.
pub struct Pipeline {
    pub release_id: ReleaseId,
    pub tenant_id: TenantId,
    pub builds: Arc<InMemoryBuildRepository>,
    pub jenkins: ScriptedJenkinsApi,
    pub sink: Arc<RecordingTaskCallbackSink>,
    pub trigger: TestTrigger,
    pub reconciler: TestReconciler,
    pub store: ScriptedStoreClient,
    pub tracker: TestTracker,
    pub controller: TestController,
}

/// Builds credentials for the Jenkins integration of `tenant_id`.
///
/// # Errors
///
/// Returns an error if the credential store rejects the entry.
pub fn jenkins_credentials(
    tenant_id: &TenantId,
) -> Result<InMemoryCredentialStore, CredentialStoreError> {
    let credentials = InMemoryCredentialStore::new();
    credentials.insert(
        tenant_id.clone(),
        CiProviderType::Jenkins,
        ProviderCredentials::new("https://ci.example", "token"),
    )?;
    Ok(credentials)
}

/// Provides a fully wired pipeline for a fresh release.
///
/// # Errors
///
/// Returns an error if the tenant or credentials cannot be created.
#[fixture]
pub fn pipeline() -> eyre::Result<Pipeline> {
    let tenant_id = TenantId::new("acme")?;
    let credentials = Arc::new(jenkins_credentials(&tenant_id)?);
    let clock = Arc::new(DefaultClock);

    let jenkins = ScriptedJenkinsApi::new();
    let registry = Arc::new(ProviderRegistry::new().with_jenkins(Arc::new(jenkins.clone())));
    let builds = Arc::new(InMemoryBuildRepository::new());
    let sink = Arc::new(RecordingTaskCallbackSink::new());
    let trigger = BuildTriggerService::new(
        Arc::clone(&builds),
        Arc::clone(&credentials),
        Arc::clone(&registry),
        Arc::clone(&clock),
    );
    let reconciler = BuildStatusReconciler::new(
        Arc::clone(&builds),
        credentials,
        registry,
        Arc::clone(&sink),
        Arc::clone(&clock),
    );

    let distribution = Arc::new(InMemoryDistributionRepository::new());
    let store = ScriptedStoreClient::new();
    let resolver = ConflictResolver::new();
    let tracker = SubmissionTracker::new(
        Arc::clone(&distribution),
        Arc::new(store.clone()),
        Arc::clone(&clock),
    )
    .with_conflict_resolver(resolver.clone());
    let controller = RolloutController::new(distribution, Arc::new(store.clone()), clock)
        .with_conflict_resolver(resolver);

    Ok(Pipeline {
        release_id: ReleaseId::new(),
        tenant_id,
        builds,
        jenkins,
        sink,
        trigger,
        reconciler,
        store,
        tracker,
        controller,
    })
}

/// Jenkins queue item whose job started as `run_url`.
#[must_use]
pub fn started_item(run_url: &str) -> JenkinsQueueItem {
    JenkinsQueueItem {
        executable: Some(JenkinsExecutable {
            number: 7,
            url: run_url.to_owned(),
        }),
        ..JenkinsQueueItem::default()
    }
}

/// Jenkins build still executing.
#[must_use]
pub fn building() -> JenkinsBuild {
    JenkinsBuild {
        building: true,
        result: None,
    }
}

/// Jenkins build that finished with `result`.
#[must_use]
pub fn finished(result: &str) -> JenkinsBuild {
    JenkinsBuild {
        building: false,
        result: Some(result.to_owned()),
    }
}
