//! Shared world state for build reconciliation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use rstest::fixture;
use shipwright::build::{
    adapters::memory::{
        InMemoryBuildRepository, InMemoryCredentialStore, RecordingTaskCallbackSink,
        ScriptedJenkinsApi,
    },
    domain::{
        Build, BuildId, BuildTarget, CiProviderType, PersistedBuildData, QueueLocation, RunId,
        TaskId, UploadStatus, WorkflowStatus,
    },
    ports::{BuildRepository, ProviderCredentials},
    services::{BuildStatusReconciler, PollBatchSummary, ProviderRegistry},
};
use shipwright::release::{Platform, ReleaseId, TenantId};

/// Reconciler type used by the BDD world.
pub type TestReconciler = BuildStatusReconciler<
    InMemoryBuildRepository,
    InMemoryCredentialStore,
    RecordingTaskCallbackSink,
    DefaultClock,
>;

/// Provider handles of a build seeded by a scenario.
pub struct SeededBuild<'a> {
    pub status: WorkflowStatus,
    pub queue: &'a str,
    pub run: Option<&'a str>,
    pub task: Option<&'a str>,
}

/// Scenario world for build reconciliation behaviour tests.
pub struct BuildWorld {
    pub release_id: ReleaseId,
    pub tenant_id: TenantId,
    pub repository: Arc<InMemoryBuildRepository>,
    pub jenkins: ScriptedJenkinsApi,
    pub sink: Arc<RecordingTaskCallbackSink>,
    pub reconciler: TestReconciler,
    pub labels: HashMap<String, BuildId>,
    pub polls: Vec<PollBatchSummary>,
}

impl BuildWorld {
    /// Creates a world with Jenkins credentials for one tenant.
    ///
    /// # Errors
    ///
    /// Returns an error when the tenant or credentials are rejected.
    pub fn new() -> Result<Self, eyre::Report> {
        let tenant_id = TenantId::new("acme")?;
        let credentials = InMemoryCredentialStore::new();
        credentials.insert(
            tenant_id.clone(),
            CiProviderType::Jenkins,
            ProviderCredentials::new("https://ci.example", "token"),
        )?;
        let jenkins = ScriptedJenkinsApi::new();
        let registry = ProviderRegistry::new().with_jenkins(Arc::new(jenkins.clone()));
        let repository = Arc::new(InMemoryBuildRepository::new());
        let sink = Arc::new(RecordingTaskCallbackSink::new());
        let reconciler = BuildStatusReconciler::new(
            Arc::clone(&repository),
            Arc::new(credentials),
            Arc::new(registry),
            Arc::clone(&sink),
            Arc::new(DefaultClock),
        );

        Ok(Self {
            release_id: ReleaseId::new(),
            tenant_id,
            repository,
            jenkins,
            sink,
            reconciler,
            labels: HashMap::new(),
            polls: Vec::new(),
        })
    }

    /// Stores an Android Jenkins build under the scenario label `label`.
    ///
    /// # Errors
    ///
    /// Returns an error when a handle is invalid or the store rejects it.
    pub fn seed(&mut self, label: &str, seeded: &SeededBuild<'_>) -> Result<(), eyre::Report> {
        let now = Utc::now();
        let build = Build::from_persisted(PersistedBuildData {
            id: BuildId::new(),
            release_id: self.release_id,
            platform: Platform::Android,
            target: BuildTarget::new("play_store")?,
            provider_type: Some(CiProviderType::Jenkins),
            queue_location: Some(QueueLocation::new(seeded.queue)?),
            run_id: seeded.run.map(RunId::new).transpose()?,
            workflow_status: seeded.status,
            upload_status: UploadStatus::Pending,
            task_id: seeded.task.map(TaskId::new).transpose()?,
            created_at: now,
            updated_at: now,
        });
        run_async(self.repository.store(&build))?;
        self.labels.insert(label.to_owned(), build.id());
        Ok(())
    }

    /// Loads the stored build seeded under `label`.
    ///
    /// # Errors
    ///
    /// Returns an error when the label is unknown or the build is missing.
    pub fn stored(&self, label: &str) -> Result<Build, eyre::Report> {
        let id = self
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown build label {label} in scenario"))?;
        run_async(self.repository.find_by_id(id))?
            .ok_or_else(|| eyre::eyre!("build {id} missing from repository"))
    }
}

/// Fixture that creates a new scenario world.
///
/// # Panics
///
/// Panics if the fixed tenant credentials cannot be registered.
#[fixture]
pub fn world() -> BuildWorld {
    BuildWorld::new().expect("build world should initialise")
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
