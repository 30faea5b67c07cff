//! Service tests for workflow triggering.

use crate::build::{
    adapters::memory::{InMemoryBuildRepository, InMemoryCredentialStore, ScriptedJenkinsApi},
    domain::{CiProviderType, UploadStatus, WorkflowStatus},
    ports::{BuildRepository, ProviderCredentials, WorkflowTrigger},
    services::{
        BuildTriggerService, ProviderRegistry, ProviderStatusError, TriggerBuildRequest,
        TriggerError,
    },
};
use crate::config::EngineConfig;
use crate::release::{Platform, ReleaseId, TenantId};
use eyre::{OptionExt, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    tenant_id: TenantId,
    repository: Arc<InMemoryBuildRepository>,
    credentials: Arc<InMemoryCredentialStore>,
    jenkins: ScriptedJenkinsApi,
    service: BuildTriggerService<InMemoryBuildRepository, InMemoryCredentialStore, DefaultClock>,
}

#[fixture]
fn harness() -> Harness {
    let tenant_id = TenantId::new("acme").expect("valid tenant");
    let credentials = Arc::new(InMemoryCredentialStore::new());
    credentials
        .insert(
            tenant_id.clone(),
            CiProviderType::Jenkins,
            ProviderCredentials::new("https://jenkins.example/", "token"),
        )
        .expect("credentials insert");
    let jenkins = ScriptedJenkinsApi::new();
    let registry = ProviderRegistry::new().with_jenkins(Arc::new(jenkins.clone()));
    let repository = Arc::new(InMemoryBuildRepository::new());
    let service = BuildTriggerService::new(
        repository.clone(),
        credentials.clone(),
        Arc::new(registry),
        Arc::new(DefaultClock),
    );
    Harness {
        tenant_id,
        repository,
        credentials,
        jenkins,
        service,
    }
}

fn request(
    harness: &Harness,
    release_id: ReleaseId,
    provider: CiProviderType,
) -> TriggerBuildRequest {
    TriggerBuildRequest::new(
        release_id,
        harness.tenant_id.clone(),
        Platform::Android,
        "play_store",
        provider,
        WorkflowTrigger::new("android-release").with_parameter("flavour", "prod"),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn jenkins_trigger_stores_pending_build(harness: Harness) -> eyre::Result<()> {
    let release_id = ReleaseId::new();

    let build = harness
        .service
        .trigger(request(&harness, release_id, CiProviderType::Jenkins).with_task_id("task-1"))
        .await?;

    ensure!(build.workflow_status() == WorkflowStatus::Pending);
    ensure!(build.upload_status() == UploadStatus::Pending);
    ensure!(
        build.queue_location().map(|location| location.as_str())
            == Some("https://jenkins.example/queue/item/1/")
    );
    ensure!(build.task_id().map(|task| task.as_str()) == Some("task-1"));
    let stored = harness
        .repository
        .find_by_id(build.id())
        .await?
        .ok_or_eyre("triggered build should be stored")?;
    ensure!(stored == build);
    ensure!(harness.jenkins.call_count() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_provider_trigger_stores_nothing(harness: Harness) -> eyre::Result<()> {
    let release_id = ReleaseId::new();

    let result = harness
        .service
        .trigger(request(&harness, release_id, CiProviderType::CircleCi))
        .await;

    ensure!(matches!(
        result,
        Err(TriggerError::Provider(ProviderStatusError::UnsupportedProvider(
            CiProviderType::CircleCi
        )))
    ));
    let stored = harness
        .repository
        .find_by_release_and_status(release_id, WorkflowStatus::Pending)
        .await?;
    ensure!(stored.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_provider_is_not_configured(harness: Harness) -> eyre::Result<()> {
    let result = harness
        .service
        .trigger(request(&harness, ReleaseId::new(), CiProviderType::GithubActions))
        .await;

    ensure!(matches!(
        result,
        Err(TriggerError::Provider(ProviderStatusError::NotConfigured(
            CiProviderType::GithubActions
        )))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_target_is_rejected_before_provider_call(harness: Harness) -> eyre::Result<()> {
    let blank = TriggerBuildRequest::new(
        ReleaseId::new(),
        harness.tenant_id.clone(),
        Platform::Ios,
        "  ",
        CiProviderType::Jenkins,
        WorkflowTrigger::new("ios-release"),
    );

    let result = harness.service.trigger(blank).await;

    ensure!(matches!(result, Err(TriggerError::Domain(_))));
    ensure!(harness.jenkins.call_count() == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_credential_lookup_times_out_before_trigger(harness: Harness) -> eyre::Result<()> {
    harness.credentials.set_delay(Duration::from_millis(500))?;
    let release_id = ReleaseId::new();
    let android = request(&harness, release_id, CiProviderType::Jenkins);
    let service = harness.service.with_config(
        EngineConfig::default().with_status_check_timeout(Duration::from_millis(20)),
    );

    let result = service.trigger(android).await;

    ensure!(matches!(
        result,
        Err(TriggerError::TimedOut {
            provider: CiProviderType::Jenkins
        })
    ));
    ensure!(harness.jenkins.call_count() == 0);
    let stored = harness
        .repository
        .find_by_release_and_status(release_id, WorkflowStatus::Pending)
        .await?;
    ensure!(stored.is_empty());
    Ok(())
}
