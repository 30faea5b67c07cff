//! Build triggering and reconciliation through the public API.

use super::helpers::{Pipeline, building, finished, pipeline, started_item};
use eyre::{OptionExt, ensure};
use rstest::rstest;
use shipwright::build::{
    domain::{CiProviderType, RunId, TaskId, UploadStatus, WorkflowStatus},
    ports::{BuildRepository, WorkflowTrigger},
    services::TriggerBuildRequest,
};
use shipwright::release::Platform;

const RUN_URL: &str = "https://ci.example/job/android-release/7/";

fn request(pipeline: &Pipeline) -> TriggerBuildRequest {
    TriggerBuildRequest::new(
        pipeline.release_id,
        pipeline.tenant_id.clone(),
        Platform::Android,
        "play_store",
        CiProviderType::Jenkins,
        WorkflowTrigger::new("android-release"),
    )
    .with_task_id("task-9")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn triggered_build_completes_and_notifies_task(
    pipeline: eyre::Result<Pipeline>,
) -> eyre::Result<()> {
    let ctx = pipeline?;
    let build = ctx.trigger.trigger(request(&ctx)).await?;
    let queue_url = build
        .queue_location()
        .ok_or_eyre("trigger must record the queue location")?
        .as_str()
        .to_owned();
    ctx.jenkins.set_queue_item(queue_url, started_item(RUN_URL));
    ctx.jenkins.set_build(RUN_URL, building());

    let first = ctx
        .reconciler
        .poll_release(ctx.release_id, &ctx.tenant_id)
        .await?;
    ensure!(first.pending.updated == 1);
    ensure!(first.running.processed == 1);
    ensure!(first.running.updated == 0);

    ctx.jenkins.set_build(RUN_URL, finished("SUCCESS"));
    let second = ctx
        .reconciler
        .poll_release(ctx.release_id, &ctx.tenant_id)
        .await?;
    ensure!(second.pending.processed == 0);
    ensure!(second.running.updated == 1);
    ensure!(second.running.callbacks == 1);

    let stored = ctx
        .builds
        .find_by_id(build.id())
        .await?
        .ok_or_eyre("build missing")?;
    ensure!(stored.workflow_status() == WorkflowStatus::Completed);
    ensure!(stored.upload_status() == UploadStatus::Pending);
    ensure!(stored.run_id().map(RunId::as_str) == Some(RUN_URL));

    let task = TaskId::new("task-9")?;
    ensure!(ctx.sink.received() == vec![task.clone(), task]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_build_marks_upload_failed(pipeline: eyre::Result<Pipeline>) -> eyre::Result<()> {
    let ctx = pipeline?;
    let build = ctx.trigger.trigger(request(&ctx)).await?;
    let queue_url = build
        .queue_location()
        .ok_or_eyre("trigger must record the queue location")?
        .as_str()
        .to_owned();
    ctx.jenkins.set_queue_item(queue_url, started_item(RUN_URL));
    ctx.jenkins.set_build(RUN_URL, finished("FAILURE"));

    let summary = ctx
        .reconciler
        .poll_release(ctx.release_id, &ctx.tenant_id)
        .await?;

    ensure!(summary.running.updated == 1);
    let stored = ctx
        .builds
        .find_by_id(build.id())
        .await?
        .ok_or_eyre("build missing")?;
    ensure!(stored.workflow_status() == WorkflowStatus::Failed);
    ensure!(stored.upload_status() == UploadStatus::Failed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_polls_without_provider_change_are_idempotent(
    pipeline: eyre::Result<Pipeline>,
) -> eyre::Result<()> {
    let ctx = pipeline?;
    ctx.trigger.trigger(request(&ctx)).await?;

    for _ in 0..3 {
        let summary = ctx
            .reconciler
            .poll_release(ctx.release_id, &ctx.tenant_id)
            .await?;
        ensure!(summary.pending.processed == 1);
        ensure!(summary.pending.updated == 0);
        ensure!(summary.pending.callbacks == 0);
    }
    ensure!(ctx.sink.received().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn summary_serializes_for_http_collaborators(
    pipeline: eyre::Result<Pipeline>,
) -> eyre::Result<()> {
    let ctx = pipeline?;
    ctx.trigger.trigger(request(&ctx)).await?;

    let summary = ctx
        .reconciler
        .poll_pending_workflows(ctx.release_id, &ctx.tenant_id)
        .await?;
    let json = serde_json::to_value(&summary)?;

    ensure!(json["processed"] == 1);
    ensure!(json["callback_failures"].as_array().is_some_and(Vec::is_empty));
    ensure!(json["results"][0]["previous_status"] == "PENDING");
    Ok(())
}
