//! Store distribution and rollout control through the public API.

use super::helpers::{Pipeline, pipeline};
use eyre::ensure;
use rstest::rstest;
use shipwright::distribution::{
    domain::{
        DistributionStatus, ExposurePercent, HaltSeverity, RolloutSchedule, SubmissionStatus,
        VersionName,
    },
    ports::StoreOperation,
    services::{RolloutError, RolloutPrecondition, SubmitRequest},
};
use shipwright::release::Platform;

fn percent(value: u8) -> eyre::Result<ExposurePercent> {
    Ok(ExposurePercent::new(value)?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn release_reaches_every_user_on_both_stores(
    pipeline: eyre::Result<Pipeline>,
) -> eyre::Result<()> {
    let ctx = pipeline?;
    ctx.tracker
        .register_release(ctx.release_id, &[Platform::Android, Platform::Ios])
        .await?;

    let android = ctx
        .tracker
        .submit(SubmitRequest::new(ctx.release_id, Platform::Android, "3.0.0"))
        .await?
        .submission;
    let ios = ctx
        .tracker
        .submit(
            SubmitRequest::new(ctx.release_id, Platform::Ios, "3.0.0")
                .with_schedule(RolloutSchedule::StorePhased),
        )
        .await?
        .submission;

    ctx.tracker.mark_approved(android.id()).await?;
    let android_live = ctx
        .tracker
        .mark_live(android.id(), percent(10)?)
        .await?
        .submission;
    let widened = ctx
        .controller
        .update_rollout(
            android.id(),
            percent(50)?,
            &RolloutPrecondition::observed(&android_live),
        )
        .await?;
    ensure!(widened.distribution.release_status == DistributionStatus::Submitted);

    ctx.tracker.mark_in_review(ios.id()).await?;
    ctx.tracker.mark_approved(ios.id()).await?;
    ctx.tracker.mark_live(ios.id(), ExposurePercent::FULL).await?;
    for day in 2..=5 {
        ctx.tracker.sync_phased_day(ios.id(), day).await?;
    }
    let ios_day_six = ctx.tracker.sync_phased_day(ios.id(), 6).await?;
    ensure!(ios_day_six.submission.exposure_percent() == percent(50)?);
    ensure!(ios_day_six.distribution.overall_progress == 50);

    let android_done = ctx
        .controller
        .complete_early(
            android.id(),
            &RolloutPrecondition::observed(&widened.submission),
        )
        .await?;
    ensure!(android_done.distribution.release_status == DistributionStatus::PartiallyReleased);

    let ios_done = ctx.tracker.sync_phased_day(ios.id(), 7).await?;
    ensure!(ios_done.distribution.release_status == DistributionStatus::Released);
    ensure!(ios_done.distribution.is_complete);
    ensure!(ios_done.distribution.overall_progress == 100);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn halted_rollout_is_replaced_by_resubmission(
    pipeline: eyre::Result<Pipeline>,
) -> eyre::Result<()> {
    let ctx = pipeline?;
    ctx.tracker
        .register_release(ctx.release_id, &[Platform::Android])
        .await?;
    let submitted = ctx
        .tracker
        .submit(SubmitRequest::new(ctx.release_id, Platform::Android, "3.0.0"))
        .await?
        .submission;
    ctx.tracker.mark_approved(submitted.id()).await?;
    let live = ctx
        .tracker
        .mark_live(submitted.id(), percent(5)?)
        .await?
        .submission;

    let halted = ctx
        .controller
        .halt_rollout(
            live.id(),
            "startup crash on Android 14",
            HaltSeverity::Critical,
            &RolloutPrecondition::observed(&live),
        )
        .await?;
    ensure!(halted.submission.status() == SubmissionStatus::Halted);
    ensure!(halted.distribution.overall_progress == 0);

    let retry = ctx
        .controller
        .update_rollout(
            live.id(),
            percent(10)?,
            &RolloutPrecondition::observed(&halted.submission),
        )
        .await;
    ensure!(matches!(
        retry,
        Err(RolloutError::TerminalStateViolation {
            status: SubmissionStatus::Halted,
            ..
        })
    ));

    let hotfix = ctx
        .tracker
        .resubmit(live.id(), "3.0.1", &VersionName::new("3.0.0")?)
        .await?;
    ensure!(hotfix.submission.supersedes() == Some(live.id()));
    ctx.tracker.mark_approved(hotfix.submission.id()).await?;
    let relaunched = ctx
        .tracker
        .mark_live(hotfix.submission.id(), percent(5)?)
        .await?;
    ensure!(relaunched.distribution.overall_progress == 5);
    ensure!(ctx.store.call_count(StoreOperation::Submit) == 2);
    ensure!(ctx.store.call_count(StoreOperation::Halt) == 1);
    Ok(())
}
