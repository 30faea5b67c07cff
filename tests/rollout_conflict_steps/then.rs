//! Then steps for rollout conflict BDD scenarios.

use super::world::{RolloutWorld, run_async};
use rstest_bdd_macros::then;
use shipwright::distribution::{
    domain::{ExposurePercent, SubmissionStatus},
    services::{RolloutConflict, RolloutError},
};

#[then("the first command succeeds")]
fn first_command_succeeds(world: &RolloutWorld) -> Result<(), eyre::Report> {
    let result = world
        .command_results
        .first()
        .ok_or_else(|| eyre::eyre!("no command was issued"))?;
    if let Err(err) = result {
        return Err(eyre::eyre!("expected success, got {err}"));
    }
    Ok(())
}

#[then("the second command is rejected with an exposure conflict at {current:u8} percent")]
fn second_command_conflicts(world: &RolloutWorld, current: u8) -> Result<(), eyre::Report> {
    let expected = ExposurePercent::new(current)?;
    let result = world
        .command_results
        .get(1)
        .ok_or_else(|| eyre::eyre!("no second command was issued"))?;
    if !matches!(
        result,
        Err(RolloutError::ConflictDetected(RolloutConflict::Exposure { current: actual, .. }))
            if *actual == expected
    ) {
        return Err(eyre::eyre!(
            "expected exposure conflict at {expected}, got {result:?}"
        ));
    }
    Ok(())
}

#[then(r#"the last command is rejected because the submission is "{status}""#)]
fn last_command_terminal(world: &RolloutWorld, status: String) -> Result<(), eyre::Report> {
    let expected = SubmissionStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let result = world
        .command_results
        .last()
        .ok_or_else(|| eyre::eyre!("no command was issued"))?;
    if !matches!(
        result,
        Err(RolloutError::TerminalStateViolation { status: actual, .. }) if *actual == expected
    ) {
        return Err(eyre::eyre!(
            "expected terminal state violation for {expected}, got {result:?}"
        ));
    }
    Ok(())
}

#[then("the stored exposure is {percent:u8} percent")]
fn stored_exposure(world: &RolloutWorld, percent: u8) -> Result<(), eyre::Report> {
    let expected = ExposurePercent::new(percent)?;
    let stored = world.stored()?;
    if stored.exposure_percent() != expected {
        return Err(eyre::eyre!(
            "expected stored exposure {expected}, found {}",
            stored.exposure_percent()
        ));
    }
    Ok(())
}

#[then(r#"the stored status is "{status}""#)]
fn stored_status(world: &RolloutWorld, status: String) -> Result<(), eyre::Report> {
    let expected = SubmissionStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = world.stored()?;
    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected stored status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

#[then(r#"the release distribution status is "{status}""#)]
fn release_distribution_status(world: &RolloutWorld, status: String) -> Result<(), eyre::Report> {
    let snapshot = run_async(world.tracker.get_distribution_status(world.release_id))?;
    if snapshot.release_status.as_str() != status {
        return Err(eyre::eyre!(
            "expected distribution status {status}, found {}",
            snapshot.release_status
        ));
    }
    Ok(())
}
