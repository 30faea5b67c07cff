//! When steps for rollout conflict BDD scenarios.

use super::world::{RolloutWorld, run_async};
use rstest_bdd_macros::when;
use shipwright::distribution::{
    domain::{ExposurePercent, HaltSeverity},
    services::RolloutPrecondition,
};

fn observed_now(world: &RolloutWorld) -> Result<RolloutPrecondition, eyre::Report> {
    Ok(RolloutPrecondition::observed(&world.stored()?))
}

#[when("an operator raises the rollout from {observed:u8} to {target:u8} percent")]
fn raise_rollout(
    world: &mut RolloutWorld,
    observed: u8,
    target: u8,
) -> Result<(), eyre::Report> {
    let id = world.target()?;
    let current = world.stored()?;
    let precondition = RolloutPrecondition::new(
        current.version_name().clone(),
        ExposurePercent::new(observed)?,
    );
    let result = run_async(world.controller.update_rollout(
        id,
        ExposurePercent::new(target)?,
        &precondition,
    ));
    world.command_results.push(result);
    Ok(())
}

#[when(r#"an operator pauses the rollout because "{reason}""#)]
fn pause_rollout(world: &mut RolloutWorld, reason: String) -> Result<(), eyre::Report> {
    let id = world.target()?;
    let precondition = observed_now(world)?;
    let result = run_async(world.controller.pause_rollout(id, &reason, &precondition));
    world.command_results.push(result);
    Ok(())
}

#[when("an operator resumes the rollout")]
fn resume_rollout(world: &mut RolloutWorld) -> Result<(), eyre::Report> {
    let id = world.target()?;
    let precondition = observed_now(world)?;
    let result = run_async(world.controller.resume_rollout(id, &precondition));
    world.command_results.push(result);
    Ok(())
}

#[when(r#"an operator halts the rollout because "{reason}""#)]
fn halt_rollout(world: &mut RolloutWorld, reason: String) -> Result<(), eyre::Report> {
    let id = world.target()?;
    let precondition = observed_now(world)?;
    let result = run_async(world.controller.halt_rollout(
        id,
        &reason,
        HaltSeverity::Critical,
        &precondition,
    ));
    world.command_results.push(result);
    Ok(())
}
