//! When steps for build reconciliation BDD scenarios.

use super::world::{BuildWorld, run_async};
use rstest_bdd_macros::when;

#[when("the pending builds are polled")]
fn poll_pending(world: &mut BuildWorld) -> Result<(), eyre::Report> {
    let summary = run_async(
        world
            .reconciler
            .poll_pending_workflows(world.release_id, &world.tenant_id),
    )?;
    world.polls.push(summary);
    Ok(())
}

#[when("the running builds are polled")]
fn poll_running(world: &mut BuildWorld) -> Result<(), eyre::Report> {
    let summary = run_async(
        world
            .reconciler
            .poll_running_workflows(world.release_id, &world.tenant_id),
    )?;
    world.polls.push(summary);
    Ok(())
}
