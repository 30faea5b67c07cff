//! Given steps for rollout conflict BDD scenarios.

use super::world::{RolloutWorld, platform, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use shipwright::distribution::{domain::ExposurePercent, services::SubmitRequest};

#[given("a release targeting {platforms}")]
fn release_targeting(world: &mut RolloutWorld, platforms: String) -> Result<(), eyre::Report> {
    let targets = platforms
        .split(" and ")
        .map(platform)
        .collect::<Result<Vec<_>, _>>()?;
    run_async(world.tracker.register_release(world.release_id, &targets))
        .wrap_err("register release distribution")?;
    Ok(())
}

#[given("the {name} submission is live at {percent:u8} percent")]
fn submission_is_live(
    world: &mut RolloutWorld,
    name: String,
    percent: u8,
) -> Result<(), eyre::Report> {
    let target = platform(&name)?;
    let exposure = ExposurePercent::new(percent)?;
    let submitted = run_async(
        world
            .tracker
            .submit(SubmitRequest::new(world.release_id, target, "5.1.0")),
    )
    .wrap_err("submit version to store")?;
    let id = submitted.submission.id();
    run_async(world.tracker.mark_approved(id)).wrap_err("approve submission")?;
    run_async(world.tracker.mark_live(id, exposure)).wrap_err("release submission")?;
    world.live_submission = Some(id);
    Ok(())
}

#[given("the {name} submission is in review")]
fn submission_in_review(world: &mut RolloutWorld, name: String) -> Result<(), eyre::Report> {
    let target = platform(&name)?;
    let submitted = run_async(
        world
            .tracker
            .submit(SubmitRequest::new(world.release_id, target, "5.1.0")),
    )
    .wrap_err("submit version to store")?;
    run_async(world.tracker.mark_in_review(submitted.submission.id()))
        .wrap_err("start review")?;
    Ok(())
}
