//! Then steps for build reconciliation BDD scenarios.

use super::world::BuildWorld;
use rstest_bdd_macros::then;
use shipwright::build::domain::{RunId, TaskId};

#[then(r#"build "{label}" is "{status}" with run "{run}""#)]
fn build_running_with(
    world: &BuildWorld,
    label: String,
    status: String,
    run: String,
) -> Result<(), eyre::Report> {
    let stored = world.stored(&label)?;
    if stored.workflow_status().as_str() != status {
        return Err(eyre::eyre!(
            "expected build {label} to be {status}, found {}",
            stored.workflow_status()
        ));
    }
    if stored.run_id().map(RunId::as_str) != Some(run.as_str()) {
        return Err(eyre::eyre!(
            "expected build {label} on run {run}, found {:?}",
            stored.run_id()
        ));
    }
    Ok(())
}

#[then(r#"build "{label}" is "{status}" with upload "{upload}""#)]
fn build_status_with_upload(
    world: &BuildWorld,
    label: String,
    status: String,
    upload: String,
) -> Result<(), eyre::Report> {
    let stored = world.stored(&label)?;
    if stored.workflow_status().as_str() != status || stored.upload_status().as_str() != upload {
        return Err(eyre::eyre!(
            "expected build {label} to be {status}/{upload}, found {}/{}",
            stored.workflow_status(),
            stored.upload_status()
        ));
    }
    Ok(())
}

#[then("the last poll updated {count:usize} builds")]
fn last_poll_updated(world: &BuildWorld, count: usize) -> Result<(), eyre::Report> {
    let summary = world
        .polls
        .last()
        .ok_or_else(|| eyre::eyre!("no poll was run"))?;
    if summary.updated != count {
        return Err(eyre::eyre!(
            "expected {count} updated builds, found {}",
            summary.updated
        ));
    }
    Ok(())
}

#[then(r#"task "{task}" is notified {count:usize} times"#)]
fn task_notified(world: &BuildWorld, task: String, count: usize) -> Result<(), eyre::Report> {
    let expected = TaskId::new(task)?;
    let notified = world
        .sink
        .received()
        .iter()
        .filter(|received| **received == expected)
        .count();
    if notified != count {
        return Err(eyre::eyre!(
            "expected {count} callbacks for {expected}, found {notified}"
        ));
    }
    Ok(())
}
