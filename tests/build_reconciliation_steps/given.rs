//! Given steps for build reconciliation BDD scenarios.

use super::world::{BuildWorld, SeededBuild};
use rstest_bdd_macros::given;
use shipwright::build::{
    domain::WorkflowStatus,
    ports::{JenkinsBuild, JenkinsExecutable, JenkinsQueueItem},
};

#[given(r#"a pending Jenkins build "{label}" queued at "{queue}""#)]
fn pending_build(
    world: &mut BuildWorld,
    label: String,
    queue: String,
) -> Result<(), eyre::Report> {
    world.seed(
        &label,
        &SeededBuild {
            status: WorkflowStatus::Pending,
            queue: &queue,
            run: None,
            task: None,
        },
    )
}

#[given(r#"a running Jenkins build "{label}" on run "{run}" for task "{task}""#)]
fn running_build(
    world: &mut BuildWorld,
    label: String,
    run: String,
    task: String,
) -> Result<(), eyre::Report> {
    let queue = format!("queue-{label}");
    world.seed(
        &label,
        &SeededBuild {
            status: WorkflowStatus::Running,
            queue: &queue,
            run: Some(&run),
            task: Some(&task),
        },
    )
}

#[given(r#"the provider reports queue item "{queue}" started as "{run}""#)]
fn queue_item_started(world: &BuildWorld, queue: String, run: String) {
    world.jenkins.set_queue_item(
        queue,
        JenkinsQueueItem {
            executable: Some(JenkinsExecutable { number: 7, url: run }),
            ..JenkinsQueueItem::default()
        },
    );
}

#[given(r#"the provider reports queue item "{queue}" still waiting"#)]
fn queue_item_waiting(world: &BuildWorld, queue: String) {
    world.jenkins.set_queue_item(
        queue,
        JenkinsQueueItem {
            why: Some("Waiting for next available executor".to_owned()),
            ..JenkinsQueueItem::default()
        },
    );
}

#[given(r#"the provider reports run "{run}" finished with "{result}""#)]
fn run_finished(world: &BuildWorld, run: String, result: String) {
    world.jenkins.set_build(
        run,
        JenkinsBuild {
            building: false,
            result: Some(result),
        },
    );
}
