//! When steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use rstest_bdd_macros::when;
use serde_json::json;
use switchyard::provider::domain::Capability;
use switchyard::work::domain::{Task, WorkspaceSnapshot};

#[when(r#"a "{task_type}" task is submitted"#)]
fn submit_task(world: &mut OrchestrationWorld, task_type: String) -> Result<(), eyre::Report> {
    let capability = Capability::new(&task_type)
        .map_err(|err| eyre::eyre!("invalid task type '{task_type}': {err}"))?;
    let task = Task::new(capability, json!({"prompt": "help"}));
    world.last_task = Some(task.id());
    let result = run_async(
        world
            .orchestrator
            .submit_task(task, WorkspaceSnapshot::new()),
    );
    world.last_result = Some(result);
    Ok(())
}
