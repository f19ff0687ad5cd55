//! Behaviour tests for routing and executing tasks across providers.

mod orchestration_steps;

use orchestration_steps::world::{OrchestrationWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/orchestration.feature",
    name = "Completion tasks are routed to the best matching provider"
)]
#[tokio::test(flavor = "multi_thread")]
async fn completion_routed_to_best_provider(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/orchestration.feature",
    name = "Unavailable providers are left out of the routing plan"
)]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_providers_left_out(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/orchestration.feature",
    name = "Tasks nobody can perform are rejected with an explanation"
)]
#[tokio::test(flavor = "multi_thread")]
async fn uncovered_tasks_rejected(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/orchestration.feature",
    name = "Divergent answers are kept as alternatives"
)]
#[tokio::test(flavor = "multi_thread")]
async fn divergent_answers_kept(world: OrchestrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/orchestration.feature",
    name = "A failing primary falls back to the next provider"
)]
#[tokio::test(flavor = "multi_thread")]
async fn failing_primary_falls_back(world: OrchestrationWorld) {
    let _ = world;
}
