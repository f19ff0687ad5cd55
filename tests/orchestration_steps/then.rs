//! Then steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, provider_id};
use rstest_bdd_macros::then;
use switchyard::orchestration::services::OrchestrationError;
use switchyard::provider::ports::ProviderRegistry;

#[then(r#"the task is answered by "{name}""#)]
fn task_answered_by(world: &OrchestrationWorld, name: String) -> Result<(), eyre::Report> {
    let result = world
        .result()?
        .as_ref()
        .map_err(|err| eyre::eyre!("expected a result, got {err}"))?;
    if result.produced_by.as_str() != name {
        return Err(eyre::eyre!(
            "expected '{name}' to answer, got '{}'",
            result.produced_by
        ));
    }
    Ok(())
}

#[then(r#"provider "{name}" has {count:usize} recorded invocations"#)]
fn provider_has_invocations(
    world: &OrchestrationWorld,
    name: String,
    count: usize,
) -> Result<(), eyre::Report> {
    let id = provider_id(&name)?;
    let provider = world
        .registry
        .get(&id)
        .map_err(|err| eyre::eyre!("registry lookup failed: {err}"))?
        .ok_or_else(|| eyre::eyre!("provider '{name}' is not registered"))?;
    let recorded = provider.performance().invocations();
    if usize::try_from(recorded).ok() != Some(count) {
        return Err(eyre::eyre!(
            "expected {count} invocations for '{name}', found {recorded}"
        ));
    }
    Ok(())
}

#[then("the routing plan has no fallback providers")]
fn plan_has_no_fallbacks(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let task = world
        .last_task
        .ok_or_else(|| eyre::eyre!("no task has been submitted"))?;
    let plan = world
        .orchestrator
        .routing_plan(task)
        .ok_or_else(|| eyre::eyre!("no routing plan recorded"))?;
    if !plan.fallback_chain().is_empty() {
        return Err(eyre::eyre!(
            "expected an empty fallback chain, got {:?}",
            plan.fallback_chain()
        ));
    }
    Ok(())
}

#[then("the task fails because no provider is capable")]
fn task_fails_without_capable_provider(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let result = world.result()?;
    if !matches!(result, Err(OrchestrationError::NoCapableProvider { .. })) {
        return Err(eyre::eyre!("expected no capable provider, got {result:?}"));
    }
    Ok(())
}

#[then(r#"the routing explanation mentions "{text}""#)]
fn explanation_mentions(world: &OrchestrationWorld, text: String) -> Result<(), eyre::Report> {
    let task = world
        .last_task
        .ok_or_else(|| eyre::eyre!("no task has been submitted"))?;
    let rationale = world
        .orchestrator
        .explain_routing(task)
        .map_err(|err| eyre::eyre!("no routing explanation: {err}"))?;
    if !rationale.contains(&text) {
        return Err(eyre::eyre!("expected '{text}' in rationale: {rationale}"));
    }
    Ok(())
}

#[then(r#"provider "{name}" is offered as an alternative"#)]
fn provider_is_alternative(world: &OrchestrationWorld, name: String) -> Result<(), eyre::Report> {
    let result = world
        .result()?
        .as_ref()
        .map_err(|err| eyre::eyre!("expected a result, got {err}"))?;
    if !result
        .alternatives
        .iter()
        .any(|alternative| alternative.provider.as_str() == name)
    {
        return Err(eyre::eyre!(
            "expected '{name}' among alternatives {:?}",
            result.alternatives
        ));
    }
    Ok(())
}

#[then("the result lists {count:usize} attempts")]
fn result_lists_attempts(world: &OrchestrationWorld, count: usize) -> Result<(), eyre::Report> {
    let result = world
        .result()?
        .as_ref()
        .map_err(|err| eyre::eyre!("expected a result, got {err}"))?;
    if result.attempts.len() != count {
        return Err(eyre::eyre!(
            "expected {count} attempts, found {}",
            result.attempts.len()
        ));
    }
    Ok(())
}
