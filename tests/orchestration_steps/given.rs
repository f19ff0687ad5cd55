//! Given steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, capability_list, provider_id, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use serde_json::json;
use switchyard::connector::ports::ConnectorError;
use switchyard::provider::domain::{ConnectionConfig, TransportKind};

fn register(
    world: &mut OrchestrationWorld,
    name: &str,
    capabilities: &str,
) -> Result<(), eyre::Report> {
    let id = provider_id(name)?;
    let declared = capability_list(capabilities)?;
    let connector = world.factory.scripted(&id);
    connector.set_capabilities(Some(declared.clone()));
    let config = ConnectionConfig::message_rpc(name)
        .map_err(|err| eyre::eyre!("invalid connection config: {err}"))?;
    run_async(world.orchestrator.register_provider(
        id,
        TransportKind::MessageRpc,
        config,
        declared,
    ))
    .wrap_err("register provider for scenario")?;
    world.connectors.insert(name.to_owned(), connector);
    Ok(())
}

#[given(r#"a provider "{name}" offering "{capabilities}""#)]
fn a_provider_offering(
    world: &mut OrchestrationWorld,
    name: String,
    capabilities: String,
) -> Result<(), eyre::Report> {
    register(world, &name, &capabilities)
}

#[given(r#"a provider "{name}" answering "{reply}" for "{capabilities}""#)]
fn a_provider_answering(
    world: &mut OrchestrationWorld,
    name: String,
    reply: String,
    capabilities: String,
) -> Result<(), eyre::Report> {
    register(world, &name, &capabilities)?;
    world.connector(&name)?.set_reply(json!(reply));
    Ok(())
}

#[given(r#"provider "{name}" has lost its connection"#)]
fn provider_lost_connection(
    world: &mut OrchestrationWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let id = provider_id(&name)?;
    run_async(
        world
            .orchestrator
            .monitor()
            .report_connection_failure(&id, "socket closed"),
    )
    .map_err(|err| eyre::eyre!("failed to record connection loss: {err}"))?;
    Ok(())
}

#[given(r#"provider "{name}" fails every invocation"#)]
fn provider_fails_every_invocation(
    world: &mut OrchestrationWorld,
    name: String,
) -> Result<(), eyre::Report> {
    world
        .connector(&name)?
        .set_failure(ConnectorError::Provider("model crashed".to_owned()));
    Ok(())
}
