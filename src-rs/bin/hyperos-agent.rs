use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use hyperos_agent_rs::api::AgentServer;
use hyperos_agent_rs::helpers::build_controller;
use hyperos_agent_rs::{logging, AgentConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = AgentConfig::from_env().context("invalid configuration")?;
    let addr = config.bind_addr()?;
    let controller = build_controller(&config).context("failed to initialise agent")?;
    info!(
        max_steps = config.max_steps,
        settle_delay_ms = config.settle_delay.as_millis() as u64,
        zones = config.safety_zones.len(),
        "agent initialised"
    );

    let server = AgentServer::new(addr, Arc::new(controller));
    server.start().await
}
