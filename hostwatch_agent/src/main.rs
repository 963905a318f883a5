//! hostwatch_agent binary: parse config, describe the host once, serve `/ws`.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hostwatch_agent::config::AgentConfig;
use hostwatch_agent::sensors::{SensorSource, SyntheticSensors, SysinfoSensors};
use hostwatch_agent::{build_state, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cfg = AgentConfig::parse();
    if cfg.demo {
        info!("demo mode: serving synthetic readings");
        run(SyntheticSensors::new(), cfg).await
    } else {
        run(SysinfoSensors::new(), cfg).await
    }
}

async fn run<S: SensorSource>(sensors: S, cfg: AgentConfig) -> anyhow::Result<()> {
    let state = build_state(sensors, &cfg).await;

    let addr = cfg.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("hostwatch agent listening on ws://{}/ws", listener.local_addr()?);

    serve(listener, state).await.context("server stopped")
}
