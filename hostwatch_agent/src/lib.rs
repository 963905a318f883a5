//! hostwatch agent: samples host resources once per tick and pushes them to every
//! connected viewer over WebSocket.

pub mod broadcast;
pub mod config;
pub mod error;
mod gpu;
pub mod proto;
pub mod sampler;
pub mod sensors;
pub mod state;
pub mod types;
pub mod ws;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::broadcast::Broadcaster;
use crate::config::AgentConfig;
use crate::sampler::Sampler;
use crate::sensors::SensorSource;
use crate::state::AppState;

pub fn router<S: SensorSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler::<S>))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

/// Build the shared state: the system description is queried exactly once, here.
pub async fn build_state<S: SensorSource>(sensors: S, cfg: &AgentConfig) -> AppState<S> {
    let sampler = Arc::new(Sampler::new(sensors, cfg.snapshot_ttl()));
    let system = sampler.describe_system().await;
    info!(
        "system: {} {} / {} {}",
        system.system.manufacturer, system.system.model, system.os.distro, system.os.release
    );
    AppState::new(Broadcaster::new(sampler, system, cfg.tick()))
}

pub async fn serve<S: SensorSource>(listener: TcpListener, state: AppState<S>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
