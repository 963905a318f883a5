//! Command line and environment configuration for the agent.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "hostwatch_agent",
    version,
    about = "Samples host resources and pushes them to viewers over WebSocket"
)]
pub struct AgentConfig {
    /// Port for the WebSocket endpoint (`/ws`)
    #[arg(short, long, env = "HOSTWATCH_AGENT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "HOSTWATCH_AGENT_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Push period per viewer, in milliseconds
    #[arg(
        long,
        env = "HOSTWATCH_AGENT_TICK_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_ms: u64,

    /// How long a snapshot may be shared between viewers, in milliseconds (0 disables)
    #[arg(long, env = "HOSTWATCH_AGENT_SNAPSHOT_TTL_MS", default_value_t = 500)]
    pub snapshot_ttl_ms: u64,

    /// Serve synthetic readings instead of querying the host
    #[arg(long)]
    pub demo: bool,
}

impl AgentConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    // never let one sweep outlive the tick it was taken for
    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_millis(self.snapshot_ttl_ms.min(self.tick_ms.saturating_sub(1)))
    }
}
