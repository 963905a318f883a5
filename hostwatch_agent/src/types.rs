//! Data types sent to viewers over WebSocket.
//! Keep this module minimal and stable; it defines the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CpuMetrics {
    pub current_load_pct: f64,
    pub per_core_load_pct: Vec<f64>,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub active_bytes: u64,
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    // not clamped: a misreporting sensor may push this outside 0..=100
    pub used_pct: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DiskUsage {
    /// Mount point, or the filesystem name when the mount is unknown.
    pub label: String,
    pub fs: String,
    pub fs_type: String,
    pub mount: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_pct: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DiskIo {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    pub total_read_bytes: u64,
    pub total_write_bytes: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NetworkInterface {
    pub interface: String,
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
    pub rx_bytes_total: u64,
    pub tx_bytes_total: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ProcessEntry {
    pub name: String,
    pub pid: u32,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub command: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GpuController {
    pub vendor: String,
    pub model: String,
    pub vram_mb: Option<u64>,
    pub temperature_c: Option<f64>,
    pub utilization_pct: Option<f64>,
    pub memory_used_mb: Option<u64>,
    pub memory_total_mb: Option<u64>,
}

/// One complete set of readings for a single tick. Built fresh every tick and never mutated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: Vec<DiskUsage>,
    pub disk_io: DiskIo,
    pub network: Vec<NetworkInterface>,
    pub processes: Vec<ProcessEntry>,
    pub gpu: Vec<GpuController>,
}

// ---------- Static system description (queried once at startup) ----------

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CpuIdentity {
    pub manufacturer: String,
    pub brand: String,
    pub cores: usize,
    pub physical_cores: usize,
    pub speed_ghz: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SystemIdentity {
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OsIdentity {
    pub platform: String,
    pub distro: String,
    pub release: String,
    pub arch: String,
    pub hostname: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GraphicsIdentity {
    pub vendor: String,
    pub model: String,
    pub vram_mb: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SystemDescription {
    pub cpu: CpuIdentity,
    pub system: SystemIdentity,
    pub os: OsIdentity,
    pub graphics: Vec<GraphicsIdentity>,
}
