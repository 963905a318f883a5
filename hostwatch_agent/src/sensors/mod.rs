//! Sensor capability: raw, loosely-shaped host readings.
//!
//! Every query is async, fallible and independent of the others so the sampler can
//! fan them out concurrently. Nothing here normalizes; see `sampler` for that.

mod synthetic;
mod system;

pub use synthetic::SyntheticSensors;
pub use system::SysinfoSensors;

use std::future::Future;

use crate::error::SensorError;

#[derive(Debug, Clone, Default)]
pub struct RawCpuLoad {
    pub current_load: f64,
    pub per_core: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawCpuTemperature {
    pub main: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub active: u64,
    pub available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RawFsUsage {
    pub fs: String,
    pub fs_type: String,
    pub mount: String,
    pub size: u64,
    pub used: u64,
    pub available: u64,
    /// Some platforms report the use percentage directly.
    pub use_pct: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawDiskIo {
    pub read_per_sec: Option<f64>,
    pub write_per_sec: Option<f64>,
    pub total_read: Option<u64>,
    pub total_write: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawNetStats {
    pub iface: String,
    // None until a second reading exists to diff against
    pub rx_sec: Option<f64>,
    pub tx_sec: Option<f64>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RawProcess {
    pub name: String,
    pub pid: u32,
    pub cpu: f64,
    pub mem: f64,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawGpu {
    pub vendor: String,
    pub model: String,
    pub vram_mb: Option<u64>,
    pub temperature_c: Option<f64>,
    pub utilization_pct: Option<f64>,
    pub memory_used_mb: Option<u64>,
    pub memory_total_mb: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawIdentity {
    pub cpu_manufacturer: Option<String>,
    pub cpu_brand: Option<String>,
    pub cores: usize,
    pub physical_cores: Option<usize>,
    pub cpu_speed_mhz: Option<u64>,
    pub system_manufacturer: Option<String>,
    pub system_model: Option<String>,
    pub platform: String,
    pub distro: Option<String>,
    pub release: Option<String>,
    pub arch: String,
    pub hostname: Option<String>,
    pub graphics: Vec<RawGpu>,
}

/// Source of raw host readings.
pub trait SensorSource: Send + Sync + 'static {
    fn cpu_load(&self) -> impl Future<Output = Result<RawCpuLoad, SensorError>> + Send;
    fn cpu_temperature(
        &self,
    ) -> impl Future<Output = Result<RawCpuTemperature, SensorError>> + Send;
    fn memory(&self) -> impl Future<Output = Result<RawMemory, SensorError>> + Send;
    fn fs_usage(&self) -> impl Future<Output = Result<Vec<RawFsUsage>, SensorError>> + Send;
    fn disk_io(&self) -> impl Future<Output = Result<RawDiskIo, SensorError>> + Send;
    fn network_stats(&self)
        -> impl Future<Output = Result<Vec<RawNetStats>, SensorError>> + Send;
    /// Full process list in enumeration order.
    fn processes(&self) -> impl Future<Output = Result<Vec<RawProcess>, SensorError>> + Send;
    fn gpu_controllers(&self) -> impl Future<Output = Result<Vec<RawGpu>, SensorError>> + Send;
    /// Static identity; queried once at startup.
    fn identity(&self) -> impl Future<Output = Result<RawIdentity, SensorError>> + Send;
}
