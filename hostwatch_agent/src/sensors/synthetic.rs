//! Deterministic sensors for `--demo` runs and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{
    RawCpuLoad, RawCpuTemperature, RawDiskIo, RawFsUsage, RawGpu, RawIdentity, RawMemory,
    RawNetStats, RawProcess, SensorSource,
};
use crate::error::SensorError;

const GIB: u64 = 1024 * 1024 * 1024;

/// Produces a slowly moving, fully deterministic host. Each `cpu_load` call
/// counts as one sweep and advances the phase.
#[derive(Debug, Default)]
pub struct SyntheticSensors {
    sweeps: AtomicU64,
    failing: AtomicBool,
}

impl SyntheticSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sweeps (cpu load queries) served so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }

    /// While set, the cpu load query fails and so does every sweep.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn phase(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }
}

impl SensorSource for SyntheticSensors {
    async fn cpu_load(&self) -> Result<RawCpuLoad, SensorError> {
        let n = self.sweeps.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(SensorError::query("cpu load", "synthetic failure"));
        }
        let load = (n * 7 % 100) as f64;
        Ok(RawCpuLoad {
            current_load: load,
            per_core: (0..4).map(|i| ((n * 7 + i * 13) % 100) as f64).collect(),
        })
    }

    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError> {
        Ok(RawCpuTemperature {
            main: Some(45.0 + (self.phase() % 10) as f64),
        })
    }

    async fn memory(&self) -> Result<RawMemory, SensorError> {
        let total = 16 * GIB;
        let used = 6 * GIB + (self.phase() % 8) * (GIB / 4);
        Ok(RawMemory {
            total,
            used,
            free: total - used,
            active: used,
            available: total - used,
            swap_total: 2 * GIB,
            swap_used: GIB / 8,
        })
    }

    async fn fs_usage(&self) -> Result<Vec<RawFsUsage>, SensorError> {
        Ok(vec![
            RawFsUsage {
                fs: "/dev/nvme0n1p2".into(),
                fs_type: "ext4".into(),
                mount: "/".into(),
                size: 512 * GIB,
                used: 200 * GIB,
                available: 312 * GIB,
                use_pct: None,
            },
            RawFsUsage {
                fs: "tmpfs".into(),
                fs_type: "tmpfs".into(),
                mount: String::new(),
                size: 0,
                used: 0,
                available: 0,
                use_pct: None,
            },
        ])
    }

    async fn disk_io(&self) -> Result<RawDiskIo, SensorError> {
        let p = self.phase();
        Ok(RawDiskIo {
            read_per_sec: Some((p % 5) as f64 * 1024.0 * 64.0),
            write_per_sec: Some((p % 3) as f64 * 1024.0 * 32.0),
            total_read: Some(p * 1024 * 64),
            total_write: Some(p * 1024 * 32),
        })
    }

    async fn network_stats(&self) -> Result<Vec<RawNetStats>, SensorError> {
        let p = self.phase();
        Ok(vec![
            RawNetStats {
                iface: "lo".into(),
                rx_sec: Some(512.0),
                tx_sec: Some(512.0),
                rx_bytes: p * 512,
                tx_bytes: p * 512,
            },
            RawNetStats {
                iface: "eth0".into(),
                rx_sec: Some(((p % 10) * 20_000) as f64),
                tx_sec: Some(((p % 4) * 5_000) as f64),
                rx_bytes: p * 100_000,
                tx_bytes: p * 10_000,
            },
        ])
    }

    async fn processes(&self) -> Result<Vec<RawProcess>, SensorError> {
        let p = self.phase();
        Ok((1..=12u32)
            .map(|i| RawProcess {
                name: format!("worker-{i}"),
                pid: 1000 + i,
                cpu: ((p + i as u64 * 3) % 40) as f64 / 2.0,
                mem: i as f64 * 0.7,
                command: Some(format!("/usr/bin/worker-{i} --serve --threads {i}")),
            })
            .collect())
    }

    async fn gpu_controllers(&self) -> Result<Vec<RawGpu>, SensorError> {
        Ok(vec![RawGpu {
            vendor: "Synthetic".into(),
            model: "Demo Adapter".into(),
            vram_mb: Some(8192),
            temperature_c: Some(52.0),
            utilization_pct: Some((self.phase() % 100) as f64),
            memory_used_mb: Some(1024),
            memory_total_mb: Some(8192),
        }])
    }

    async fn identity(&self) -> Result<RawIdentity, SensorError> {
        Ok(RawIdentity {
            cpu_manufacturer: Some("GenuineDemo".into()),
            cpu_brand: Some("Demo CPU @ 3.20GHz".into()),
            cores: 4,
            physical_cores: Some(2),
            cpu_speed_mhz: Some(3200),
            system_manufacturer: Some("hostwatch".into()),
            system_model: Some("Demo Host".into()),
            platform: "linux".into(),
            distro: Some("Demo Linux".into()),
            release: Some("1.0".into()),
            arch: "x86_64".into(),
            hostname: Some("demo-host".into()),
            graphics: self.gpu_controllers().await?,
        })
    }
}
