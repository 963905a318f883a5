//! Snapshot sampler: fans out all sensor queries for one tick and normalizes the raw
//! readings into a `MetricsSnapshot`.
//!
//! A short-lived cache lets viewers that tick within the same instant share one sweep.
//! Nothing depends on that sharing; a zero TTL turns it off.

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, error};

use crate::error::SensorError;
use crate::sensors::{
    RawCpuLoad, RawCpuTemperature, RawDiskIo, RawFsUsage, RawGpu, RawIdentity, RawMemory,
    RawNetStats, RawProcess, SensorSource,
};
use crate::types::{
    CpuIdentity, CpuMetrics, DiskIo, DiskUsage, GpuController, GraphicsIdentity, MemoryMetrics,
    MetricsSnapshot, NetworkInterface, OsIdentity, ProcessEntry, SystemDescription,
    SystemIdentity,
};

pub const TOP_PROCESSES: usize = 10;
pub const COMMAND_MAX_CHARS: usize = 50;

struct CachedSnapshot {
    at: Instant,
    value: MetricsSnapshot,
}

impl CachedSnapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.at.elapsed() < ttl
    }
}

pub struct Sampler<S> {
    sensors: S,
    ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl<S: SensorSource> Sampler<S> {
    pub fn new(sensors: S, ttl: Duration) -> Self {
        Self {
            sensors,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    /// One snapshot for the current tick. Fails if any sensor query fails.
    pub async fn sample(&self) -> Result<MetricsSnapshot, SensorError> {
        if self.ttl.is_zero() {
            return self.sweep().await;
        }
        let mut cache = self.cache.lock().await;
        if let Some(c) = cache.as_ref().filter(|c| c.is_fresh(self.ttl)) {
            debug!("serving cached snapshot");
            return Ok(c.value.clone());
        }
        let value = self.sweep().await?;
        *cache = Some(CachedSnapshot {
            at: Instant::now(),
            value: value.clone(),
        });
        Ok(value)
    }

    async fn sweep(&self) -> Result<MetricsSnapshot, SensorError> {
        let s = &self.sensors;
        let (cpu, temp, mem, fs, io, nets, procs, gpus) = tokio::try_join!(
            s.cpu_load(),
            s.cpu_temperature(),
            s.memory(),
            s.fs_usage(),
            s.disk_io(),
            s.network_stats(),
            s.processes(),
            s.gpu_controllers(),
        )?;

        Ok(MetricsSnapshot {
            timestamp: Utc::now(),
            cpu: normalize_cpu(cpu, temp),
            memory: normalize_memory(mem),
            disk: normalize_disks(fs),
            disk_io: normalize_disk_io(io),
            network: select_networks(nets),
            processes: top_processes(procs),
            gpu: normalize_gpus(gpus),
        })
    }

    /// Query the static identity once. A failure leaves an empty description.
    pub async fn describe_system(&self) -> SystemDescription {
        match self.sensors.identity().await {
            Ok(raw) => describe_system(raw),
            Err(e) => {
                error!("error getting system info: {e}");
                SystemDescription::default()
            }
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// Sensors report "no reading" as zero as often as they omit it.
fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|t| *t > 0.0)
}

fn present_u64(v: Option<u64>) -> Option<u64> {
    v.filter(|t| *t > 0)
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn normalize_cpu(load: RawCpuLoad, temp: RawCpuTemperature) -> CpuMetrics {
    CpuMetrics {
        current_load_pct: round1(load.current_load),
        per_core_load_pct: load.per_core.into_iter().map(round1).collect(),
        temperature_c: present(temp.main),
    }
}

pub fn normalize_memory(mem: RawMemory) -> MemoryMetrics {
    MemoryMetrics {
        total_bytes: mem.total,
        used_bytes: mem.used,
        free_bytes: mem.free,
        active_bytes: mem.active,
        available_bytes: mem.available,
        swap_total_bytes: mem.swap_total,
        swap_used_bytes: mem.swap_used,
        used_pct: round1(pct(mem.used, mem.total)),
    }
}

pub fn normalize_disks(fs: Vec<RawFsUsage>) -> Vec<DiskUsage> {
    fs.into_iter()
        .map(|d| DiskUsage {
            label: if d.mount.is_empty() {
                d.fs.clone()
            } else {
                d.mount.clone()
            },
            used_pct: round1(d.use_pct.unwrap_or_else(|| pct(d.used, d.size))),
            fs: d.fs,
            fs_type: d.fs_type,
            mount: d.mount,
            size_bytes: d.size,
            used_bytes: d.used,
            available_bytes: d.available,
        })
        .collect()
}

pub fn normalize_disk_io(io: RawDiskIo) -> DiskIo {
    DiskIo {
        read_bytes_per_sec: io.read_per_sec.unwrap_or(0.0),
        write_bytes_per_sec: io.write_per_sec.unwrap_or(0.0),
        total_read_bytes: io.total_read.unwrap_or(0),
        total_write_bytes: io.total_write.unwrap_or(0),
    }
}

fn is_loopback(iface: &str) -> bool {
    matches!(iface, "lo" | "lo0")
}

/// Drop the loopback device and interfaces that are idle and have never moved a byte.
pub fn select_networks(nets: Vec<RawNetStats>) -> Vec<NetworkInterface> {
    nets.into_iter()
        .filter(|n| !is_loopback(&n.iface))
        .filter(|n| {
            n.rx_sec.unwrap_or(0.0) > 0.0 || n.tx_sec.unwrap_or(0.0) > 0.0 || n.rx_bytes > 0
        })
        .map(|n| NetworkInterface {
            interface: n.iface,
            rx_bytes_per_sec: n.rx_sec.unwrap_or(0.0),
            tx_bytes_per_sec: n.tx_sec.unwrap_or(0.0),
            rx_bytes_total: n.rx_bytes,
            tx_bytes_total: n.tx_bytes,
        })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Top processes by CPU, descending. The sort is stable so ties keep enumeration order.
pub fn top_processes(mut procs: Vec<RawProcess>) -> Vec<ProcessEntry> {
    procs.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
    procs.truncate(TOP_PROCESSES);
    procs
        .into_iter()
        .map(|p| ProcessEntry {
            name: p.name,
            pid: p.pid,
            cpu_pct: round1(p.cpu),
            mem_pct: round1(p.mem),
            command: p
                .command
                .as_deref()
                .map(|c| truncate_chars(c, COMMAND_MAX_CHARS))
                .unwrap_or_default(),
        })
        .collect()
}

pub fn normalize_gpus(gpus: Vec<RawGpu>) -> Vec<GpuController> {
    gpus.into_iter()
        .map(|g| GpuController {
            vendor: g.vendor,
            model: g.model,
            vram_mb: present_u64(g.vram_mb),
            temperature_c: present(g.temperature_c),
            utilization_pct: present(g.utilization_pct),
            memory_used_mb: present_u64(g.memory_used_mb),
            memory_total_mb: present_u64(g.memory_total_mb),
        })
        .collect()
}

pub fn describe_system(raw: RawIdentity) -> SystemDescription {
    SystemDescription {
        cpu: CpuIdentity {
            manufacturer: raw.cpu_manufacturer.unwrap_or_default(),
            brand: raw.cpu_brand.unwrap_or_default(),
            cores: raw.cores,
            physical_cores: raw.physical_cores.unwrap_or(raw.cores),
            speed_ghz: raw
                .cpu_speed_mhz
                .map(|mhz| round1(mhz as f64 / 1000.0))
                .unwrap_or(0.0),
        },
        system: SystemIdentity {
            manufacturer: raw.system_manufacturer.unwrap_or_default(),
            model: raw.system_model.unwrap_or_default(),
        },
        os: OsIdentity {
            platform: raw.platform,
            distro: raw.distro.unwrap_or_default(),
            release: raw.release.unwrap_or_default(),
            arch: raw.arch,
            hostname: raw.hostname.unwrap_or_default(),
        },
        graphics: raw
            .graphics
            .into_iter()
            .map(|g| GraphicsIdentity {
                vendor: g.vendor,
                model: g.model,
                vram_mb: present_u64(g.vram_mb),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SyntheticSensors;

    fn net(iface: &str, rx: f64, tx: f64, rx_total: u64) -> RawNetStats {
        RawNetStats {
            iface: iface.into(),
            rx_sec: Some(rx),
            tx_sec: Some(tx),
            rx_bytes: rx_total,
            tx_bytes: 0,
        }
    }

    #[test]
    fn drops_loopback_and_idle_interfaces() {
        let kept = select_networks(vec![
            net("lo", 100.0, 100.0, 1_000),
            net("eth0", 0.0, 0.0, 0),
            net("eth0", 5.0, 0.0, 500),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].interface, "eth0");
        assert_eq!(kept[0].rx_bytes_per_sec, 5.0);
        assert_eq!(kept[0].rx_bytes_total, 500);
    }

    #[test]
    fn keeps_idle_interface_with_history() {
        let kept = select_networks(vec![net("wlan0", 0.0, 0.0, 42), net("lo0", 1.0, 1.0, 1)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].interface, "wlan0");
    }

    #[test]
    fn first_reading_without_rates_counts_as_zero() {
        let kept = select_networks(vec![RawNetStats {
            iface: "eth1".into(),
            rx_sec: None,
            tx_sec: None,
            rx_bytes: 0,
            tx_bytes: 0,
        }]);
        assert!(kept.is_empty());
    }

    #[test]
    fn top_ten_by_cpu_with_truncated_command() {
        let long_cmd = "x".repeat(80);
        let procs: Vec<RawProcess> = (0..15u32)
            .map(|i| RawProcess {
                name: format!("p{i}"),
                pid: 100 + i,
                cpu: i as f64 * 2.5,
                mem: 1.0,
                command: Some(long_cmd.clone()),
            })
            .collect();
        let top = top_processes(procs);
        assert_eq!(top.len(), TOP_PROCESSES);
        let pids: Vec<u32> = top.iter().map(|p| p.pid).collect();
        assert_eq!(pids, (105..=114u32).rev().collect::<Vec<_>>());
        assert!(top.windows(2).all(|w| w[0].cpu_pct >= w[1].cpu_pct));
        for p in &top {
            assert_eq!(p.command.chars().count(), COMMAND_MAX_CHARS);
            assert_eq!(p.name, format!("p{}", p.pid - 100));
            assert_eq!(p.mem_pct, 1.0);
        }
    }

    #[test]
    fn cpu_ties_keep_enumeration_order() {
        let procs = vec![
            RawProcess { name: "a".into(), pid: 3, cpu: 5.0, ..Default::default() },
            RawProcess { name: "b".into(), pid: 1, cpu: 9.0, ..Default::default() },
            RawProcess { name: "c".into(), pid: 2, cpu: 5.0, ..Default::default() },
        ];
        let names: Vec<String> = top_processes(procs).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn missing_command_becomes_empty() {
        let top = top_processes(vec![RawProcess {
            name: "kthreadd".into(),
            pid: 2,
            ..Default::default()
        }]);
        assert_eq!(top[0].command, "");
    }

    #[test]
    fn memory_percent_is_not_clamped() {
        let m = normalize_memory(RawMemory {
            total: 100,
            used: 150,
            ..Default::default()
        });
        assert_eq!(m.used_pct, 150.0);
        let empty = normalize_memory(RawMemory::default());
        assert_eq!(empty.used_pct, 0.0);
    }

    #[test]
    fn disk_label_falls_back_to_fs() {
        let disks = normalize_disks(vec![
            RawFsUsage {
                fs: "/dev/sda1".into(),
                mount: "/boot".into(),
                size: 1000,
                used: 250,
                available: 750,
                ..Default::default()
            },
            RawFsUsage {
                fs: "overlay".into(),
                size: 10,
                used: 1,
                available: 9,
                use_pct: Some(12.34),
                ..Default::default()
            },
        ]);
        assert_eq!(disks[0].label, "/boot");
        assert_eq!(disks[0].used_pct, 25.0);
        assert_eq!(disks[1].label, "overlay");
        assert_eq!(disks[1].used_pct, 12.3);
    }

    #[test]
    fn zero_temperature_means_no_reading() {
        let cpu = normalize_cpu(
            RawCpuLoad {
                current_load: 12.345,
                per_core: vec![1.04, 99.96],
            },
            RawCpuTemperature { main: Some(0.0) },
        );
        assert_eq!(cpu.temperature_c, None);
        assert_eq!(cpu.current_load_pct, 12.3);
        assert_eq!(cpu.per_core_load_pct, vec![1.0, 100.0]);
    }

    #[test]
    fn gpu_zero_readings_become_absent() {
        let g = normalize_gpus(vec![RawGpu {
            vendor: "ACME".into(),
            model: "X1".into(),
            vram_mb: Some(0),
            temperature_c: Some(0.0),
            utilization_pct: Some(33.0),
            ..Default::default()
        }]);
        assert_eq!(g[0].vram_mb, None);
        assert_eq!(g[0].temperature_c, None);
        assert_eq!(g[0].utilization_pct, Some(33.0));
    }

    #[tokio::test]
    async fn sweep_builds_normalized_snapshot() {
        let sampler = Sampler::new(SyntheticSensors::new(), Duration::ZERO);
        let snap = sampler.sample().await.expect("snapshot");
        assert!(snap.network.iter().all(|n| n.interface != "lo"));
        assert_eq!(snap.processes.len(), TOP_PROCESSES);
        assert_eq!(snap.disk.len(), 2);
        assert_eq!(snap.disk[1].label, "tmpfs");
        assert!(snap.cpu.temperature_c.is_some());
        assert_eq!(sampler.sensors().sweeps(), 1);
    }

    #[tokio::test]
    async fn any_failed_query_fails_the_tick() {
        let sampler = Sampler::new(SyntheticSensors::new(), Duration::ZERO);
        sampler.sensors().set_failing(true);
        let err = sampler.sample().await.unwrap_err();
        assert!(err.to_string().contains("cpu load"));
        sampler.sensors().set_failing(false);
        assert!(sampler.sample().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cache_shares_a_sweep_within_ttl() {
        let sampler = Sampler::new(SyntheticSensors::new(), Duration::from_millis(500));
        let a = sampler.sample().await.unwrap();
        let b = sampler.sample().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(sampler.sensors().sweeps(), 1);
        tokio::time::advance(Duration::from_millis(600)).await;
        sampler.sample().await.unwrap();
        assert_eq!(sampler.sensors().sweeps(), 2);
    }

    #[tokio::test]
    async fn describe_system_maps_identity() {
        let sampler = Sampler::new(SyntheticSensors::new(), Duration::ZERO);
        let info = sampler.describe_system().await;
        assert_eq!(info.os.hostname, "demo-host");
        assert_eq!(info.cpu.physical_cores, 2);
        assert_eq!(info.cpu.speed_ghz, 3.2);
        assert_eq!(info.graphics.len(), 1);
    }
}
