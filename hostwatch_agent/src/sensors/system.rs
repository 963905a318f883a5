//! Production sensors backed by persistent sysinfo handles.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use once_cell::sync::OnceCell;
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System, UpdateKind,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{
    RawCpuLoad, RawCpuTemperature, RawDiskIo, RawFsUsage, RawGpu, RawIdentity, RawMemory,
    RawNetStats, RawProcess, SensorSource,
};
use crate::error::SensorError;
use crate::gpu::collect_all_gpus;

// Runtime toggles (read once)
fn gpu_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("HOSTWATCH_AGENT_GPU")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}
fn temp_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("HOSTWATCH_AGENT_TEMP")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}

/// Seconds since the previous call; None on the first call.
#[derive(Default)]
struct RateClock {
    last: Option<Instant>,
}

impl RateClock {
    fn lap(&mut self) -> Option<f64> {
        let now = Instant::now();
        let dt = self
            .last
            .map(|t| now.duration_since(t).as_secs_f64().max(1e-3));
        self.last = Some(now);
        dt
    }
}

struct NetState {
    nets: Networks,
    clock: RateClock,
}

#[derive(Default)]
struct DiskIoState {
    clock: RateClock,
}

pub struct SysinfoSensors {
    sys: Mutex<System>,
    networks: Mutex<NetState>,
    disks: Mutex<Disks>,
    components: Mutex<Components>,
    disk_io: Mutex<DiskIoState>,
}

impl SysinfoSensors {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        let mut sys = System::new_with_specifics(refresh_kind);
        sys.refresh_cpu_all();
        sys.refresh_memory();

        // Keep Networks alive across calls so received()/transmitted() deltas work
        let nets = Networks::new_with_refreshed_list();

        Self {
            sys: Mutex::new(sys),
            networks: Mutex::new(NetState {
                nets,
                clock: RateClock::default(),
            }),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            components: Mutex::new(Components::new_with_refreshed_list()),
            disk_io: Mutex::new(DiskIoState::default()),
        }
    }
}

impl Default for SysinfoSensors {
    fn default() -> Self {
        Self::new()
    }
}

// sysinfo occasionally panics on odd /proc or driver states; surface that as a failed query.
fn guarded<T>(query: &'static str, f: impl FnOnce() -> T) -> Result<T, SensorError> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(|e| {
        warn!("sysinfo {query} refresh panicked: {e:?}");
        SensorError::Panicked(query)
    })
}

#[cfg(target_os = "linux")]
fn dmi_field(name: &str) -> Option<String> {
    std::fs::read_to_string(format!("/sys/class/dmi/id/{name}"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(not(target_os = "linux"))]
fn dmi_field(_name: &str) -> Option<String> {
    None
}

fn is_cpu_sensor(label: &str) -> bool {
    let l = label.to_ascii_lowercase();
    l.contains("cpu") || l.contains("package") || l.contains("tctl") || l.contains("tdie")
}

impl SensorSource for SysinfoSensors {
    async fn cpu_load(&self) -> Result<RawCpuLoad, SensorError> {
        let mut sys = self.sys.lock().await;
        guarded("cpu load", || {
            sys.refresh_cpu_usage();
            RawCpuLoad {
                current_load: sys.global_cpu_usage() as f64,
                per_core: sys.cpus().iter().map(|c| c.cpu_usage() as f64).collect(),
            }
        })
    }

    async fn cpu_temperature(&self) -> Result<RawCpuTemperature, SensorError> {
        if !temp_enabled() {
            return Ok(RawCpuTemperature::default());
        }
        let mut components = self.components.lock().await;
        guarded("cpu temperature", || {
            components.refresh(false);
            let main = components
                .iter()
                .filter(|c| is_cpu_sensor(c.label()))
                .filter_map(|c| c.temperature())
                .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(f64::from);
            RawCpuTemperature { main }
        })
    }

    async fn memory(&self) -> Result<RawMemory, SensorError> {
        let mut sys = self.sys.lock().await;
        guarded("memory", || {
            sys.refresh_memory();
            let total = sys.total_memory();
            let available = sys.available_memory();
            RawMemory {
                total,
                used: sys.used_memory(),
                free: sys.free_memory(),
                active: total.saturating_sub(available),
                available,
                swap_total: sys.total_swap(),
                swap_used: sys.used_swap(),
            }
        })
    }

    async fn fs_usage(&self) -> Result<Vec<RawFsUsage>, SensorError> {
        let mut disks = self.disks.lock().await;
        guarded("filesystem", || {
            disks.refresh(true);
            disks
                .iter()
                .map(|d| {
                    let size = d.total_space();
                    let available = d.available_space();
                    RawFsUsage {
                        fs: d.name().to_string_lossy().into_owned(),
                        fs_type: d.file_system().to_string_lossy().into_owned(),
                        mount: d.mount_point().to_string_lossy().into_owned(),
                        size,
                        used: size.saturating_sub(available),
                        available,
                        use_pct: None,
                    }
                })
                .collect()
        })
    }

    async fn disk_io(&self) -> Result<RawDiskIo, SensorError> {
        let mut state = self.disk_io.lock().await;
        let mut sys = self.sys.lock().await;
        guarded("disk io", || {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing().with_disk_usage(),
            );
            let (mut read, mut written, mut total_read, mut total_write) = (0u64, 0u64, 0u64, 0u64);
            for p in sys.processes().values() {
                let du = p.disk_usage();
                read = read.saturating_add(du.read_bytes);
                written = written.saturating_add(du.written_bytes);
                total_read = total_read.saturating_add(du.total_read_bytes);
                total_write = total_write.saturating_add(du.total_written_bytes);
            }
            // first sweep has nothing to diff against
            let dt = state.clock.lap();
            RawDiskIo {
                read_per_sec: dt.map(|dt| read as f64 / dt),
                write_per_sec: dt.map(|dt| written as f64 / dt),
                total_read: Some(total_read),
                total_write: Some(total_write),
            }
        })
    }

    async fn network_stats(&self) -> Result<Vec<RawNetStats>, SensorError> {
        let mut state = self.networks.lock().await;
        guarded("network", || {
            let NetState { nets, clock } = &mut *state;
            nets.refresh(true);
            let dt = clock.lap();
            let mut out: Vec<RawNetStats> = nets
                .iter()
                .map(|(name, data)| RawNetStats {
                    iface: name.clone(),
                    // received()/transmitted() are deltas since the previous refresh
                    rx_sec: dt.map(|dt| data.received() as f64 / dt),
                    tx_sec: dt.map(|dt| data.transmitted() as f64 / dt),
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                })
                .collect();
            out.sort_by(|a, b| a.iface.cmp(&b.iface));
            out
        })
    }

    async fn processes(&self) -> Result<Vec<RawProcess>, SensorError> {
        let mut sys = self.sys.lock().await;
        guarded("process list", || {
            sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing()
                    .with_cpu()
                    .with_memory()
                    .with_cmd(UpdateKind::OnlyIfNotSet),
            );
            let cores = sys.cpus().len().max(1) as f64;
            let total_mem = sys.total_memory().max(1) as f64;
            let mut list: Vec<RawProcess> = sys
                .processes()
                .values()
                .map(|p| {
                    let cmd = p
                        .cmd()
                        .iter()
                        .map(|s| s.to_string_lossy())
                        .collect::<Vec<_>>()
                        .join(" ");
                    RawProcess {
                        name: p.name().to_string_lossy().into_owned(),
                        pid: p.pid().as_u32(),
                        // sysinfo reports per-core percent; scale to whole-machine share
                        cpu: p.cpu_usage() as f64 / cores,
                        mem: p.memory() as f64 / total_mem * 100.0,
                        command: (!cmd.is_empty()).then_some(cmd),
                    }
                })
                .collect();
            // the process table is a hash map; pid order is our enumeration order
            list.sort_by_key(|p| p.pid);
            list
        })
    }

    async fn gpu_controllers(&self) -> Result<Vec<RawGpu>, SensorError> {
        if !gpu_enabled() {
            return Ok(Vec::new());
        }
        // No adapter is not a failure: the host simply has no GPU to report.
        match collect_all_gpus() {
            Ok(v) => Ok(v),
            Err(e) => {
                debug!("gpu probe found nothing: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn identity(&self) -> Result<RawIdentity, SensorError> {
        let graphics = self.gpu_controllers().await?;
        let sys = self.sys.lock().await;
        let first = sys.cpus().first();
        let hostname = hostname::get()
            .ok()
            .and_then(|s| s.into_string().ok())
            .or_else(System::host_name);

        Ok(RawIdentity {
            cpu_manufacturer: first.map(|c| c.vendor_id().to_string()),
            cpu_brand: first.map(|c| c.brand().trim().to_string()),
            cores: sys.cpus().len(),
            physical_cores: System::physical_core_count(),
            cpu_speed_mhz: first.map(|c| c.frequency()),
            system_manufacturer: dmi_field("sys_vendor"),
            system_model: dmi_field("product_name"),
            platform: std::env::consts::OS.to_string(),
            distro: System::name(),
            release: System::os_version(),
            arch: std::env::consts::ARCH.to_string(),
            hostname,
            graphics,
        })
    }
}
