//! Types that mirror the agent's JSON schema.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CpuMetrics {
    pub current_load_pct: f64,
    pub per_core_load_pct: Vec<f64>,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub active_bytes: u64,
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub used_pct: f64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DiskUsage {
    pub label: String,
    pub fs: String,
    pub fs_type: String,
    pub mount: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_pct: f64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DiskIo {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    pub total_read_bytes: u64,
    pub total_write_bytes: u64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NetworkInterface {
    pub interface: String,
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
    pub rx_bytes_total: u64,
    pub tx_bytes_total: u64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProcessEntry {
    pub name: String,
    pub pid: u32,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub command: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GpuController {
    pub vendor: String,
    pub model: String,
    pub vram_mb: Option<u64>,
    pub temperature_c: Option<f64>,
    pub utilization_pct: Option<f64>,
    pub memory_used_mb: Option<u64>,
    pub memory_total_mb: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cpu: CpuMetrics,
    #[serde(default)]
    pub memory: MemoryMetrics,
    #[serde(default)]
    pub disk: Vec<DiskUsage>,
    #[serde(default)]
    pub disk_io: DiskIo,
    #[serde(default)]
    pub network: Vec<NetworkInterface>,
    #[serde(default)]
    pub processes: Vec<ProcessEntry>,
    #[serde(default)]
    pub gpu: Vec<GpuController>,
}

impl MetricsSnapshot {
    /// Download rate summed over every reported interface.
    pub fn rx_bytes_per_sec(&self) -> f64 {
        self.network.iter().map(|n| n.rx_bytes_per_sec).sum()
    }

    pub fn tx_bytes_per_sec(&self) -> f64 {
        self.network.iter().map(|n| n.tx_bytes_per_sec).sum()
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CpuIdentity {
    pub manufacturer: String,
    pub brand: String,
    pub cores: usize,
    pub physical_cores: usize,
    pub speed_ghz: f64,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SystemIdentity {
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct OsIdentity {
    pub platform: String,
    pub distro: String,
    pub release: String,
    pub arch: String,
    pub hostname: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GraphicsIdentity {
    pub vendor: String,
    pub model: String,
    pub vram_mb: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SystemDescription {
    pub cpu: CpuIdentity,
    pub system: SystemIdentity,
    pub os: OsIdentity,
    pub graphics: Vec<GraphicsIdentity>,
}

/// Events pushed by the agent, framed as `{"event": ..., "data": ...}`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    SystemInfo(SystemDescription),
    Metrics(Box<MetricsSnapshot>),
    MetricsError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_metrics_event_with_missing_sections() {
        let json = r#"{"event":"metrics","data":{"timestamp":"2024-05-01T10:00:00Z",
            "cpu":{"current_load_pct":12.5,"per_core_load_pct":[10.0,15.0],"temperature_c":null},
            "network":[{"interface":"eth0","rx_bytes_per_sec":100.0,"tx_bytes_per_sec":50.0,
                        "rx_bytes_total":1,"tx_bytes_total":2},
                       {"interface":"wlan0","rx_bytes_per_sec":20.0,"tx_bytes_per_sec":5.0,
                        "rx_bytes_total":1,"tx_bytes_total":2}]}}"#;
        let ev: ServerEvent = serde_json::from_str(json).unwrap();
        let ServerEvent::Metrics(m) = ev else {
            panic!("expected metrics");
        };
        assert_eq!(m.cpu.per_core_load_pct.len(), 2);
        assert!(m.cpu.temperature_c.is_none());
        assert!(m.disk.is_empty());
        assert_eq!(m.rx_bytes_per_sec(), 120.0);
        assert_eq!(m.tx_bytes_per_sec(), 55.0);
    }

    #[test]
    fn decodes_error_and_system_info() {
        let ev: ServerEvent =
            serde_json::from_str(r#"{"event":"metrics_error","data":{"message":"boom"}}"#).unwrap();
        assert_eq!(ev, ServerEvent::MetricsError { message: "boom".into() });

        let ev: ServerEvent = serde_json::from_str(
            r#"{"event":"system_info","data":{"os":{"hostname":"box","distro":"Debian"}}}"#,
        )
        .unwrap();
        match ev {
            ServerEvent::SystemInfo(d) => {
                assert_eq!(d.os.hostname, "box");
                assert!(d.graphics.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
