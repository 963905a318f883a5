//! Fixed-length history buffers backing the live charts.

use std::collections::VecDeque;

use chrono::{DateTime, Duration as ChronoDuration, Local};

use crate::types::{DiskUsage, MetricsSnapshot};

/// Points kept per chart channel.
pub const WINDOW_LEN: usize = 60;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

/// Sliding window that always holds exactly `capacity` entries, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T> RollingWindow<T> {
    pub fn from_fn(cap: usize, f: impl FnMut(usize) -> T) -> Self {
        let buf: VecDeque<T> = (0..cap).map(f).collect();
        Self { buf, cap }
    }

    pub fn push(&mut self, v: T) {
        push_capped(&mut self.buf, v, self.cap);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.buf.iter()
    }
}

impl<T: Clone> RollingWindow<T> {
    pub fn filled(cap: usize, fill: T) -> Self {
        Self::from_fn(cap, |_| fill.clone())
    }
}

impl RollingWindow<f64> {
    pub fn max(&self) -> f64 {
        self.buf.iter().copied().fold(0.0, f64::max)
    }

    /// Integer points for ratatui sparklines. Negative or NaN values draw as zero.
    pub fn to_points(&self, scale: f64) -> Vec<u64> {
        self.buf
            .iter()
            .map(|v| {
                let p = (v * scale).round();
                if p.is_finite() && p > 0.0 {
                    p as u64
                } else {
                    0
                }
            })
            .collect()
    }
}

pub fn format_label(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Live chart channels plus the shared time-label sequence.
#[derive(Debug, Clone)]
pub struct LiveCharts {
    pub labels: RollingWindow<String>,
    pub cpu: RollingWindow<f64>,
    pub memory: RollingWindow<f64>,
    pub net_rx: RollingWindow<f64>,
    pub net_tx: RollingWindow<f64>,
}

impl LiveCharts {
    /// Zero-filled channels with labels counting back from `now` one second apart.
    pub fn new(now: DateTime<Local>) -> Self {
        let labels = RollingWindow::from_fn(WINDOW_LEN, |i| {
            let back = (WINDOW_LEN - 1 - i) as i64;
            format_label(now - ChronoDuration::seconds(back))
        });
        Self {
            labels,
            cpu: RollingWindow::filled(WINDOW_LEN, 0.0),
            memory: RollingWindow::filled(WINDOW_LEN, 0.0),
            net_rx: RollingWindow::filled(WINDOW_LEN, 0.0),
            net_tx: RollingWindow::filled(WINDOW_LEN, 0.0),
        }
    }

    /// Called once per received snapshot, in arrival order.
    pub fn push(&mut self, m: &MetricsSnapshot, label: String) {
        self.labels.push(label);
        self.cpu.push(m.cpu.current_load_pct);
        self.memory.push(m.memory.used_pct);
        self.net_rx.push(m.rx_bytes_per_sec());
        self.net_tx.push(m.tx_bytes_per_sec());
    }
}

/// Per-core history; resets when the core count changes.
pub struct PerCoreHistory {
    pub deques: Vec<VecDeque<u16>>,
    cap: usize,
}

impl PerCoreHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            deques: Vec::new(),
            cap,
        }
    }

    pub fn ensure_cores(&mut self, n: usize) {
        if self.deques.len() == n {
            return;
        }
        self.deques = (0..n).map(|_| VecDeque::with_capacity(self.cap)).collect();
    }

    pub fn push_samples(&mut self, samples: &[f64]) {
        self.ensure_cores(samples.len());
        for (i, v) in samples.iter().enumerate() {
            let val = v.clamp(0.0, 100.0).round() as u16;
            push_capped(&mut self.deques[i], val, self.cap);
        }
    }
}

/// Latest disk usage. Replaced wholesale, never windowed.
#[derive(Debug, Default)]
pub struct DiskPanel {
    volumes: Vec<DiskUsage>,
    rebuild: bool,
}

impl DiskPanel {
    pub fn update(&mut self, disks: &[DiskUsage]) {
        if disks.is_empty() {
            return;
        }
        let volumes: Vec<DiskUsage> = disks.iter().filter(|d| d.size_bytes > 0).cloned().collect();
        if volumes.len() != self.volumes.len() {
            self.rebuild = true;
        }
        self.volumes = volumes;
    }

    pub fn volumes(&self) -> &[DiskUsage] {
        &self.volumes
    }

    pub fn needs_rebuild(&self) -> bool {
        self.rebuild
    }

    /// Reports and clears the rebuild flag.
    pub fn take_rebuild(&mut self) -> bool {
        std::mem::take(&mut self.rebuild)
    }
}
