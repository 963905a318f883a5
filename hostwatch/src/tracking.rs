//! Bounded-duration capture of incoming snapshots, reduced to a report on completion.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use crate::stats::{reduce, Statistics};
use crate::types::{DiskUsage, GpuController, MetricsSnapshot, ProcessEntry};

pub const DEFAULT_TRACKING_DURATION: Duration = Duration::from_secs(5 * 60);

/// One captured record, derived from a snapshot while tracking is active.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_pct: f64,
    pub cpu_temp_c: Option<f64>,
    pub mem_pct: f64,
    pub mem_used_bytes: u64,
    pub mem_total_bytes: u64,
    pub net_rx_bytes_per_sec: f64,
    pub net_tx_bytes_per_sec: f64,
    pub disk: Vec<DiskUsage>,
    pub processes: Vec<ProcessEntry>,
    pub gpu: Vec<GpuController>,
}

impl From<&MetricsSnapshot> for TrackedSample {
    fn from(m: &MetricsSnapshot) -> Self {
        Self {
            timestamp: m.timestamp,
            cpu_pct: m.cpu.current_load_pct,
            cpu_temp_c: m.cpu.temperature_c,
            mem_pct: m.memory.used_pct,
            mem_used_bytes: m.memory.used_bytes,
            mem_total_bytes: m.memory.total_bytes,
            net_rx_bytes_per_sec: m.rx_bytes_per_sec(),
            net_tx_bytes_per_sec: m.tx_bytes_per_sec(),
            disk: m.disk.clone(),
            processes: m.processes.clone(),
            gpu: m.gpu.clone(),
        }
    }
}

/// Output of a finished (or stopped) capture.
#[derive(Debug, Clone)]
pub struct TrackingReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub elapsed: Duration,
    /// True when the full duration ran; false for a manual stop or disconnect.
    pub completed: bool,
    pub statistics: Statistics,
    pub samples: Vec<TrackedSample>,
}

impl TrackingReport {
    pub fn last_sample(&self) -> Option<&TrackedSample> {
        self.samples.last()
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Active {
        started: Instant,
        started_at: DateTime<Local>,
        samples: Vec<TrackedSample>,
    },
}

#[derive(Debug)]
pub struct TrackingSession {
    duration: Duration,
    state: State,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKING_DURATION)
    }
}

impl TrackingSession {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: State::Idle,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// Idle -> Active. Returns false (and changes nothing) when already active.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_active() {
            debug!("tracking already active; start ignored");
            return false;
        }
        self.state = State::Active {
            started: now,
            started_at: Local::now(),
            samples: Vec::new(),
        };
        info!("tracking started for {}s", self.duration.as_secs());
        true
    }

    /// Captures the snapshot while active. Returns whether it was recorded.
    pub fn on_snapshot(&mut self, m: &MetricsSnapshot) -> bool {
        match &mut self.state {
            State::Active { samples, .. } => {
                samples.push(TrackedSample::from(m));
                true
            }
            State::Idle => false,
        }
    }

    pub fn captured(&self) -> usize {
        match &self.state {
            State::Active { samples, .. } => samples.len(),
            State::Idle => 0,
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            State::Active { started, .. } => {
                Some(self.duration.saturating_sub(now.saturating_duration_since(*started)))
            }
            State::Idle => None,
        }
    }

    /// Once-per-second check. Finishes the session when the duration has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<TrackingReport> {
        match self.remaining(now) {
            Some(left) if left.is_zero() => self.finish(now, true),
            _ => None,
        }
    }

    /// Ends an active session early. The partial capture is still reduced.
    pub fn stop(&mut self, now: Instant) -> Option<TrackingReport> {
        self.finish(now, false)
    }

    fn finish(&mut self, now: Instant, completed: bool) -> Option<TrackingReport> {
        let State::Active {
            started,
            started_at,
            samples,
        } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return None;
        };
        let statistics = reduce(&samples);
        info!(
            samples = samples.len(),
            completed, "tracking finished"
        );
        Some(TrackingReport {
            started_at,
            finished_at: Local::now(),
            elapsed: now.saturating_duration_since(started),
            completed,
            statistics,
            samples,
        })
    }
}

/// `MM:SS` for the countdown display.
pub fn format_countdown(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
