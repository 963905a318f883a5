//! Summary statistics over a tracking capture.

use crate::tracking::TrackedSample;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub cpu: ChannelStats,
    pub cpu_temp: ChannelStats,
    pub memory: ChannelStats,
    pub network_rx: ChannelStats,
    pub network_tx: ChannelStats,
}

struct Accumulator {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    // An empty accumulator yields all zeros; the infinity seeds never escape.
    fn finish(self, current: f64) -> ChannelStats {
        if self.count == 0 {
            return ChannelStats::default();
        }
        ChannelStats {
            avg: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
            current,
        }
    }
}

fn channel(samples: &[TrackedSample], value: impl Fn(&TrackedSample) -> f64) -> ChannelStats {
    let mut acc = Accumulator::new();
    for s in samples {
        acc.add(value(s));
    }
    acc.finish(samples.last().map(&value).unwrap_or(0.0))
}

/// Folds a capture into per-channel avg/min/max/current. Recomputed from scratch on every call.
pub fn reduce(samples: &[TrackedSample]) -> Statistics {
    let mut temp = Accumulator::new();
    for t in samples.iter().filter_map(|s| s.cpu_temp_c).filter(|t| *t > 0.0) {
        temp.add(t);
    }
    let temp_now = samples.last().and_then(|s| s.cpu_temp_c).unwrap_or(0.0);

    Statistics {
        cpu: channel(samples, |s| s.cpu_pct),
        cpu_temp: temp.finish(temp_now),
        memory: channel(samples, |s| s.mem_pct),
        network_rx: channel(samples, |s| s.net_rx_bytes_per_sec),
        network_tx: channel(samples, |s| s.net_tx_bytes_per_sec),
    }
}
