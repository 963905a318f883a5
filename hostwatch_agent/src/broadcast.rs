//! Per-viewer push loops: one retained system description, then one metrics (or
//! metrics error) event per tick until the viewer goes away.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::proto::ServerEvent;
use crate::sampler::Sampler;
use crate::sensors::SensorSource;
use crate::types::SystemDescription;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

pub struct Broadcaster<S> {
    sampler: Arc<Sampler<S>>,
    system: Arc<SystemDescription>,
    period: Duration,
}

impl<S> Clone for Broadcaster<S> {
    fn clone(&self) -> Self {
        Self {
            sampler: Arc::clone(&self.sampler),
            system: Arc::clone(&self.system),
            period: self.period,
        }
    }
}

impl<S: SensorSource> Broadcaster<S> {
    pub fn new(sampler: Arc<Sampler<S>>, system: SystemDescription, period: Duration) -> Self {
        Self {
            sampler,
            system: Arc::new(system),
            period,
        }
    }

    pub fn system(&self) -> &SystemDescription {
        &self.system
    }

    /// Start pushing to one viewer. The loop ends when `tx` closes or the handle is dropped.
    pub fn spawn_viewer(&self, tx: mpsc::Sender<ServerEvent>) -> ViewerHandle {
        let this = self.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = this.push_loop(tx).await {
                debug!("push loop ended: {e}");
            }
        });
        ViewerHandle { task }
    }

    async fn push_loop(self, tx: mpsc::Sender<ServerEvent>) -> Result<(), TransportError> {
        send(&tx, ServerEvent::SystemInfo((*self.system).clone())).await?;

        // like setInterval: the first tick lands one period after connect
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tx.closed() => return Err(TransportError::Closed),
                _ = ticker.tick() => {}
            }
            let event = match self.sampler.sample().await {
                Ok(snapshot) => ServerEvent::Metrics(Box::new(snapshot)),
                Err(e) => {
                    warn!("error collecting metrics: {e}");
                    ServerEvent::MetricsError {
                        message: e.to_string(),
                    }
                }
            };
            send(&tx, event).await?;
        }
    }
}

async fn send(tx: &mpsc::Sender<ServerEvent>, ev: ServerEvent) -> Result<(), TransportError> {
    tx.send(ev).await.map_err(|_| TransportError::Closed)
}

/// Owns a viewer's push loop. Dropping it cancels the loop and its timer.
pub struct ViewerHandle {
    task: JoinHandle<()>,
}

impl ViewerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SyntheticSensors;

    fn broadcaster() -> (Arc<Sampler<SyntheticSensors>>, Broadcaster<SyntheticSensors>) {
        let sampler = Arc::new(Sampler::new(SyntheticSensors::new(), Duration::ZERO));
        let system = SystemDescription {
            os: crate::types::OsIdentity {
                hostname: "unit".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let b = Broadcaster::new(Arc::clone(&sampler), system, DEFAULT_TICK);
        (sampler, b)
    }

    #[tokio::test(start_paused = true)]
    async fn sends_system_info_then_metrics_each_tick() {
        let (sampler, b) = broadcaster();
        let (tx, mut rx) = mpsc::channel(8);
        let _h = b.spawn_viewer(tx);

        match rx.recv().await {
            Some(ServerEvent::SystemInfo(info)) => assert_eq!(info.os.hostname, "unit"),
            other => panic!("expected system info first, got {other:?}"),
        }
        let start = Instant::now();
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
        assert!(start.elapsed() >= DEFAULT_TICK);
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
        assert_eq!(sampler.sensors().sweeps(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sensor_failure_sends_error_and_keeps_ticking() {
        let (sampler, b) = broadcaster();
        let (tx, mut rx) = mpsc::channel(8);
        let _h = b.spawn_viewer(tx);
        assert!(matches!(rx.recv().await, Some(ServerEvent::SystemInfo(_))));

        sampler.sensors().set_failing(true);
        match rx.recv().await {
            Some(ServerEvent::MetricsError { message }) => assert!(message.contains("cpu load")),
            other => panic!("expected metrics error, got {other:?}"),
        }
        sampler.sensors().set_failing(false);
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_stops_ticks() {
        let (sampler, b) = broadcaster();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = b.spawn_viewer(tx);
        assert!(matches!(rx.recv().await, Some(ServerEvent::SystemInfo(_))));
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
        assert!(matches!(rx.recv().await, Some(ServerEvent::Metrics(_))));
        drop(rx);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(handle.is_finished());
        assert_eq!(sampler.sensors().sweeps(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_loop() {
        let (sampler, b) = broadcaster();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = b.spawn_viewer(tx);
        assert!(matches!(rx.recv().await, Some(ServerEvent::SystemInfo(_))));
        drop(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        // sender dropped with the aborted task
        assert!(rx.recv().await.is_none());
        assert_eq!(sampler.sensors().sweeps(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn viewers_tick_independently() {
        let (sampler, b) = broadcaster();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, rx_b) = mpsc::channel(8);
        let _a = b.spawn_viewer(tx_a);
        let hb = b.spawn_viewer(tx_b);
        drop(rx_b);

        assert!(matches!(rx_a.recv().await, Some(ServerEvent::SystemInfo(_))));
        for _ in 0..3 {
            assert!(matches!(rx_a.recv().await, Some(ServerEvent::Metrics(_))));
        }
        assert!(hb.is_finished());
        assert_eq!(sampler.sensors().sweeps(), 3);
    }
}
