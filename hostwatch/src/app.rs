//! App state and main loop: input handling, pushed events, tracking, and drawing.

use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ViewerConfig;
use crate::history::{format_label, DiskPanel, LiveCharts, PerCoreHistory, WINDOW_LEN};
use crate::report::{write_report, ReportContext};
use crate::tracking::{TrackingReport, TrackingSession};
use crate::types::{MetricsSnapshot, ServerEvent, SystemDescription};
use crate::ui::{
    cpu::{draw_cpu_chart, draw_per_core_bars},
    disks::draw_disks,
    gpu::draw_gpu,
    header::{draw_header, HeaderInfo},
    mem::draw_mem,
    net::draw_net_spark,
    processes::draw_top_processes,
    swap::draw_swap,
    theme::{NET_RX, NET_TX},
};
use crate::ws::{connect, send_start_tracking, Backoff, Connection, Incoming, WsStream};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Disconnected(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    StartTracking,
    StopTracking,
}

pub struct App {
    system: Option<SystemDescription>,
    last_metrics: Option<MetricsSnapshot>,
    charts: LiveCharts,
    per_core_hist: PerCoreHistory,
    disks: DiskPanel,
    tracking: TrackingSession,
    status: ConnectionStatus,
    // latest metrics_error; cleared by the next good snapshot
    last_error: Option<String>,
    notice: Option<String>,
    report_dir: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            system: None,
            last_metrics: None,
            charts: LiveCharts::new(Local::now()),
            per_core_hist: PerCoreHistory::new(WINDOW_LEN),
            disks: DiskPanel::default(),
            tracking: TrackingSession::new(cfg.tracking_duration),
            status: ConnectionStatus::Connecting,
            last_error: None,
            notice: None,
            report_dir: cfg.report_dir.clone(),
            should_quit: false,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn charts(&self) -> &LiveCharts {
        &self.charts
    }

    pub fn tracking(&self) -> &TrackingSession {
        &self.tracking
    }

    pub fn system(&self) -> Option<&SystemDescription> {
        self.system.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// All state changes driven by the agent go through here, one message at a time.
    pub fn apply(&mut self, incoming: Incoming, now: Instant) {
        match incoming {
            Incoming::Event(ServerEvent::SystemInfo(desc)) => {
                info!("system description received for {}", desc.os.hostname);
                self.system = Some(desc);
                self.status = ConnectionStatus::Live;
            }
            Incoming::Event(ServerEvent::Metrics(m)) => self.on_metrics(*m),
            Incoming::Event(ServerEvent::MetricsError { message }) => {
                warn!("agent reported metrics error: {message}");
                self.last_error = Some(message);
            }
            Incoming::Closed(reason) => self.on_disconnect(reason, now),
        }
    }

    fn on_metrics(&mut self, m: MetricsSnapshot) {
        self.last_error = None;
        self.status = ConnectionStatus::Live;
        self.charts.push(&m, format_label(Local::now()));
        self.per_core_hist.push_samples(&m.cpu.per_core_load_pct);
        self.disks.update(&m.disk);
        self.tracking.on_snapshot(&m);
        self.last_metrics = Some(m);
    }

    /// A dead channel never leaves tracking active; the partial capture is still reported.
    pub fn on_disconnect(&mut self, reason: Option<String>, now: Instant) {
        warn!("agent connection lost");
        self.status = ConnectionStatus::Disconnected(reason);
        if let Some(report) = self.tracking.stop(now) {
            self.publish(report);
        }
    }

    /// Once-per-second housekeeping.
    pub fn on_second(&mut self, now: Instant) {
        if let Some(report) = self.tracking.tick(now) {
            self.publish(report);
        }
    }

    pub fn start_tracking(&mut self, now: Instant) -> bool {
        let started = self.tracking.start(now);
        if started {
            self.notice = None;
        }
        started
    }

    pub fn stop_tracking(&mut self, now: Instant) {
        if let Some(report) = self.tracking.stop(now) {
            self.publish(report);
        }
    }

    fn publish(&mut self, report: TrackingReport) {
        let ctx = ReportContext {
            report: &report,
            system: self.system.as_ref(),
            generated_at: Local::now(),
        };
        self.notice = Some(match write_report(&self.report_dir, &ctx) {
            Ok(path) => format!("report saved: {}", path.display()),
            Err(e) => {
                error!("report not written: {e}");
                format!("report failed: {e}")
            }
        });
    }

    pub fn handle_key(&mut self, k: KeyEvent, now: Instant) -> KeyAction {
        match k.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                KeyAction::Quit
            }
            KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                KeyAction::Quit
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                if self.start_tracking(now) {
                    KeyAction::StartTracking
                } else {
                    KeyAction::None
                }
            }
            KeyCode::Char('s') | KeyCode::Char('S') if self.tracking.is_active() => {
                self.stop_tracking(now);
                KeyAction::StopTracking
            }
            _ => KeyAction::None,
        }
    }

    pub async fn run(&mut self, url: &Url) -> anyhow::Result<()> {
        // Connect to agent
        let ws = connect(url)
            .await
            .with_context(|| format!("connecting to {url}"))?;
        info!("connected to {url}");

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = self.event_loop(&mut terminal, url, ws).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        url: &Url,
        ws: WsStream,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Incoming>(64);
        let mut conn = Some(Connection::spawn(ws, tx.clone()));
        let mut backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(10));
        let mut second = tokio::time::interval(Duration::from_secs(1));
        second.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(0))? {
                let Event::Key(k) = event::read()? else {
                    continue;
                };
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if self.handle_key(k, Instant::now()) == KeyAction::StartTracking {
                    if let Some(c) = conn.as_mut() {
                        if let Err(e) = send_start_tracking(c.sink()).await {
                            warn!("start_tracking not sent: {e}");
                        }
                    }
                }
            }
            if self.should_quit {
                break;
            }

            let now = Instant::now();
            if conn.is_none() && backoff.should_retry(now) {
                match tokio::time::timeout(Duration::from_secs(2), connect(url)).await {
                    Ok(Ok(ws)) => {
                        info!("reconnected to {url}");
                        backoff.mark_success(now);
                        self.status = ConnectionStatus::Connecting;
                        conn = Some(Connection::spawn(ws, tx.clone()));
                    }
                    Ok(Err(e)) => {
                        debug!("reconnect failed: {e}");
                        backoff.mark_failure(now);
                    }
                    Err(_) => backoff.mark_failure(now),
                }
            }

            tokio::select! {
                Some(incoming) = rx.recv() => {
                    if matches!(incoming, Incoming::Closed(_)) {
                        conn = None;
                        backoff.mark_failure(Instant::now());
                    }
                    self.apply(incoming, Instant::now());
                }
                _ = second.tick() => self.on_second(Instant::now()),
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }

            // volume count changed: redraw the whole surface
            if self.disks.take_rebuild() {
                terminal.clear()?;
            }
            terminal.draw(|f| self.draw(f))?;
        }

        if let Some(c) = conn.take() {
            c.close().await;
        }
        Ok(())
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),   // header
                Constraint::Ratio(1, 3), // cpu chart + per-core
                Constraint::Length(9),   // memory gauge + chart (left), GPU (right, part 1)
                Constraint::Length(3),   // swap (left), GPU (right, part 2)
                Constraint::Min(10),     // disks + net (left), processes (right)
            ])
            .split(area);

        let now = Instant::now();
        let header = HeaderInfo {
            system: self.system.as_ref(),
            status: &self.status,
            error: self.last_error.as_deref(),
            tracking: self
                .tracking
                .remaining(now)
                .map(|left| (left, self.tracking.captured())),
            notice: self.notice.as_deref(),
        };
        draw_header(f, rows[0], &header);

        let m = self.last_metrics.as_ref();

        let top = split_lr(rows[1], 66);
        draw_cpu_chart(f, top[0], &self.charts, m);
        draw_per_core_bars(f, top[1], m, &self.per_core_hist);

        let mem_lr = split_lr(rows[2], 66);
        let swap_lr = split_lr(rows[3], 66);
        draw_mem(f, mem_lr[0], &self.charts, m);
        draw_swap(f, swap_lr[0], m);

        // GPU spans the memory and swap rows
        let gpu_area = Rect {
            x: mem_lr[1].x,
            y: mem_lr[1].y,
            width: mem_lr[1].width,
            height: mem_lr[1].height + swap_lr[1].height,
        };
        draw_gpu(f, gpu_area, m.map(|mm| mm.gpu.as_slice()).unwrap_or(&[]));

        let bottom = split_lr(rows[4], 60);
        let left_stack = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(5),
                Constraint::Length(5),
            ])
            .split(bottom[0]);

        draw_disks(f, left_stack[0], self.disks.volumes(), m.map(|mm| &mm.disk_io));
        draw_net_spark(f, left_stack[1], "Download", &self.charts.net_rx, NET_RX);
        draw_net_spark(f, left_stack[2], "Upload", &self.charts.net_tx, NET_TX);

        draw_top_processes(f, bottom[1], m);
    }
}

fn split_lr(area: Rect, left_pct: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_pct),
            Constraint::Percentage(100 - left_pct),
        ])
        .split(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ratatui::backend::TestBackend;

    use crate::types::{CpuMetrics, DiskUsage, MemoryMetrics, ProcessEntry};

    fn app(dir: &std::path::Path, secs: u64) -> App {
        App::new(&ViewerConfig {
            url: Url::parse("ws://127.0.0.1:1/ws").unwrap(),
            report_dir: dir.to_path_buf(),
            tracking_duration: Duration::from_secs(secs),
        })
    }

    fn metrics(cpu: f64) -> Incoming {
        Incoming::Event(ServerEvent::Metrics(Box::new(MetricsSnapshot {
            timestamp: Utc::now(),
            cpu: CpuMetrics {
                current_load_pct: cpu,
                per_core_load_pct: vec![cpu, cpu / 2.0],
                temperature_c: Some(48.0),
            },
            memory: MemoryMetrics {
                total_bytes: 8 << 30,
                used_bytes: 2 << 30,
                used_pct: 25.0,
                ..Default::default()
            },
            disk: vec![DiskUsage {
                label: "/".into(),
                fs: "/dev/nvme0n1p2".into(),
                size_bytes: 100 << 30,
                used_bytes: 40 << 30,
                used_pct: 40.0,
                ..Default::default()
            }],
            disk_io: Default::default(),
            network: vec![],
            processes: vec![ProcessEntry {
                name: "worker".into(),
                pid: 42,
                cpu_pct: cpu,
                mem_pct: 1.0,
                command: "worker --fast".into(),
            }],
            gpu: vec![],
        })))
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn metrics_error_leaves_charts_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), 300);
        let now = Instant::now();
        app.apply(metrics(30.0), now);
        app.apply(
            Incoming::Event(ServerEvent::MetricsError {
                message: "sensor down".into(),
            }),
            now,
        );
        assert_eq!(app.charts().cpu.latest(), Some(&30.0));
        assert_eq!(app.charts().cpu.len(), WINDOW_LEN);
        assert_eq!(app.last_error(), Some("sensor down"));

        app.apply(metrics(31.0), now);
        assert_eq!(app.last_error(), None);
        assert_eq!(app.charts().cpu.latest(), Some(&31.0));
    }

    #[test]
    fn tracking_run_writes_report_when_time_is_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), 3);
        let t0 = Instant::now();
        assert_eq!(app.handle_key(key('t'), t0), KeyAction::StartTracking);
        assert_eq!(app.handle_key(key('t'), t0), KeyAction::None);
        for load in [10.0, 50.0, 90.0] {
            app.apply(metrics(load), t0);
        }
        app.on_second(t0 + Duration::from_secs(2));
        assert!(app.tracking().is_active());
        app.on_second(t0 + Duration::from_secs(3));
        assert!(!app.tracking().is_active());

        let notice = app.notice().unwrap_or_default().to_string();
        assert!(notice.starts_with("report saved"), "{notice}");
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let body = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(body.contains("| CPU usage (%) | 50.0 | 10.0 | 90.0 | 90.0 |"), "{body}");
    }

    #[test]
    fn disconnect_stops_tracking_with_partial_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), 300);
        let t0 = Instant::now();
        app.start_tracking(t0);
        app.apply(metrics(20.0), t0);
        app.apply(Incoming::Closed(Some("reset".into())), t0 + Duration::from_secs(5));

        assert!(!app.tracking().is_active());
        assert_eq!(
            app.status(),
            &ConnectionStatus::Disconnected(Some("reset".into()))
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn stop_key_only_acts_while_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), 300);
        let t0 = Instant::now();
        assert_eq!(app.handle_key(key('s'), t0), KeyAction::None);
        app.start_tracking(t0);
        assert_eq!(app.handle_key(key('s'), t0), KeyAction::StopTracking);
        assert!(!app.tracking().is_active());
        assert_eq!(app.handle_key(key('q'), t0), KeyAction::Quit);
    }

    #[test]
    fn draws_on_small_and_large_terminals() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path(), 300);
        app.apply(
            Incoming::Event(ServerEvent::SystemInfo(SystemDescription::default())),
            Instant::now(),
        );
        app.apply(metrics(55.0), Instant::now());
        for (w, h) in [(160, 50), (60, 20)] {
            let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
            terminal.draw(|f| app.draw(f)).unwrap();
        }
    }
}
