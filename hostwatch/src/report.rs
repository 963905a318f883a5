//! Markdown rendering of a finished tracking capture.
//!
//! Every section renders on its own. A section that cannot render is logged and
//! left out, so a capture always produces a (possibly partial) report.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{info, warn};

use crate::stats::ChannelStats;
use crate::tracking::{TrackedSample, TrackingReport};
use crate::types::SystemDescription;
use crate::ui::util::human;

const DISK_LABEL_MAX: usize = 20;
const PROCESS_NAME_MAX: usize = 35;
const TOP_PROCESSES: usize = 10;
const TREND_POINTS: usize = 60;
const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("capture holds no samples")]
    EmptyCapture,
    #[error("no system description received")]
    MissingSystemInfo,
    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
    #[error("writing report: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ReportContext<'a> {
    pub report: &'a TrackingReport,
    pub system: Option<&'a SystemDescription>,
    pub generated_at: DateTime<Local>,
}

type Section = fn(&ReportContext<'_>, &mut String) -> Result<(), RenderError>;

const SECTIONS: [(&str, Section); 7] = [
    ("header", header),
    ("system", system_info),
    ("summary", summary),
    ("trends", trends),
    ("disks", disks),
    ("processes", processes),
    ("gpu", gpu),
];

pub fn render(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    for (name, section) in SECTIONS {
        let mut buf = String::new();
        match section(ctx, &mut buf) {
            Ok(()) => out.push_str(&buf),
            Err(e) => warn!("report section {name} skipped: {e}"),
        }
    }
    out.push_str("\n---\n_Generated by hostwatch_\n");
    out
}

pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("hostwatch-report-{}.md", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Renders and writes the report into `dir`, creating it if needed.
pub fn write_report(dir: &Path, ctx: &ReportContext<'_>) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(ctx.generated_at));
    fs::write(&path, render(ctx))?;
    info!("report written to {}", path.display());
    Ok(path)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn header(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let r = ctx.report;
    writeln!(out, "# System Resource Monitoring Report\n")?;
    writeln!(out, "- Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(
        out,
        "- Tracking period: {} ~ {}",
        r.started_at.format("%Y-%m-%d %H:%M:%S"),
        r.finished_at.format("%H:%M:%S")
    )?;
    let secs = r.elapsed.as_secs();
    writeln!(out, "- Duration: {}m {:02}s", secs / 60, secs % 60)?;
    let status = if r.completed { "complete" } else { "stopped early" };
    writeln!(out, "- Samples: {} ({status})\n", r.samples.len())?;
    Ok(())
}

fn system_info(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let sys = ctx.system.ok_or(RenderError::MissingSystemInfo)?;
    writeln!(out, "## System Information\n")?;
    writeln!(out, "| Item | Value |\n|---|---|")?;
    writeln!(out, "| Host | {} |", sys.os.hostname)?;
    writeln!(out, "| OS | {} {} ({}) |", sys.os.distro, sys.os.release, sys.os.arch)?;
    writeln!(
        out,
        "| CPU | {} {} |",
        sys.cpu.manufacturer, sys.cpu.brand
    )?;
    writeln!(
        out,
        "| Cores | {} ({} physical) @ {:.2} GHz |",
        sys.cpu.cores, sys.cpu.physical_cores, sys.cpu.speed_ghz
    )?;
    writeln!(
        out,
        "| System | {} {} |",
        sys.system.manufacturer, sys.system.model
    )?;
    for g in &sys.graphics {
        let vram = g.vram_mb.map(|v| format!(" ({v} MB)")).unwrap_or_default();
        writeln!(out, "| Graphics | {} {}{vram} |", g.vendor, g.model)?;
    }
    out.push('\n');
    Ok(())
}

fn stats_row(out: &mut String, name: &str, c: &ChannelStats, scale: f64) -> Result<(), RenderError> {
    writeln!(
        out,
        "| {name} | {:.1} | {:.1} | {:.1} | {:.1} |",
        c.avg / scale,
        c.min / scale,
        c.max / scale,
        c.current / scale
    )?;
    Ok(())
}

fn summary(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let s = &ctx.report.statistics;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Metric | Average | Min | Max | Current |\n|---|---|---|---|---|")?;
    stats_row(out, "CPU usage (%)", &s.cpu, 1.0)?;
    if s.cpu_temp.avg > 0.0 {
        stats_row(out, "CPU temperature (°C)", &s.cpu_temp, 1.0)?;
    }
    stats_row(out, "Memory usage (%)", &s.memory, 1.0)?;
    stats_row(out, "Download (KB/s)", &s.network_rx, 1024.0)?;
    stats_row(out, "Upload (KB/s)", &s.network_tx, 1024.0)?;
    out.push('\n');
    Ok(())
}

/// Block-character sparkline scaled to the series maximum, at most `TREND_POINTS` wide.
pub fn sparkline(values: &[f64]) -> String {
    let n = values.len();
    let picked: Vec<f64> = if n > TREND_POINTS {
        (0..TREND_POINTS).map(|i| values[i * n / TREND_POINTS]).collect()
    } else {
        values.to_vec()
    };
    let max = picked.iter().copied().fold(0.0, f64::max);
    picked
        .iter()
        .map(|v| {
            if max <= 0.0 || !v.is_finite() {
                return SPARK[0];
            }
            let idx = ((v / max) * (SPARK.len() - 1) as f64).round();
            SPARK[idx.clamp(0.0, (SPARK.len() - 1) as f64) as usize]
        })
        .collect()
}

fn trends(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let samples = &ctx.report.samples;
    if samples.is_empty() {
        return Err(RenderError::EmptyCapture);
    }
    let series = |f: fn(&TrackedSample) -> f64| samples.iter().map(f).collect::<Vec<_>>();
    writeln!(out, "## Trends\n\n```")?;
    writeln!(out, "CPU      {}", sparkline(&series(|s| s.cpu_pct)))?;
    writeln!(out, "Memory   {}", sparkline(&series(|s| s.mem_pct)))?;
    writeln!(out, "Download {}", sparkline(&series(|s| s.net_rx_bytes_per_sec)))?;
    writeln!(out, "Upload   {}", sparkline(&series(|s| s.net_tx_bytes_per_sec)))?;
    writeln!(out, "```\n")?;
    Ok(())
}

fn disks(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let last = ctx.report.last_sample().ok_or(RenderError::EmptyCapture)?;
    writeln!(out, "## Disk Usage\n")?;
    writeln!(out, "| Volume | Used | Size | Usage |\n|---|---|---|---|")?;
    for d in last.disk.iter().filter(|d| d.size_bytes > 0) {
        writeln!(
            out,
            "| {} | {} | {} | {:.1}% |",
            truncate(&d.label, DISK_LABEL_MAX),
            human(d.used_bytes),
            human(d.size_bytes),
            d.used_pct
        )?;
    }
    out.push('\n');
    Ok(())
}

fn processes(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let last = ctx.report.last_sample().ok_or(RenderError::EmptyCapture)?;
    writeln!(out, "## Top Processes\n")?;
    writeln!(out, "| Name | PID | CPU % | Mem % |\n|---|---|---|---|")?;
    for p in last.processes.iter().take(TOP_PROCESSES) {
        writeln!(
            out,
            "| {} | {} | {:.1} | {:.1} |",
            truncate(&p.name, PROCESS_NAME_MAX),
            p.pid,
            p.cpu_pct,
            p.mem_pct
        )?;
    }
    out.push('\n');
    Ok(())
}

fn gpu(ctx: &ReportContext<'_>, out: &mut String) -> Result<(), RenderError> {
    let last = ctx.report.last_sample().ok_or(RenderError::EmptyCapture)?;
    if last.gpu.is_empty() {
        return Ok(());
    }
    let opt = |v: Option<f64>, unit: &str| v.map(|x| format!("{x:.1}{unit}")).unwrap_or_else(|| "-".into());
    writeln!(out, "## GPU\n")?;
    writeln!(out, "| Model | Utilization | Temperature | Memory |\n|---|---|---|---|")?;
    for g in &last.gpu {
        let mem = match (g.memory_used_mb, g.memory_total_mb.or(g.vram_mb)) {
            (Some(u), Some(t)) => format!("{u} / {t} MB"),
            (None, Some(t)) => format!("{t} MB"),
            _ => "-".into(),
        };
        writeln!(
            out,
            "| {} {} | {} | {} | {mem} |",
            g.vendor,
            g.model,
            opt(g.utilization_pct, "%"),
            opt(g.temperature_c, "°C")
        )?;
    }
    out.push('\n');
    Ok(())
}
