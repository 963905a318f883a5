//! CPU load chart + per-core mini bars.

use ratatui::style::Modifier;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

use crate::history::{LiveCharts, PerCoreHistory};
use crate::types::MetricsSnapshot;
use crate::ui::chart::{draw_line_chart, Series};
use crate::ui::theme::{load_color, temp_color, CPU_LINE};

pub fn draw_cpu_chart(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    charts: &LiveCharts,
    m: Option<&MetricsSnapshot>,
) {
    let title = match m {
        Some(mm) => {
            let temp = mm
                .cpu
                .temperature_c
                .map(|t| format!(" | {t:.1}°C"))
                .unwrap_or_default();
            format!("CPU (now: {:>5.1}%{temp})", mm.cpu.current_load_pct)
        }
        None => "CPU".into(),
    };
    let series = [Series {
        name: "cpu %",
        values: &charts.cpu,
        color: CPU_LINE,
    }];
    draw_line_chart(f, area, title, &charts.labels, &series, 100.0);
}

pub fn draw_per_core_bars(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    m: Option<&MetricsSnapshot>,
    per_core_hist: &PerCoreHistory,
) {
    f.render_widget(Block::default().borders(Borders::ALL).title("Per-core"), area);
    let Some(mm) = m else { return };
    let cores = &mm.cpu.per_core_load_pct;

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if inner.height == 0 {
        return;
    }

    let show_n = (inner.height as usize).min(cores.len());
    let constraints: Vec<Constraint> = (0..show_n).map(|_| Constraint::Length(1)).collect();
    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, rect) in vchunks.iter().enumerate() {
        let hchunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(6), Constraint::Length(12)])
            .split(*rect);

        let curr = cores[i].clamp(0.0, 100.0);
        let older = per_core_hist
            .deques
            .get(i)
            .and_then(|d| d.iter().rev().nth(20).copied())
            .map(f64::from)
            .unwrap_or(curr);
        let trend = if curr > older + 0.2 {
            "↑"
        } else if curr + 0.2 < older {
            "↓"
        } else {
            "╌"
        };
        let fg = load_color(curr);

        let hist: Vec<u64> = per_core_hist
            .deques
            .get(i)
            .map(|d| {
                let max_points = hchunks[0].width as usize;
                let start = d.len().saturating_sub(max_points);
                d.iter().skip(start).map(|&v| v as u64).collect()
            })
            .unwrap_or_default();

        let spark = Sparkline::default()
            .data(&hist)
            .max(100)
            .style(Style::default().fg(fg));
        f.render_widget(spark, hchunks[0]);

        let label = format!("cpu{i:<2}{trend}{curr:>5.1}%");
        let line = Line::from(Span::styled(
            label,
            Style::default().fg(fg).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(line).right_aligned(), hchunks[1]);
    }

    // Package temperature sits in the border when there is room for it.
    if let Some(t) = mm.cpu.temperature_c {
        if area.width > 20 {
            let badge = Span::styled(format!(" {t:.0}°C "), Style::default().fg(temp_color(t)));
            let slot = Rect {
                x: area.x + area.width.saturating_sub(9),
                y: area.y,
                width: 8,
                height: 1,
            };
            f.render_widget(Paragraph::new(Line::from(badge)), slot);
        }
    }
}
