//! Memory usage chart with a gauge line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Gauge},
};

use crate::history::LiveCharts;
use crate::types::MetricsSnapshot;
use crate::ui::chart::{draw_line_chart, Series};
use crate::ui::theme::{load_color, MEM_LINE};
use crate::ui::util::human;

pub fn draw_mem(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    charts: &LiveCharts,
    m: Option<&MetricsSnapshot>,
) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    let (used, total, active, available, pct) = match m {
        Some(mm) => (
            mm.memory.used_bytes,
            mm.memory.total_bytes,
            mm.memory.active_bytes,
            mm.memory.available_bytes,
            mm.memory.used_pct,
        ),
        None => (0, 0, 0, 0, 0.0),
    };

    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Memory (active {} | available {})",
            human(active),
            human(available)
        )))
        .gauge_style(Style::default().fg(load_color(pct)))
        .percent(pct.clamp(0.0, 100.0).round() as u16)
        .label(format!("{} / {} ({pct:.1}%)", human(used), human(total)));
    f.render_widget(g, parts[0]);

    let series = [Series {
        name: "mem %",
        values: &charts.memory,
        color: MEM_LINE,
    }];
    draw_line_chart(f, parts[1], "Memory %".into(), &charts.labels, &series, 100.0);
}
