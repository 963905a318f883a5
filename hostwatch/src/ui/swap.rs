//! Swap gauge.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
};

use crate::types::MetricsSnapshot;
use crate::ui::util::human;

pub fn draw_swap(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    let (used, total, pct) = match m {
        Some(mm) => {
            let (used, total) = (mm.memory.swap_used_bytes, mm.memory.swap_total_bytes);
            let pct = if total > 0 {
                (used as f64 / total as f64 * 100.0).min(100.0) as u16
            } else {
                0
            };
            (used, total, pct)
        }
        None => (0, 0, 0),
    };

    let g = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Swap"))
        .gauge_style(Style::default().fg(Color::Yellow))
        .percent(pct)
        .label(format!("{} / {}", human(used), human(total)));
    f.render_widget(g, area);
}
