//! Network sparklines (download/upload).

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Sparkline},
};

use crate::history::RollingWindow;
use crate::ui::util::kb_per_sec;

pub fn draw_net_spark(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    name: &str,
    hist: &RollingWindow<f64>,
    color: Color,
) {
    let now = hist.latest().copied().unwrap_or(0.0);
    let title = format!(
        "{name} (KB/s) now: {} | peak: {}",
        kb_per_sec(now),
        kb_per_sec(hist.max())
    );

    // KB/s points; the window is already capped, only trim to what fits
    let points = hist.to_points(1.0 / 1024.0);
    let max_points = area.width.saturating_sub(2) as usize;
    let start = points.len().saturating_sub(max_points);

    let spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(&points[start..])
        .style(Style::default().fg(color));
    f.render_widget(spark, area);
}
