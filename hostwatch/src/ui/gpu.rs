//! GPU panel: one name row plus utilization and VRAM bars per controller.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::types::GpuController;
use crate::ui::theme::temp_color;

pub fn draw_gpu(f: &mut ratatui::Frame<'_>, area: Rect, gpus: &[GpuController]) {
    let mut area = area;
    let block = Block::default().borders(Borders::ALL).title("GPU");
    f.render_widget(block, area);

    if area.height <= 2 || area.width <= 2 {
        return;
    }
    area.y += 1;
    area.height = area.height.saturating_sub(2);
    area.x += 1;
    area.width = area.width.saturating_sub(2);

    if gpus.is_empty() {
        f.render_widget(Paragraph::new("No GPUs"), area);
        return;
    }

    // 3 rows per GPU: name, util bar, vram bar
    if area.height < 3 {
        return;
    }
    let per_gpu_rows: u16 = 3;
    let count = gpus.len().min((area.height / per_gpu_rows) as usize);

    let constraints = vec![Constraint::Length(1); count * per_gpu_rows as usize];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let split_bar = |r: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(8), Constraint::Length(24)])
            .split(r)
    };

    for (i, g) in gpus.iter().take(count).enumerate() {
        let name_style = g
            .temperature_c
            .map(|t| Style::default().fg(temp_color(t)))
            .unwrap_or_else(|| Style::default().fg(Color::Gray));
        let temp = g
            .temperature_c
            .map(|t| format!(" {t:.0}°C"))
            .unwrap_or_default();
        f.render_widget(
            Paragraph::new(Span::raw(format!("{} {}{temp}", g.vendor, g.model))).style(name_style),
            rows[i * 3],
        );

        let util_cols = split_bar(rows[i * 3 + 1]);
        let util = g.utilization_pct.map(|u| u.clamp(0.0, 100.0));
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Green))
                .label(Span::raw(""))
                .ratio(util.unwrap_or(0.0) / 100.0),
            util_cols[0],
        );
        let util_s = util
            .map(|u| format!("util: {u:.0}%"))
            .unwrap_or_else(|| "util: n/a".into());
        f.render_widget(
            Paragraph::new(Span::raw(util_s)).style(Style::default().fg(Color::Gray)),
            util_cols[1],
        );

        let mem_cols = split_bar(rows[i * 3 + 2]);
        let total = g.memory_total_mb.or(g.vram_mb);
        let (ratio, mem_s) = match (g.memory_used_mb, total) {
            (Some(used), Some(total)) if total > 0 => {
                let r = (used as f64 / total as f64).clamp(0.0, 1.0);
                (r, format!("vram: {used}/{total}M ({:.0}%)", r * 100.0))
            }
            (None, Some(total)) => (0.0, format!("vram: {total}M")),
            _ => (0.0, "vram: n/a".into()),
        };
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::LightMagenta))
                .label(Span::raw(""))
                .ratio(ratio),
            mem_cols[0],
        );
        f.render_widget(
            Paragraph::new(Span::raw(mem_s)).style(Style::default().fg(Color::Gray)),
            mem_cols[1],
        );
    }
}
