//! Disk cards with per-volume gauge and title line.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::types::{DiskIo, DiskUsage};
use crate::ui::util::{disk_icon, human, kb_per_sec, truncate_middle};

pub fn draw_disks(f: &mut ratatui::Frame<'_>, area: Rect, volumes: &[DiskUsage], io: Option<&DiskIo>) {
    let title = match io {
        Some(io) => format!(
            "Disks (read {} KB/s | write {} KB/s)",
            kb_per_sec(io.read_bytes_per_sec),
            kb_per_sec(io.write_bytes_per_sec)
        ),
        None => "Disks".into(),
    };
    f.render_widget(Block::default().borders(Borders::ALL).title(title), area);

    let inner = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if volumes.is_empty() {
        if inner.height > 0 {
            f.render_widget(Paragraph::new("No volumes reported"), inner);
        }
        return;
    }
    if inner.height < 3 {
        return;
    }

    let per_disk_h = 3u16;
    let max_cards = (inner.height / per_disk_h).min(volumes.len() as u16) as usize;

    let constraints: Vec<Constraint> = (0..max_cards).map(|_| Constraint::Length(per_disk_h)).collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (d, slot) in volumes.iter().zip(rows.iter()) {
        // the agent's percentage is not clamped
        let pct = d.used_pct.clamp(0.0, 100.0).round() as u16;
        let color = if pct < 70 {
            Color::Green
        } else if pct < 90 {
            Color::Yellow
        } else {
            Color::Red
        };

        let title = format!(
            "{} {}   {} / {}  ({:.1}%)",
            disk_icon(&d.fs),
            truncate_middle(&d.label, (slot.width.saturating_sub(6)) as usize / 2),
            human(d.used_bytes),
            human(d.size_bytes),
            d.used_pct
        );

        let card = Block::default().borders(Borders::ALL).title(title);
        f.render_widget(card, *slot);

        let inner_card = Rect {
            x: slot.x + 1,
            y: slot.y + 1,
            width: slot.width.saturating_sub(2),
            height: slot.height.saturating_sub(2),
        };
        if inner_card.height == 0 {
            continue;
        }

        let gauge_rect = Rect {
            x: inner_card.x,
            y: inner_card.y + inner_card.height / 2,
            width: inner_card.width,
            height: 1,
        };

        let g = Gauge::default()
            .percent(pct)
            .gauge_style(Style::default().fg(color));
        f.render_widget(g, gauge_rect);
    }
}
