//! Top processes table with per-cell coloring.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::types::MetricsSnapshot;
use crate::ui::theme::load_color;

const COLS: [Constraint; 5] = [
    Constraint::Length(8),      // PID
    Constraint::Percentage(30), // Name
    Constraint::Length(7),      // CPU %
    Constraint::Length(7),      // Mem %
    Constraint::Min(10),        // Command
];

pub fn draw_top_processes(f: &mut ratatui::Frame<'_>, area: Rect, m: Option<&MetricsSnapshot>) {
    let block = Block::default().borders(Borders::ALL).title("Top Processes");
    let Some(mm) = m else {
        f.render_widget(block, area);
        return;
    };

    let peak_cpu = mm.processes.iter().map(|p| p.cpu_pct).fold(0.0_f64, f64::max);

    let rows = mm.processes.iter().map(|p| {
        let mem_fg = match p.mem_pct {
            x if x < 5.0 => Color::Blue,
            x if x < 20.0 => Color::Magenta,
            _ => Color::Red,
        };
        let emphasis = if p.cpu_pct > 0.0 && (p.cpu_pct - peak_cpu).abs() < f64::EPSILON {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(p.pid.to_string()).style(Style::default().fg(Color::DarkGray)),
            Cell::from(p.name.clone()),
            Cell::from(format!("{:>5.1}", p.cpu_pct)).style(Style::default().fg(load_color(p.cpu_pct))),
            Cell::from(format!("{:>5.1}", p.mem_pct)).style(Style::default().fg(mem_fg)),
            Cell::from(p.command.clone()).style(Style::default().fg(Color::Gray)),
        ])
        .style(emphasis)
    });

    let header = Row::new(vec!["PID", "Name", "CPU %", "Mem %", "Command"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(rows, COLS)
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}
