//! Line chart over a rolling window, x-axis labelled from the shared time labels.

use ratatui::{
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
};

use crate::history::RollingWindow;
use crate::ui::theme::AXIS;

pub struct Series<'a> {
    pub name: &'a str,
    pub values: &'a RollingWindow<f64>,
    pub color: ratatui::style::Color,
}

/// First, middle and last label of the window.
pub fn axis_labels(labels: &RollingWindow<String>) -> Vec<String> {
    let n = labels.len();
    if n == 0 {
        return Vec::new();
    }
    [0, n / 2, n - 1]
        .iter()
        .filter_map(|&i| labels.iter().nth(i).cloned())
        .collect()
}

pub fn draw_line_chart(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: String,
    labels: &RollingWindow<String>,
    series: &[Series<'_>],
    y_max: f64,
) {
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, v.clamp(0.0, y_max)))
                .collect()
        })
        .collect();
    let datasets: Vec<Dataset<'_>> = series
        .iter()
        .zip(points.iter())
        .map(|(s, pts)| {
            Dataset::default()
                .name(s.name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(s.color))
                .data(pts)
        })
        .collect();

    let x_max = labels.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span<'_>> = axis_labels(labels).into_iter().map(Span::raw).collect();
    let y_labels = vec![
        Span::raw("0"),
        Span::raw(format!("{:.0}", y_max / 2.0)),
        Span::raw(format!("{y_max:.0}")),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(AXIS))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(AXIS))
                .bounds([0.0, y_max])
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_labels_pick_ends_and_middle() {
        let w = RollingWindow::from_fn(60, |i| format!("t{i}"));
        assert_eq!(axis_labels(&w), vec!["t0", "t30", "t59"]);
    }
}
