//! Two-line header: host identity, then connection status, errors and tracking state.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::ConnectionStatus;
use crate::tracking::format_countdown;
use crate::types::SystemDescription;

pub struct HeaderInfo<'a> {
    pub system: Option<&'a SystemDescription>,
    pub status: &'a ConnectionStatus,
    pub error: Option<&'a str>,
    /// Remaining time and captured sample count while tracking.
    pub tracking: Option<(Duration, usize)>,
    pub notice: Option<&'a str>,
}

pub fn host_line(sys: Option<&SystemDescription>) -> String {
    match sys {
        Some(s) => {
            let cpu = format!("{} {}", s.cpu.manufacturer, s.cpu.brand);
            format!(
                "hostwatch | host: {} | {} {} ({}) | {} x{}",
                s.os.hostname,
                s.os.distro,
                s.os.release,
                s.os.arch,
                cpu.trim(),
                s.cpu.cores
            )
        }
        None => "hostwatch | waiting for system description...".into(),
    }
}

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, h: &HeaderInfo<'_>) {
    let title = Line::from(Span::styled(
        host_line(h.system),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let mut spans = Vec::new();
    let (dot, label) = match h.status {
        ConnectionStatus::Connecting => (Color::Yellow, "connecting".to_string()),
        ConnectionStatus::Live => (Color::Green, "live".to_string()),
        ConnectionStatus::Disconnected(Some(reason)) => (Color::Red, format!("disconnected: {reason}")),
        ConnectionStatus::Disconnected(None) => (Color::Red, "disconnected".to_string()),
    };
    spans.push(Span::styled("● ", Style::default().fg(dot)));
    spans.push(Span::raw(label));

    if let Some(err) = h.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("metrics error: {err}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    spans.push(Span::raw("  "));
    match h.tracking {
        Some((left, samples)) => spans.push(Span::styled(
            format!("REC {} ({samples} samples, 's' to stop)", format_countdown(left)),
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled(
            "'t' track | 'q' quit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    if let Some(n) = h.notice {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(n.to_string(), Style::default().fg(Color::Cyan)));
    }

    f.render_widget(Paragraph::new(vec![title, Line::from(spans)]), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CpuIdentity, OsIdentity};

    #[test]
    fn host_line_uses_description() {
        let sys = SystemDescription {
            cpu: CpuIdentity {
                manufacturer: "AMD".into(),
                brand: "Ryzen 7".into(),
                cores: 16,
                ..Default::default()
            },
            os: OsIdentity {
                hostname: "box".into(),
                distro: "Debian".into(),
                release: "12".into(),
                arch: "x86_64".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let line = host_line(Some(&sys));
        assert!(line.contains("host: box"));
        assert!(line.contains("AMD Ryzen 7 x16"));
        assert!(host_line(None).contains("waiting"));
    }
}
