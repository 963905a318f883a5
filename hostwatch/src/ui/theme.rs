//! Shared UI colors and load thresholds.

use ratatui::style::Color;

pub const CPU_LINE: Color = Color::Cyan;
pub const MEM_LINE: Color = Color::Magenta;
pub const NET_RX: Color = Color::Green;
pub const NET_TX: Color = Color::Blue;
pub const AXIS: Color = Color::DarkGray;

/// Green below 50%, yellow below 80%, red above.
pub fn load_color(pct: f64) -> Color {
    match pct {
        x if x < 50.0 => Color::Green,
        x if x < 80.0 => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn temp_color(c: f64) -> Color {
    match c {
        x if x < 50.0 => Color::Green,
        x if x < 70.0 => Color::Yellow,
        _ => Color::Red,
    }
}
