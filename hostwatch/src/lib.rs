//! Library surface for the hostwatch viewer: wire types, chart history,
//! tracking capture, statistics and report rendering.

pub mod app;
pub mod config;
pub mod history;
pub mod report;
pub mod stats;
pub mod tracking;
pub mod types;
pub mod ui;
pub mod ws;
