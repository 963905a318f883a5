//! UI module root: exposes drawing functions for individual panels.

pub mod chart;
pub mod cpu;
pub mod disks;
pub mod gpu;
pub mod header;
pub mod mem;
pub mod net;
pub mod processes;
pub mod swap;
pub mod theme;
pub mod util;
