// gpu.rs
use gfxinfo::active_gpu;

use crate::sensors::RawGpu;

const MIB: u64 = 1024 * 1024;

// gfxinfo only exposes the active adapter, so this is at most one entry.
pub fn collect_all_gpus() -> Result<Vec<RawGpu>, Box<dyn std::error::Error>> {
    let gpu = active_gpu()?;
    let info = gpu.info();

    let total_mb = info.total_vram() / MIB;
    // reported in millidegrees
    let temp_c = info.temperature() as f64 / 1000.0;

    let metrics = RawGpu {
        vendor: gpu.vendor().to_string(),
        model: gpu.model().to_string(),
        vram_mb: Some(total_mb),
        temperature_c: Some(temp_c),
        utilization_pct: Some(info.load_pct() as f64),
        memory_used_mb: Some(info.used_vram() / MIB),
        memory_total_mb: Some(total_mb),
    };

    Ok(vec![metrics])
}
