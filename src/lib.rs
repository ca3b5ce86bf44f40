pub mod config;
pub mod error;
pub mod fault;
pub mod generator;
pub mod grid;
pub mod metadata;
pub mod palette;
pub mod rng;
pub mod session;

use std::time::Instant;

use image::RgbImage;

use config::GenerationConfig;
use grid::ElevationGrid;
use palette::GradientPalette;

pub struct Surface {
    pub w: usize,
    pub h: usize,
    pub elevation: ElevationGrid,
    pub rgb: RgbImage,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Generate and colorize in one blocking call. `None` if cancelled.
pub fn build_surface(
    config: &GenerationConfig,
    palette: &GradientPalette,
    on_progress: impl FnMut(f32),
    is_cancelled: impl Fn() -> bool,
) -> Option<(Surface, Vec<Timing>)> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Fault formation
    let t = Instant::now();
    let elevation = generator::generate(config, on_progress, is_cancelled)?;
    timings.push(Timing {
        name: "faults",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Colorize through the palette table
    let t = Instant::now();
    let rgb = palette.colorize(&elevation);
    timings.push(Timing {
        name: "colorize",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    let surface = Surface {
        w: elevation.w,
        h: elevation.h,
        elevation,
        rgb,
    };

    Some((surface, timings))
}
