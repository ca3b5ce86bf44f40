use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::fault::FaultLine;
use crate::grid::{ElevationGrid, Grid};
use crate::rng::Rng;

/// Minimum wall-clock gap between two progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(150);

/// Run fault formation.
///
/// `is_cancelled` is polled before every iteration; once it returns true the run
/// stops and `None` is returned, the partial grid is dropped. Progress goes to
/// `on_progress` as a fraction in [0, 1), throttled to `PROGRESS_INTERVAL`,
/// followed by a final `0.0` once the grid is complete.
pub fn generate(
    config: &GenerationConfig,
    mut on_progress: impl FnMut(f32),
    is_cancelled: impl Fn() -> bool,
) -> Option<ElevationGrid> {
    let start = Instant::now();
    let mut rng = Rng::new(config.random_seed as u64);
    let mut grid = Grid::filled(config.width, config.height, config.base_elevation);
    let delta = config.elevation_delta as i32;

    let mut last_report = Instant::now();
    for i in 0..config.iterations_num {
        if is_cancelled() {
            debug!(iteration = i, "generation cancelled");
            return None;
        }

        if last_report.elapsed() > PROGRESS_INTERVAL {
            on_progress(i as f32 / config.iterations_num as f32);
            last_report = Instant::now();
        }

        FaultLine::draw(&mut rng, config.width, delta).apply(&mut grid);
    }

    on_progress(0.0);
    info!(
        iterations = config.iterations_num,
        seed = config.random_seed,
        ms = start.elapsed().as_secs_f64() * 1000.0,
        "surface generated"
    );
    Some(grid)
}

/// A single background generation run. Dropping the worker cancels it.
pub struct GenerationWorker {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<Option<ElevationGrid>>>,
}

impl GenerationWorker {
    /// Spawn `generate` on its own thread.
    pub fn spawn(
        config: GenerationConfig,
        on_progress: impl Fn(f32) + Send + 'static,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = std::thread::spawn(move || {
            generate(&config, on_progress, || flag.load(Ordering::Relaxed))
        });
        Self {
            cancelled,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Block until the run ends. `None` if it was cancelled or already taken.
    pub fn wait(&mut self) -> Option<ElevationGrid> {
        let handle = self.handle.take()?;
        // A panicking run has no grid to hand over.
        let grid = handle.join().ok().flatten()?;
        if self.cancelled.load(Ordering::Relaxed) {
            return None;
        }
        Some(grid)
    }

    /// Take the grid if the run has finished, without blocking.
    pub fn try_take(&mut self) -> Option<ElevationGrid> {
        if self.is_finished() { self.wait() } else { None }
    }

    /// Signal cancellation and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
