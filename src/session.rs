use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use image::RgbImage;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::ConfigError;
use crate::generator::GenerationWorker;
use crate::grid::ElevationGrid;
use crate::metadata;
use crate::palette::GradientPalette;

/// Everything a frontend holds between events: the palette, the last finished
/// surface and at most one generation in flight.
#[derive(Default)]
pub struct Session {
    palette: GradientPalette,
    surface: Option<(GenerationConfig, Arc<ElevationGrid>)>,
    worker: Option<(GenerationConfig, GenerationWorker)>,
    progress: Arc<AtomicU32>,
}

impl Session {
    pub fn new(palette: GradientPalette) -> Self {
        Self {
            palette,
            ..Default::default()
        }
    }

    /// Start generating `config`, cancelling and joining any run in flight.
    pub fn regenerate(&mut self, config: GenerationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some((old, mut worker)) = self.worker.take() {
            debug!(seed = old.random_seed, "cancelling previous generation");
            worker.stop();
        }

        let progress = Arc::clone(&self.progress);
        progress.store(0f32.to_bits(), Ordering::Relaxed);
        let worker = GenerationWorker::spawn(config.clone(), move |p| {
            progress.store(p.to_bits(), Ordering::Relaxed)
        });
        info!(
            iterations = config.iterations_num,
            seed = config.random_seed,
            "generation started"
        );
        self.worker = Some((config, worker));
        Ok(())
    }

    /// Fraction of the running generation done; 0 when idle.
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.progress.load(Ordering::Relaxed))
    }

    pub fn is_generating(&self) -> bool {
        self.worker.is_some()
    }

    /// Pick up a finished run. Returns true when a new surface was installed.
    pub fn poll(&mut self) -> bool {
        let done = self.worker.as_ref().is_some_and(|(_, w)| w.is_finished());
        done && self.finish()
    }

    /// Block until the current run ends.
    pub fn wait(&mut self) -> bool {
        self.finish()
    }

    pub fn cancel(&mut self) {
        if let Some((_, mut worker)) = self.worker.take() {
            worker.stop();
        }
        self.progress.store(0f32.to_bits(), Ordering::Relaxed);
    }

    fn finish(&mut self) -> bool {
        let Some((config, mut worker)) = self.worker.take() else {
            return false;
        };
        match worker.wait() {
            Some(grid) => {
                self.surface = Some((config, Arc::new(grid)));
                true
            }
            None => false,
        }
    }

    pub fn palette(&self) -> &GradientPalette {
        &self.palette
    }

    /// Palette edits rebuild the table; `image` picks the new colors up without
    /// regenerating the surface.
    pub fn palette_mut(&mut self) -> &mut GradientPalette {
        &mut self.palette
    }

    pub fn grid(&self) -> Option<Arc<ElevationGrid>> {
        self.surface.as_ref().map(|(_, grid)| Arc::clone(grid))
    }

    pub fn config(&self) -> Option<&GenerationConfig> {
        self.surface.as_ref().map(|(config, _)| config)
    }

    pub fn image(&self) -> Option<RgbImage> {
        self.surface
            .as_ref()
            .map(|(_, grid)| self.palette.colorize(grid))
    }

    pub fn metadata(&self) -> Option<Vec<(String, String)>> {
        self.config()
            .map(|config| metadata::to_pairs(config, &self.palette))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u32) -> GenerationConfig {
        GenerationConfig {
            iterations_num: 200,
            random_seed: seed,
            width: 64,
            height: 32,
            ..Default::default()
        }
    }

    #[test]
    fn finished_run_installs_surface() {
        let mut session = Session::default();
        assert!(session.image().is_none());
        session.regenerate(small(1)).unwrap();
        assert!(session.wait());
        assert!(!session.is_generating());
        assert_eq!(session.progress(), 0.0);
        assert_eq!(session.config(), Some(&small(1)));
        assert_eq!(session.image().unwrap().dimensions(), (64, 32));
    }

    #[test]
    fn new_request_replaces_the_one_in_flight() {
        let mut session = Session::default();
        session
            .regenerate(GenerationConfig {
                iterations_num: 10_000,
                ..small(1)
            })
            .unwrap();
        session.regenerate(small(2)).unwrap();
        assert!(session.wait());
        assert_eq!(session.config().map(|c| c.random_seed), Some(2));
    }

    #[test]
    fn cancelled_run_leaves_previous_surface() {
        let mut session = Session::default();
        session.regenerate(small(1)).unwrap();
        session.wait();
        let before = session.grid().unwrap();

        session
            .regenerate(GenerationConfig {
                iterations_num: 10_000,
                ..small(5)
            })
            .unwrap();
        session.cancel();
        assert!(!session.wait());
        assert_eq!(session.grid().unwrap(), before);
    }

    #[test]
    fn palette_edit_recolors_without_regenerating() {
        let mut session = Session::default();
        session.regenerate(small(3)).unwrap();
        session.wait();
        let grid = session.grid().unwrap();
        let grey = session.image().unwrap();

        session.palette_mut().set_node_color(1, [255, 0, 0]).unwrap();
        let red = session.image().unwrap();

        assert!(Arc::ptr_eq(&grid, &session.grid().unwrap()));
        assert_ne!(grey, red);
        assert!(red.pixels().all(|p| p.0[1] == 0 && p.0[2] == 0));
    }

    #[test]
    fn invalid_config_is_rejected_before_start() {
        let mut session = Session::default();
        let bad = GenerationConfig {
            base_elevation: 300,
            ..small(1)
        };
        assert!(session.regenerate(bad).is_err());
        assert!(!session.is_generating());
    }

    #[test]
    fn metadata_follows_current_surface() {
        let mut session = Session::default();
        assert!(session.metadata().is_none());
        session.regenerate(small(8)).unwrap();
        session.wait();
        let pairs = session.metadata().unwrap();
        assert!(pairs.contains(&("randomSeed".to_string(), "8".to_string())));
        assert!(pairs.contains(&("color1".to_string(), "#ffffff".to_string())));
    }
}
