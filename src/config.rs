use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const IMAGE_WIDTH: usize = 512;
pub const IMAGE_HEIGHT: usize = 256;

pub const MAX_ITERATIONS: u32 = 10_000;
pub const MAX_BASE_ELEVATION: i32 = 255;
pub const MAX_ELEVATION_DELTA: u32 = 10;
pub const MAX_WIDTH: usize = 8192;
pub const MAX_HEIGHT: usize = 4096;

/// Parameters of one fault formation run. Exposed as sliders in a frontend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub iterations_num: u32,
    pub base_elevation: i32,
    pub elevation_delta: u32,
    pub random_seed: u32,

    pub width: usize,
    pub height: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            iterations_num: 2000,
            base_elevation: 100,
            elevation_delta: 2,
            random_seed: 0,
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
        }
    }
}

impl GenerationConfig {
    /// Reject values outside the ranges the generator is meant to run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("iterationsNum", self.iterations_num as i64, 0, MAX_ITERATIONS as i64)?;
        check_range("baseElevation", self.base_elevation as i64, 0, MAX_BASE_ELEVATION as i64)?;
        check_range("elevationDelta", self.elevation_delta as i64, 0, MAX_ELEVATION_DELTA as i64)?;
        check_range("width", self.width as i64, 1, MAX_WIDTH as i64)?;
        check_range("height", self.height as i64, 1, MAX_HEIGHT as i64)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, min, max })
    }
}
