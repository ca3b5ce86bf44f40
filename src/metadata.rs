//! Text key/value pairs that make a saved surface reproducible.
//!
//! Keys are the four generation parameters followed by `color0..colorN` in
//! gradient order, e.g. `randomSeed = 3735928559`, `color1 = #ffffff`.
//! Saved PNGs carry them as tEXt chunks.

use std::io::Cursor;
use std::str::FromStr;

use image::RgbImage;

use crate::config::GenerationConfig;
use crate::error::MetadataError;
use crate::palette::{GradientPalette, to_hex};

const ITERATIONS_NUM: &str = "iterationsNum";
const BASE_ELEVATION: &str = "baseElevation";
const ELEVATION_DELTA: &str = "elevationDelta";
const RANDOM_SEED: &str = "randomSeed";

pub fn to_pairs(config: &GenerationConfig, palette: &GradientPalette) -> Vec<(String, String)> {
    let mut pairs = vec![
        (ITERATIONS_NUM.to_string(), config.iterations_num.to_string()),
        (BASE_ELEVATION.to_string(), config.base_elevation.to_string()),
        (ELEVATION_DELTA.to_string(), config.elevation_delta.to_string()),
        (RANDOM_SEED.to_string(), config.random_seed.to_string()),
    ];
    pairs.extend(
        palette
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, &c)| (format!("color{i}"), to_hex(c))),
    );
    pairs
}

/// Rebuild the config and palette from pairs written by `to_pairs`.
/// Grid size is not recorded and comes back as the default.
pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Result<(GenerationConfig, GradientPalette), MetadataError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let lookup = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_ref())
    };

    let config = GenerationConfig {
        iterations_num: field(&lookup, ITERATIONS_NUM)?,
        base_elevation: field(&lookup, BASE_ELEVATION)?,
        elevation_delta: field(&lookup, ELEVATION_DELTA)?,
        random_seed: field(&lookup, RANDOM_SEED)?,
        ..Default::default()
    };
    config.validate()?;

    let colors: Vec<&str> = (0..)
        .map_while(|i| lookup(&format!("color{i}")))
        .collect();
    let palette = GradientPalette::from_hex(&colors)?;

    Ok((config, palette))
}

fn field<'a, T: FromStr>(
    lookup: &impl Fn(&str) -> Option<&'a str>,
    key: &'static str,
) -> Result<T, MetadataError> {
    let raw = lookup(key).ok_or(MetadataError::MissingKey(key))?;
    raw.trim().parse().map_err(|_| MetadataError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Encode `rgb` as a PNG carrying `pairs` as tEXt chunks, so the file alone
/// is enough to regenerate the surface.
pub fn encode_png(rgb: &RgbImage, pairs: &[(String, String)]) -> Result<Vec<u8>, MetadataError> {
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, rgb.width(), rgb.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    for (key, value) in pairs {
        encoder.add_text_chunk(key.clone(), value.clone())?;
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb.as_raw())?;
    writer.finish()?;
    Ok(buf)
}

/// tEXt chunks of a PNG, in file order.
pub fn read_png_text(bytes: &[u8]) -> Result<Vec<(String, String)>, MetadataError> {
    let reader = png::Decoder::new(Cursor::new(bytes)).read_info()?;
    Ok(reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect())
}

pub fn from_png(bytes: &[u8]) -> Result<(GenerationConfig, GradientPalette), MetadataError> {
    let pairs = read_png_text(bytes)?;
    from_pairs(pairs.as_slice())
}
