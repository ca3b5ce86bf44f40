use image::RgbImage;
use rayon::prelude::*;

use crate::error::PaletteError;
use crate::grid::ElevationGrid;

pub type Rgb = [u8; 3];

/// One color per elevation level 0..=255.
pub type ColorTable = [Rgb; LEVELS];

pub const LEVELS: usize = 256;
pub const MIN_NODES: usize = 2;

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];

#[inline]
pub fn lerp_color(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
    ]
}

/// Parse `#rrggbb`.
pub fn parse_hex(s: &str) -> Result<Rgb, PaletteError> {
    let bad = || PaletteError::BadColor(s.to_string());
    let hex = s.strip_prefix('#').ok_or_else(bad)?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

pub fn to_hex(c: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

/// Number of levels each of `segments` gradients gets. Always sums to 256.
pub fn segment_lengths(segments: usize) -> Vec<usize> {
    let boundary = |i: usize| ((LEVELS * i) as f64 / segments as f64).round() as usize;
    (0..segments).map(|i| boundary(i + 1) - boundary(i)).collect()
}

/// Ordered gradient nodes and the color table derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPalette {
    nodes: Vec<Rgb>,
    table: ColorTable,
}

impl Default for GradientPalette {
    fn default() -> Self {
        Self::with_nodes(vec![BLACK, WHITE])
    }
}

impl GradientPalette {
    pub fn from_colors(nodes: Vec<Rgb>) -> Result<Self, PaletteError> {
        if nodes.len() < MIN_NODES {
            return Err(PaletteError::NodeFloor { min: MIN_NODES });
        }
        Ok(Self::with_nodes(nodes))
    }

    fn with_nodes(nodes: Vec<Rgb>) -> Self {
        let mut palette = Self {
            nodes,
            table: [BLACK; LEVELS],
        };
        palette.rebuild();
        palette
    }

    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Result<Self, PaletteError> {
        let nodes = colors
            .iter()
            .map(|c| parse_hex(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_colors(nodes)
    }

    pub fn nodes(&self) -> &[Rgb] {
        &self.nodes
    }

    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    /// Insert `color` between node `after_index` and the next one.
    pub fn insert_node(&mut self, after_index: usize, color: Rgb) -> Result<(), PaletteError> {
        self.check_gap(after_index)?;
        self.nodes.insert(after_index + 1, color);
        self.rebuild();
        Ok(())
    }

    /// Split the gradient after `after_index` with the halfway color of its ends.
    pub fn insert_midpoint(&mut self, after_index: usize) -> Result<Rgb, PaletteError> {
        self.check_gap(after_index)?;
        let color = lerp_color(self.nodes[after_index], self.nodes[after_index + 1], 0.5);
        self.insert_node(after_index, color)?;
        Ok(color)
    }

    pub fn remove_node(&mut self, index: usize) -> Result<Rgb, PaletteError> {
        self.check_index(index)?;
        if self.nodes.len() <= MIN_NODES {
            return Err(PaletteError::NodeFloor { min: MIN_NODES });
        }
        let removed = self.nodes.remove(index);
        self.rebuild();
        Ok(removed)
    }

    pub fn set_node_color(&mut self, index: usize, color: Rgb) -> Result<(), PaletteError> {
        self.check_index(index)?;
        self.nodes[index] = color;
        self.rebuild();
        Ok(())
    }

    /// Recompute the color table from the node sequence.
    pub fn rebuild(&mut self) -> &ColorTable {
        let mut table = [BLACK; LEVELS];
        let mut level = 0;
        for (pair, len) in self.nodes.windows(2).zip(segment_lengths(self.nodes.len() - 1)) {
            let (start, finish) = (pair[0], pair[1]);
            for k in 0..len {
                table[level] = if len > 1 {
                    lerp_color(start, finish, k as f32 / (len - 1) as f32)
                } else {
                    start
                };
                level += 1;
            }
        }
        debug_assert_eq!(level, LEVELS);
        self.table = table;
        &self.table
    }

    /// Map every cell through the table, saturating to 0..=255.
    pub fn colorize(&self, grid: &ElevationGrid) -> RgbImage {
        colorize(grid, &self.table)
    }

    fn check_index(&self, index: usize) -> Result<(), PaletteError> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(PaletteError::IndexOutOfRange {
                index,
                len: self.nodes.len(),
            })
        }
    }

    fn check_gap(&self, after_index: usize) -> Result<(), PaletteError> {
        // There must be a node on both sides of the new one.
        if after_index + 1 < self.nodes.len() {
            Ok(())
        } else {
            Err(PaletteError::IndexOutOfRange {
                index: after_index,
                len: self.nodes.len(),
            })
        }
    }
}

pub fn colorize(grid: &ElevationGrid, table: &ColorTable) -> RgbImage {
    let w = grid.w;
    let mut img = RgbImage::new(grid.w as u32, grid.h as u32);

    img.par_chunks_mut(w * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, &elev) in grid.row(y).iter().enumerate() {
                let color = table[elev.clamp(0, 255) as usize];
                row[x * 3..x * 3 + 3].copy_from_slice(&color);
            }
        });

    img
}
