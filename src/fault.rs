use rayon::prelude::*;

use crate::grid::{ElevationGrid, wrap_x};
use crate::rng::Rng;

/// One random split of the surface.
///
/// `line0` and `line1` hold the (top, bottom) x-coordinates of the two edges of
/// the quadrilateral that receives `lower`; everything else receives `raise`.
/// `line1` always lies strictly right of `line0`, so the band spans between 1
/// and `w` columns and may run past the right edge. The part past the edge is
/// drawn again shifted left by `w`, which keeps the surface seamless in x.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultLine {
    pub line0: (i64, i64),
    pub line1: (i64, i64),
    pub raise: i32,
    pub lower: i32,
}

impl FaultLine {
    /// Draw order matters for reproducibility: side, line0, line1.
    pub fn draw(rng: &mut Rng, w: usize, delta: i32) -> Self {
        let (raise, lower) = if rng.randint(1, 2) == 1 {
            (delta, -delta)
        } else {
            (-delta, delta)
        };

        let w = w as i64;
        let top0 = rng.randint(0, w);
        let bottom0 = rng.randint(0, w);
        let top1 = rng.randint(0, w - 1) + top0 + 1;
        let bottom1 = rng.randint(0, w - 1) + bottom0 + 1;

        Self {
            line0: (top0, bottom0),
            line1: (top1, bottom1),
            raise,
            lower,
        }
    }

    /// Closed column range of the unwrapped band on row `y` of `h` rows.
    /// Edges are interpolated exactly and rounded inward.
    pub fn span(&self, y: usize, h: usize) -> (i64, i64) {
        let (y, h) = (y as i64, h as i64);
        let left = self.line0.0 * (h - y) + self.line0.1 * y;
        let right = self.line1.0 * (h - y) + self.line1.1 * y;
        ((left + h - 1) / h, right / h)
    }

    /// Add this fault's contribution to one row.
    pub fn apply_row(&self, row: &mut [i32], y: usize, h: usize) {
        let w = row.len() as i64;
        let (lo, hi) = self.span(y, h);
        // Both copies fill, they don't stack: cap at one full turn.
        let end = hi.min(lo + w - 1).min(2 * w - 1);

        for v in row.iter_mut() {
            *v += self.raise;
        }
        let flip = self.lower - self.raise;
        for x in lo..=end {
            row[wrap_x(x, row.len())] += flip;
        }
    }

    pub fn apply(&self, grid: &mut ElevationGrid) {
        let (w, h) = (grid.w, grid.h);
        grid.data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| self.apply_row(row, y, h));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    const W: usize = 64;
    const H: usize = 32;

    fn covered(fault: &FaultLine, y: usize) -> Vec<bool> {
        let mut row = vec![0i32; W];
        fault.apply_row(&mut row, y, H);
        row.iter().map(|&v| v == fault.lower).collect()
    }

    #[test]
    fn draws_stay_in_documented_ranges() {
        let mut rng = Rng::new(3);
        for _ in 0..1000 {
            let f = FaultLine::draw(&mut rng, W, 2);
            let w = W as i64;
            assert!((0..=w).contains(&f.line0.0));
            assert!((0..=w).contains(&f.line0.1));
            assert!((1..=w).contains(&(f.line1.0 - f.line0.0)));
            assert!((1..=w).contains(&(f.line1.1 - f.line0.1)));
            assert_eq!(f.raise, -f.lower);
            assert_eq!(f.raise.abs(), 2);
        }
    }

    #[test]
    fn every_cell_gets_exactly_one_delta() {
        let mut rng = Rng::new(11);
        for _ in 0..200 {
            let f = FaultLine::draw(&mut rng, W, 3);
            let mut g = Grid::filled(W, H, 0i32);
            f.apply(&mut g);
            assert!(g.data.iter().all(|&v| v == 3 || v == -3));
        }
    }

    #[test]
    fn band_is_one_arc_around_the_cylinder() {
        let mut rng = Rng::new(99);
        for _ in 0..300 {
            let f = FaultLine::draw(&mut rng, W, 1);
            for y in 0..H {
                let cov = covered(&f, y);
                assert!(cov.iter().any(|&c| c), "band never empty");
                // Count rising edges cyclically; a single arc has at most one.
                let rises = (0..W).filter(|&x| cov[x] && !cov[(x + W - 1) % W]).count();
                assert!(rises <= 1, "band split on row {y}: {f:?}");
            }
        }
    }

    #[test]
    fn overflowing_band_wraps_to_left_edge() {
        let f = FaultLine {
            line0: (60, 60),
            line1: (70, 70),
            raise: 1,
            lower: -1,
        };
        let cov = covered(&f, 0);
        assert!(cov[60] && cov[63]);
        assert!(cov[0] && cov[6]);
        assert!(!cov[7] && !cov[59]);
    }

    #[test]
    fn full_width_band_covers_row_once() {
        let f = FaultLine {
            line0: (0, 0),
            line1: (W as i64, W as i64),
            raise: 2,
            lower: -2,
        };
        let mut row = vec![0i32; W];
        f.apply_row(&mut row, 5, H);
        assert!(row.iter().all(|&v| v == -2));
    }
}
