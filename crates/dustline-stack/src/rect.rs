//! Axis-aligned binning descriptor for 2-D Cartesian grids.

use dustline_core::DustError;
use serde::{Deserialize, Serialize};

/// Binning descriptor for a 2-D rectangular grid.
///
/// Axis 0 is distance modulus, axis 1 is reddening. The descriptor is
/// immutable once constructed; `dx` is derived from the extent and bin
/// counts at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect2D {
    min: [f64; 2],
    max: [f64; 2],
    n_bins: [usize; 2],
    dx: [f64; 2],
}

impl Rect2D {
    /// Builds a descriptor from per-axis bounds and bin counts.
    ///
    /// Requires `n_bins[a] >= 1` and finite `max[a] > min[a]` on both axes.
    pub fn new(min: [f64; 2], max: [f64; 2], n_bins: [usize; 2]) -> Result<Self, DustError> {
        for axis in 0..2 {
            if n_bins[axis] == 0 {
                return Err(DustError::stack(
                    "rect-bins",
                    format!("axis {axis} must have at least one bin"),
                ));
            }
            if !min[axis].is_finite() || !max[axis].is_finite() || max[axis] <= min[axis] {
                return Err(DustError::stack(
                    "rect-extent",
                    format!(
                        "axis {axis} extent [{}, {}] must be finite with max > min",
                        min[axis], max[axis]
                    ),
                ));
            }
        }
        let dx = [
            (max[0] - min[0]) / n_bins[0] as f64,
            (max[1] - min[1]) / n_bins[1] as f64,
        ];
        Ok(Self {
            min,
            max,
            n_bins,
            dx,
        })
    }

    /// Lower bound of the grid along `axis`.
    pub fn min(&self, axis: usize) -> f64 {
        self.min[axis]
    }

    /// Upper bound of the grid along `axis`.
    pub fn max(&self, axis: usize) -> f64 {
        self.max[axis]
    }

    /// Number of bins along `axis`.
    pub fn n_bins(&self, axis: usize) -> usize {
        self.n_bins[axis]
    }

    /// Bin width along `axis`.
    pub fn dx(&self, axis: usize) -> f64 {
        self.dx[axis]
    }

    /// Maps a continuous coordinate to a fractional bin index along `axis`.
    ///
    /// Out-of-range values are not clamped; callers that walk the grid must
    /// check bounds themselves.
    pub fn frac_index(&self, axis: usize, value: f64) -> f64 {
        (value - self.min[axis]) / self.dx[axis]
    }
}
