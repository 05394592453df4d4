use dustline_core::{DustError, RngHandle};
use dustline_stack::{ImgStack, Rect2D};

use crate::target::Target;

/// Read-only parameters consumed by the line-of-sight posterior.
///
/// Borrows the populated surface stack; the stack must outlive the sampler
/// run. `p0` is the per-pixel likelihood floor (typically around `1e-6`)
/// and `ebv_max` is a soft ceiling on total reddening, with `0` disabling
/// the ceiling prior.
#[derive(Debug, Clone)]
pub struct LosParams<'a> {
    stack: &'a ImgStack,
    p0: f64,
    ln_p0: f64,
    ebv_max: f64,
}

impl<'a> LosParams<'a> {
    /// Builds posterior parameters over a populated stack.
    pub fn new(stack: &'a ImgStack, p0: f64, ebv_max: f64) -> Result<Self, DustError> {
        if !(p0.is_finite() && p0 > 0.0) {
            return Err(DustError::posterior(
                "params-p0",
                format!("likelihood floor {p0} must be finite and positive"),
            ));
        }
        if !(ebv_max.is_finite() && ebv_max >= 0.0) {
            return Err(DustError::posterior(
                "params-ebv-max",
                format!("reddening ceiling {ebv_max} must be finite and >= 0"),
            ));
        }
        Ok(Self {
            stack,
            p0,
            ln_p0: p0.ln(),
            ebv_max,
        })
    }

    /// Replaces the likelihood floor, refreshing the cached logarithm.
    pub fn set_p0(&mut self, p0: f64) -> Result<(), DustError> {
        if !(p0.is_finite() && p0 > 0.0) {
            return Err(DustError::posterior(
                "params-p0",
                format!("likelihood floor {p0} must be finite and positive"),
            ));
        }
        self.p0 = p0;
        self.ln_p0 = p0.ln();
        Ok(())
    }

    /// The per-pixel likelihood floor.
    pub fn p0(&self) -> f64 {
        self.p0
    }

    /// Cached `ln(p0)`.
    pub fn ln_p0(&self) -> f64 {
        self.ln_p0
    }

    /// Soft ceiling on total reddening (`0` disables the ceiling prior).
    pub fn ebv_max(&self) -> f64 {
        self.ebv_max
    }

    /// The borrowed surface stack.
    pub fn stack(&self) -> &'a ImgStack {
        self.stack
    }
}

/// Sums bilinear samples of every surface along a piecewise-linear profile.
///
/// `ebv` has length `n_regions + 1`; within region `r` the profile rises
/// linearly from `ebv[r]` to `ebv[r + 1]` across `n_bins(0) / n_regions`
/// distance columns. Sampling interpolates between the two reddening bins
/// bracketing the profile at each column. The moment the profile steps off
/// the reddening axis the integration halts for every remaining column and
/// region, leaving partial sums in `out`.
///
/// Preconditions (programmer errors when violated): the stack carries a
/// grid descriptor, `out` matches the image count, `ebv` has
/// `n_regions + 1` entries, and `n_regions` divides `n_bins(0)`.
pub fn line_integral(stack: &ImgStack, ebv: &[f64], n_regions: usize, out: &mut [f64]) {
    let rect = stack
        .rect()
        .expect("line integral requires the stack's grid descriptor");
    assert_eq!(out.len(), stack.n_images(), "output length per surface");
    assert_eq!(ebv.len(), n_regions + 1, "profile length is n_regions + 1");
    assert!(
        n_regions >= 1 && rect.n_bins(0) % n_regions == 0,
        "region count must divide the distance-bin count"
    );

    let columns_per_region = rect.n_bins(0) / n_regions;
    let y_max = rect.n_bins(1) as isize;

    for value in out.iter_mut() {
        *value = 0.0;
    }

    let mut y = rect.frac_index(1, ebv[0]);
    let mut x = 0usize;
    'regions: for region in 0..n_regions {
        let dy = (ebv[region + 1] - ebv[region]) / columns_per_region as f64 / rect.dx(1);
        for _ in 0..columns_per_region {
            let y_floor = y.floor();
            let y_ceil = y_floor + 1.0;
            if y_ceil as isize >= y_max || (y_floor as isize) < 0 {
                break 'regions;
            }
            let lo = y_floor as usize;
            for (k, img) in stack.images().iter().enumerate() {
                out[k] += (y_ceil - y) * img[[x, lo]] + (y - y_floor) * img[[x, lo + 1]];
            }
            x += 1;
            y += dy;
        }
    }
}

/// Un-normalized log-posterior over monotone reddening profiles.
///
/// A state vector `E` of length `n_regions + 1` holds the cumulative
/// reddening at the near edge (`E[0]`) and at each region boundary; the
/// posterior rejects anything non-monotone, negative, or at or above the
/// grid ceiling, and otherwise scores the soft-floored line integrals
/// through every star's surface.
#[derive(Debug, Clone)]
pub struct LosPosterior<'a> {
    params: LosParams<'a>,
    rect: Rect2D,
    n_regions: usize,
    dim: usize,
}

impl<'a> LosPosterior<'a> {
    /// Threshold multiple of `p0` below which the soft floor engages.
    const FLOOR_KNEE: f64 = 1.0e5;

    /// Builds the posterior for a given region count.
    pub fn new(params: LosParams<'a>, n_regions: usize) -> Result<Self, DustError> {
        if n_regions == 0 {
            return Err(DustError::posterior(
                "regions-zero",
                "the profile needs at least one distance region",
            ));
        }
        let rect = match params.stack().rect() {
            Some(rect) => rect.clone(),
            None => {
                return Err(DustError::posterior(
                    "stack-rect-missing",
                    "the surface stack has no grid descriptor",
                ));
            }
        };
        if rect.n_bins(0) % n_regions != 0 {
            return Err(DustError::posterior(
                "regions-divide",
                format!(
                    "{n_regions} regions cannot split {} distance bins evenly",
                    rect.n_bins(0)
                ),
            ));
        }
        Ok(Self {
            params,
            rect,
            n_regions,
            dim: n_regions + 1,
        })
    }

    /// Number of distance regions in the profile.
    pub fn n_regions(&self) -> usize {
        self.n_regions
    }

    /// The posterior parameters.
    pub fn params(&self) -> &LosParams<'a> {
        &self.params
    }
}

impl Target for LosPosterior<'_> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn ln_posterior(&self, state: &[f64]) -> f64 {
        debug_assert_eq!(state.len(), self.dim);
        let last = state[self.dim - 1];

        // Profile must stay below the grid ceiling and rise monotonically
        // from a nonnegative start.
        if last >= self.rect.max(1) {
            return f64::NEG_INFINITY;
        }
        if state[0] < 0.0 {
            return f64::NEG_INFINITY;
        }
        for pair in state.windows(2) {
            if pair[1] < pair[0] {
                return f64::NEG_INFINITY;
            }
        }

        let stack = self.params.stack();
        let mut line = vec![0.0; stack.n_images()];
        line_integral(stack, state, self.n_regions, &mut line);

        let p0 = self.params.p0();
        let mut ln_p = 0.0;
        for value in &mut line {
            // Soft floor: stars whose surface never meets the profile
            // contribute ln(p0) instead of -inf, while large integrals pass
            // through essentially unchanged.
            if *value < Self::FLOOR_KNEE * p0 {
                *value += p0 * (-*value / p0).exp();
            }
            ln_p += value.ln();
        }

        let ebv_max = self.params.ebv_max();
        if ebv_max > 0.0 && last > ebv_max {
            let excess = (last - ebv_max) / ebv_max;
            ln_p -= 0.5 * excess * excess;
        }

        ln_p
    }

    fn initial_state(&self, rng: &mut RngHandle) -> Vec<f64> {
        let ceiling = self.rect.max(1);
        let mu = ceiling / self.dim as f64;
        let mut state = vec![0.0; self.dim];
        for i in 0..self.dim {
            state[i] = 0.5 * mu * rng.uniform();
            if i > 0 {
                state[i] += state[i - 1];
            }
        }
        if state[self.dim - 1] >= 0.95 * ceiling {
            let factor = 0.9 * ceiling / state[self.dim - 1];
            for value in &mut state {
                *value *= factor;
            }
        }
        state
    }
}
