use dustline_core::{DustError, RngHandle};
use rand::Rng;
use rand_distr::{ChiSquared, Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::draw::Draw1D;
use crate::models::{
    Component, EmpiricalSedLibrary, ExtinctionLaw, GalacticLosModel, SyntheticSedLibrary, NBANDS,
};

/// `ln sqrt(2 pi)`, the per-band Gaussian normalization.
const GAUSS_LN_NORM: f64 = 0.918_938_533_204_672_7;

/// Distance-modulus domain of the prior drawer.
const DM_RANGE: (f64, f64) = (0.0, 25.0);
/// Log-mass domain of the IMF drawers.
const LOG_MASS_RANGE: (f64, f64) = (-0.9, 1.1);
/// Stellar age domain of the SFR drawers, in years.
const TAU_RANGE: (f64, f64) = (1.0e6, 13.0e9);
/// Metallicity domain of the [Fe/H] drawers.
const FEH_RANGE: (f64, f64) = (-2.5, 1.0);
/// Distance moduli at which the component metallicity priors are evaluated.
const FEH_DISK_DM: f64 = 5.0;
const FEH_HALO_DM: f64 = 23.0;

/// Observed per-band photometry of one catalog star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnitudes {
    /// Catalog object identifier.
    pub obj_id: u64,
    /// Galactic longitude of the sight line, degrees.
    pub l: f64,
    /// Galactic latitude of the sight line, degrees.
    pub b: f64,
    /// Observed apparent magnitude per band.
    pub mag: [f64; NBANDS],
    /// Magnitude uncertainty per band.
    pub err: [f64; NBANDS],
    /// Gaussian log-likelihood normalization for this star's errors.
    pub ln_l_norm: f64,
}

impl Magnitudes {
    /// Builds an entry, caching the Gaussian likelihood normalization.
    pub fn new(obj_id: u64, l: f64, b: f64, mag: [f64; NBANDS], err: [f64; NBANDS]) -> Self {
        let mut ln_l_norm = NBANDS as f64 * GAUSS_LN_NORM;
        for e in &err {
            ln_l_norm += e.ln();
        }
        Self {
            obj_id,
            l,
            b,
            mag,
            err,
            ln_l_norm,
        }
    }

    /// Builds an entry with `floor` folded into every band error in
    /// quadrature, the way survey catalogs are loaded.
    pub fn with_error_floor(
        obj_id: u64,
        l: f64,
        b: f64,
        mag: [f64; NBANDS],
        err: [f64; NBANDS],
        floor: f64,
    ) -> Self {
        let mut padded = err;
        for e in &mut padded {
            *e = (*e * *e + floor * floor).sqrt();
        }
        Self::new(obj_id, l, b, mag, padded)
    }
}

/// A generated catalog of detected stars along one sight line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StellarCatalog {
    /// Galactic longitude of the sight line, degrees.
    pub l: f64,
    /// Galactic latitude of the sight line, degrees.
    pub b: f64,
    /// Detected stars in generation order.
    pub stars: Vec<Magnitudes>,
}

impl StellarCatalog {
    /// Creates an empty catalog for a sight line.
    pub fn new(l: f64, b: f64) -> Self {
        Self {
            l,
            b,
            stars: Vec::new(),
        }
    }

    /// Number of stars in the catalog.
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    /// Whether the catalog holds no stars.
    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

/// Knobs for one catalog generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthOptions {
    /// Number of detected stars to generate.
    pub n_stars: usize,
    /// Extinction ratio `R_V` passed to the extinction law.
    pub rv: f64,
    /// Detection limit per band.
    pub mag_limit: [f64; NBANDS],
    /// Knot count of every inverse-CDF drawer.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Master seed for the generation RNG.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
}

fn default_samples() -> usize {
    1000
}

fn default_master_seed() -> u64 {
    0x5747_A105_D057_5EED_u64
}

/// Generates a catalog from the physical-parameter SED library.
///
/// Per candidate star: reddening is drawn from a chi-squared distribution
/// with one degree of freedom, distance modulus from the line-of-sight
/// prior, the component by the halo fraction at that distance, and stellar
/// parameters from the component's IMF/SFR/metallicity priors, resampling
/// until the library holds a matching SED. Candidates failing the
/// detection cut are discarded and redrawn until `n_stars` survive.
pub fn synth_draw<G, L, X>(
    options: &SynthOptions,
    gal_model: &G,
    library: &L,
    extinction: &X,
) -> Result<StellarCatalog, DustError>
where
    G: GalacticLosModel,
    L: SyntheticSedLibrary,
    X: ExtinctionLaw,
{
    let samples = options.samples;
    let draw_dm = Draw1D::new(
        |dm| gal_model.log_dn_dmu(dm),
        DM_RANGE.0,
        DM_RANGE.1,
        samples,
        true,
    )?;
    let draw_log_mass_disk = Draw1D::new(
        |m| gal_model.imf(m, Component::Disk),
        LOG_MASS_RANGE.0,
        LOG_MASS_RANGE.1,
        samples,
        false,
    )?;
    let draw_log_mass_halo = Draw1D::new(
        |m| gal_model.imf(m, Component::Halo),
        LOG_MASS_RANGE.0,
        LOG_MASS_RANGE.1,
        samples,
        false,
    )?;
    let draw_tau_disk = Draw1D::new(
        |tau| gal_model.sfr(tau, Component::Disk),
        TAU_RANGE.0,
        TAU_RANGE.1,
        samples,
        false,
    )?;
    let draw_tau_halo = Draw1D::new(
        |tau| gal_model.sfr(tau, Component::Halo),
        TAU_RANGE.0,
        TAU_RANGE.1,
        samples,
        false,
    )?;
    let draw_feh_disk = Draw1D::new(
        |feh| gal_model.p_feh(FEH_DISK_DM, feh, Component::Disk),
        FEH_RANGE.0,
        FEH_RANGE.1,
        samples,
        false,
    )?;
    let draw_feh_halo = Draw1D::new(
        |feh| gal_model.p_feh(FEH_HALO_DM, feh, Component::Halo),
        FEH_RANGE.0,
        FEH_RANGE.1,
        samples,
        false,
    )?;
    let chi_squared = ChiSquared::new(1.0)
        .map_err(|err| DustError::draw("draw-chi-squared", err.to_string()))?;

    let (l, b) = gal_model.coords();
    let mut catalog = StellarCatalog::new(l, b);
    let mut rng = RngHandle::from_seed(options.master_seed);

    for obj_id in 0..options.n_stars as u64 {
        let star = loop {
            let ebv: f64 = chi_squared.sample(rng.inner_mut());
            let dm = draw_dm.sample(&mut rng);
            let component = if rng.uniform() < gal_model.f_halo(dm) {
                Component::Halo
            } else {
                Component::Disk
            };
            let sed = loop {
                let (log_mass, log_tau, feh) = match component {
                    Component::Halo => (
                        draw_log_mass_halo.sample(&mut rng),
                        draw_tau_halo.sample(&mut rng).log10(),
                        draw_feh_halo.sample(&mut rng),
                    ),
                    Component::Disk => (
                        draw_log_mass_disk.sample(&mut rng),
                        draw_tau_disk.sample(&mut rng).log10(),
                        draw_feh_disk.sample(&mut rng),
                    ),
                };
                if let Some(sed) = library.sed(log_mass, log_tau, feh) {
                    break sed;
                }
            };
            if let Some((mag, err)) = observe(
                &sed.absmag,
                dm,
                ebv,
                options.rv,
                extinction,
                &options.mag_limit,
                false,
                &mut rng,
            ) {
                debug!(obj_id, ?component, ebv, dm, "synthesized star");
                break Magnitudes::new(obj_id, l, b, mag, err);
            }
        };
        catalog.stars.push(star);
    }

    Ok(catalog)
}

/// Generates a catalog from the empirical SED library.
///
/// The empirical variant draws `(M_r, [Fe/H])` instead of physical
/// parameters, replaces the chi-squared reddening with a fixed step
/// profile in distance, and caps the per-band noise at 1.5 magnitudes.
pub fn emp_draw<G, L, X>(
    options: &SynthOptions,
    gal_model: &G,
    library: &L,
    extinction: &X,
) -> Result<StellarCatalog, DustError>
where
    G: GalacticLosModel,
    L: EmpiricalSedLibrary,
    X: ExtinctionLaw,
{
    let samples = options.samples;
    let draw_dm = Draw1D::new(
        |dm| gal_model.log_dn_dmu(dm),
        DM_RANGE.0,
        DM_RANGE.1,
        samples,
        true,
    )?;
    let draw_feh_disk = Draw1D::new(
        |feh| gal_model.p_feh(FEH_DISK_DM, feh, Component::Disk),
        FEH_RANGE.0,
        FEH_RANGE.1,
        samples,
        false,
    )?;
    let draw_feh_halo = Draw1D::new(
        |feh| gal_model.p_feh(FEH_HALO_DM, feh, Component::Halo),
        FEH_RANGE.0,
        FEH_RANGE.1,
        samples,
        false,
    )?;
    let draw_mr = Draw1D::new(
        |mr| library.log_luminosity(mr),
        -1.0,
        options.mag_limit[1],
        samples,
        true,
    )?;

    let (l, b) = gal_model.coords();
    let mut catalog = StellarCatalog::new(l, b);
    let mut rng = RngHandle::from_seed(options.master_seed);

    for obj_id in 0..options.n_stars as u64 {
        let star = loop {
            let dm = draw_dm.sample(&mut rng);
            // Step-function reddening profile with known ground truth.
            let mut ebv = 0.0;
            if dm > 5.0 {
                ebv += 0.5;
            }
            if dm > 10.0 {
                ebv += 3.5;
            }
            let component = if rng.uniform() < gal_model.f_halo(dm) {
                Component::Halo
            } else {
                Component::Disk
            };
            let sed = loop {
                let feh = match component {
                    Component::Halo => draw_feh_halo.sample(&mut rng),
                    Component::Disk => draw_feh_disk.sample(&mut rng),
                };
                let mr = draw_mr.sample(&mut rng);
                if let Some(sed) = library.sed(mr, feh) {
                    break sed;
                }
            };
            if let Some((mag, err)) = observe(
                &sed.absmag,
                dm,
                ebv,
                options.rv,
                extinction,
                &options.mag_limit,
                true,
                &mut rng,
            ) {
                debug!(obj_id, ?component, ebv, dm, "synthesized star");
                break Magnitudes::new(obj_id, l, b, mag, err);
            }
        };
        catalog.stars.push(star);
    }

    Ok(catalog)
}

/// Reddens, shifts, and noises a template, applying the detection cut.
///
/// Detection requires the first band below its limit and at most one other
/// band above its limit. The noise model scales with depth below the
/// detection limit; `cap_noise` clamps the stddev at 1.5 magnitudes.
#[allow(clippy::too_many_arguments)]
fn observe<X: ExtinctionLaw>(
    absmag: &[f64; NBANDS],
    dm: f64,
    ebv: f64,
    rv: f64,
    extinction: &X,
    mag_limit: &[f64; NBANDS],
    cap_noise: bool,
    rng: &mut RngHandle,
) -> Option<([f64; NBANDS], [f64; NBANDS])> {
    let mut mag = [0.0; NBANDS];
    let mut err = [0.0; NBANDS];
    let mut missed = 0u32;
    for k in 0..NBANDS {
        mag[k] = absmag[k] + dm + ebv * extinction.coefficient(rv, k);
        err[k] = 0.02 + 0.1 * (mag[k] - mag_limit[k] - 1.5).exp();
        if cap_noise && err[k] > 1.5 {
            err[k] = 1.5;
        }
        let noise: f64 = rng.inner_mut().sample(StandardNormal);
        mag[k] += err[k] * noise;

        if mag[k] > mag_limit[k] {
            missed += 1;
            if k == 0 || missed > 1 {
                return None;
            }
        }
    }
    Some((mag, err))
}
