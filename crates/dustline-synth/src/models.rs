use serde::{Deserialize, Serialize};

/// Number of photometric bands carried by every catalog entry.
pub const NBANDS: usize = 5;

/// Per-band absolute magnitudes of one stellar template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sed {
    /// Absolute magnitude in each band.
    pub absmag: [f64; NBANDS],
}

/// Galactic component a star is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    /// Thin/thick disk population.
    Disk,
    /// Stellar halo population.
    Halo,
}

/// Line-of-sight galactic prior model.
///
/// Supplies the per-component stellar density and population priors along
/// one sight line. Implementations live outside this crate; the generator
/// only evaluates them pointwise through [`crate::Draw1D`].
pub trait GalacticLosModel {
    /// Log differential star count per unit distance modulus.
    fn log_dn_dmu(&self, dm: f64) -> f64;

    /// Fraction of stars belonging to the halo at distance modulus `dm`.
    fn f_halo(&self, dm: f64) -> f64;

    /// Initial-mass-function density at `log_mass` for a component.
    fn imf(&self, log_mass: f64, component: Component) -> f64;

    /// Star-formation-rate density at age `tau` (years) for a component.
    fn sfr(&self, tau: f64, component: Component) -> f64;

    /// Metallicity prior density at `feh` for a component at `dm`.
    fn p_feh(&self, dm: f64, feh: f64, component: Component) -> f64;

    /// Galactic coordinates `(l, b)` of the sight line, in degrees.
    fn coords(&self) -> (f64, f64);
}

/// SED library indexed by physical stellar parameters.
pub trait SyntheticSedLibrary {
    /// Template magnitudes for `(log_mass, log_tau, feh)`, or `None` when
    /// the library holds no such star.
    fn sed(&self, log_mass: f64, log_tau: f64, feh: f64) -> Option<Sed>;
}

/// SED library indexed by absolute magnitude and metallicity.
pub trait EmpiricalSedLibrary {
    /// Template magnitudes for `(mr, feh)`, or `None` when the library
    /// holds no such star.
    fn sed(&self, mr: f64, feh: f64) -> Option<Sed>;

    /// Log luminosity function evaluated at absolute magnitude `mr`.
    fn log_luminosity(&self, mr: f64) -> f64;
}

/// Extinction law giving per-band extinction per unit reddening.
pub trait ExtinctionLaw {
    /// Extinction coefficient `A_k / E(B-V)` for band `k` at ratio `rv`.
    fn coefficient(&self, rv: f64, band: usize) -> f64;
}
