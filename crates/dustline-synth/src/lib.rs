#![deny(missing_docs)]

//! Synthetic stellar catalog generation.
//!
//! Composes 1-D inverse-CDF drawers over the galactic line-of-sight prior,
//! stellar SED libraries, and an extinction law to synthesize per-star
//! photometry with realistic detection cuts. The generated catalogs feed
//! the same posterior-surface pipeline as real survey data, giving the
//! extinction sampler controlled inputs with known ground truth.

/// Catalog records and the generation loops.
pub mod catalog;
/// 1-D inverse-CDF drawer.
pub mod draw;
/// Collaborator traits and photometric constants.
pub mod models;

pub use catalog::{emp_draw, synth_draw, Magnitudes, StellarCatalog, SynthOptions};
pub use draw::Draw1D;
pub use models::{
    Component, EmpiricalSedLibrary, ExtinctionLaw, GalacticLosModel, Sed, SyntheticSedLibrary,
    NBANDS,
};
