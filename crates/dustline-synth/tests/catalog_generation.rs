use dustline_synth::{
    emp_draw, synth_draw, Component, EmpiricalSedLibrary, ExtinctionLaw, GalacticLosModel, Sed,
    SynthOptions, SyntheticSedLibrary, NBANDS,
};

struct FlatSightLine;

impl GalacticLosModel for FlatSightLine {
    fn log_dn_dmu(&self, dm: f64) -> f64 {
        // Peaks near dm = 12 so the empirical step profile saturates.
        -(dm - 12.0) * (dm - 12.0)
    }

    fn f_halo(&self, _dm: f64) -> f64 {
        0.0
    }

    fn imf(&self, _log_mass: f64, _component: Component) -> f64 {
        1.0
    }

    fn sfr(&self, _tau: f64, _component: Component) -> f64 {
        1.0
    }

    fn p_feh(&self, _dm: f64, _feh: f64, _component: Component) -> f64 {
        1.0
    }

    fn coords(&self) -> (f64, f64) {
        (90.0, 10.0)
    }
}

struct ConstLibrary;

impl SyntheticSedLibrary for ConstLibrary {
    fn sed(&self, _log_mass: f64, _log_tau: f64, _feh: f64) -> Option<Sed> {
        Some(Sed { absmag: [0.0; NBANDS] })
    }
}

impl EmpiricalSedLibrary for ConstLibrary {
    fn sed(&self, _mr: f64, _feh: f64) -> Option<Sed> {
        Some(Sed { absmag: [0.0; NBANDS] })
    }

    fn log_luminosity(&self, _mr: f64) -> f64 {
        0.0
    }
}

struct GrayLaw;

impl ExtinctionLaw for GrayLaw {
    fn coefficient(&self, _rv: f64, _band: usize) -> f64 {
        0.0
    }
}

fn deep_options(n_stars: usize) -> SynthOptions {
    SynthOptions {
        n_stars,
        rv: 3.1,
        mag_limit: [30.0; NBANDS],
        samples: 500,
        master_seed: 1234,
    }
}

#[test]
fn synth_draw_fills_the_catalog_in_order() {
    let catalog = synth_draw(&deep_options(20), &FlatSightLine, &ConstLibrary, &GrayLaw).unwrap();
    assert_eq!(catalog.len(), 20);
    assert_eq!(catalog.l, 90.0);
    assert_eq!(catalog.b, 10.0);
    for (i, star) in catalog.stars.iter().enumerate() {
        assert_eq!(star.obj_id, i as u64);
        for k in 0..NBANDS {
            assert!(star.mag[k].is_finite());
            assert!(star.err[k] >= 0.02);
            assert!(star.mag[k] <= 30.0 || k > 0);
        }
    }
}

#[test]
fn emp_draw_uses_the_step_reddening_profile() {
    let catalog = emp_draw(&deep_options(10), &FlatSightLine, &ConstLibrary, &GrayLaw).unwrap();
    assert_eq!(catalog.len(), 10);
    for star in &catalog.stars {
        // Gray extinction and zero-template: observed magnitudes sit at
        // the drawn distance modulus, peaked near 12 by the prior.
        assert!(star.mag[0] > 0.0 && star.mag[0] < 25.0);
    }
}
