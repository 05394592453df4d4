use dustline_core::RngHandle;
use dustline_synth::Draw1D;

#[test]
fn uniform_density_draws_uniformly() {
    let draw = Draw1D::new(|_| 1.0, 0.0, 1.0, 1001, false).unwrap();
    let mut rng = RngHandle::from_seed(271828);
    let n = 10_000;
    let mut values: Vec<f64> = (0..n).map(|_| draw.sample(&mut rng)).collect();
    let mean = values.iter().sum::<f64>() / n as f64;
    assert!((mean - 0.5).abs() < 0.01, "mean {mean}");

    // One-sample Kolmogorov-Smirnov statistic against U(0, 1).
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mut ks: f64 = 0.0;
    for (i, v) in values.iter().enumerate() {
        let ecdf_hi = (i + 1) as f64 / n as f64;
        let ecdf_lo = i as f64 / n as f64;
        ks = ks.max((ecdf_hi - v).abs()).max((v - ecdf_lo).abs());
    }
    assert!(ks < 0.02, "KS statistic {ks}");
}

#[test]
fn linear_density_inverts_to_the_analytic_quantiles() {
    // f(x) = 2x on [0, 1] has CDF x^2, so the p-quantile is sqrt(p).
    let draw = Draw1D::new(|x| 2.0 * x, 0.0, 1.0, 2001, false).unwrap();
    let mut rng = RngHandle::from_seed(9);
    let n = 20_000;
    let mut values: Vec<f64> = (0..n).map(|_| draw.sample(&mut rng)).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for p in [0.1, 0.25, 0.5, 0.75, 0.9] {
        let empirical = values[(p * n as f64) as usize];
        assert!(
            (empirical - p.sqrt()).abs() < 0.02,
            "quantile {p}: {empirical} vs {}",
            p.sqrt()
        );
    }
}
