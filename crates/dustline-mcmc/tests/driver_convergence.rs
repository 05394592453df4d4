use dustline_mcmc::{
    sample_los_extinction, ChainPayload, DriverConfig, EnsembleSampler, JsonChainSink, LosParams,
    LosPosterior, McmcOptions, SamplerConfig,
};
use dustline_stack::{ImgStack, Rect2D};
use ndarray::Array2;

fn blob_stack() -> ImgStack {
    // One broad Gaussian blob per star, peaked mid-grid so the posterior is
    // smooth and unimodal.
    let rect = Rect2D::new([0.0, 0.0], [16.0, 8.0], [16, 16]).unwrap();
    let mut stack = ImgStack::new_with_rect(2, rect);
    for i in 0..2 {
        let surface = Array2::from_shape_fn((16, 16), |(x, y)| {
            let dx = x as f64 - 8.0;
            let dy = y as f64 - 6.0;
            (-(dx * dx + dy * dy) / 32.0).exp()
        });
        stack.set_image(i, surface);
    }
    stack
}

#[test]
fn driver_converges_and_persists_a_monotone_chain() {
    let stack = blob_stack();
    let dir = tempfile::tempdir().unwrap();
    let mut sink = JsonChainSink::new(dir.path());
    let config = DriverConfig {
        options: McmcOptions {
            steps: 600,
            samplers_per_dim: 8,
            n_threads: 2,
            master_seed: 314159,
        },
        ..DriverConfig::default()
    };

    let group = "/pixel 512/los extinction";
    let report = sample_los_extinction(&stack, 4, 1.0e-6, 0.0, &config, &mut sink, group).unwrap();

    assert!(report.converged, "gelman-rubin {:?}", report.gelman_rubin);
    assert_eq!(report.gelman_rubin.len(), 5);
    assert!(report.stats.proposed > 0);
    assert!(report.total_seconds >= report.write_seconds);

    let payload = ChainPayload::load(&sink.path_for(group)).unwrap();
    assert_eq!(payload.group, group);
    assert_eq!(payload.label, "Delta E(B-V)");
    assert_eq!(payload.dim, 5);
    assert!(payload.converged);
    assert_eq!(payload.samples.len(), report.main_steps * 40);

    let ceiling = 8.0;
    for sample in &payload.samples {
        assert!(sample.state[0] >= 0.0);
        for pair in sample.state.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(*sample.state.last().unwrap() < ceiling);
        assert!(sample.ln_posterior.is_finite());
    }
}

#[test]
fn empty_stack_posterior_is_flat_and_still_samples() {
    let rect = Rect2D::new([0.0, 0.0], [16.0, 8.0], [16, 16]).unwrap();
    let stack = ImgStack::new_with_rect(0, rect);
    let params = LosParams::new(&stack, 1.0e-6, 0.0).unwrap();
    let posterior = LosPosterior::new(params, 4).unwrap();
    let mut sampler =
        EnsembleSampler::new(&posterior, 4, 1, SamplerConfig::default(), 7).unwrap();

    sampler.step(50, true, 0.0, None);
    let chain = sampler.chain();
    assert_eq!(chain.len(), 50 * sampler.n_walkers());
    // No stars: the log-posterior is exactly zero on the whole support.
    for sample in chain.samples() {
        assert_eq!(sample.ln_posterior, 0.0);
    }
}

#[test]
fn driver_rejects_region_counts_that_do_not_divide_the_grid() {
    let stack = blob_stack();
    let mut sink = dustline_mcmc::NullChainSink;
    let config = DriverConfig::default();
    let err = sample_los_extinction(&stack, 5, 1.0e-6, 0.0, &config, &mut sink, "g").unwrap_err();
    assert_eq!(err.code(), "regions-divide");
}
