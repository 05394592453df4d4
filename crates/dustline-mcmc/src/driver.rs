use std::time::Instant;

use dustline_core::DustError;
use dustline_stack::ImgStack;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chain::ChainSink;
use crate::config::DriverConfig;
use crate::ensemble::{EnsembleSampler, SamplerStats};
use crate::posterior::{LosParams, LosPosterior};

/// Label attached to every persisted line-of-sight chain.
const DELTA_EBV_LABEL: &str = "Delta E(B-V)";

/// Burn-in sub-steps as (percent of `steps`, bandwidth override) pairs,
/// alternating stretch-heavy and replacement-heavy phases.
const BURN_IN_SCHEDULE: [(usize, f64); 8] = [
    (20, 0.5),
    (5, 1.0),
    (20, 0.5),
    (5, 1.0),
    (20, 0.5),
    (5, 1.0),
    (20, 0.5),
    (5, 1.0),
];

/// Outcome of one line-of-sight inference run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverReport {
    /// Whether every dimension satisfied the Gelman-Rubin threshold.
    pub converged: bool,
    /// Number of recorded main-run attempts performed.
    pub attempts: usize,
    /// Recorded steps of the final main-run attempt.
    pub main_steps: usize,
    /// Final per-dimension Gelman-Rubin statistics.
    pub gelman_rubin: Vec<f64>,
    /// Acceptance statistics over the whole run, burn-in included.
    pub stats: SamplerStats,
    /// Wall-clock duration of the whole run in seconds.
    pub total_seconds: f64,
    /// Wall-clock duration of burn-in plus sampling in seconds.
    pub sample_seconds: f64,
    /// Wall-clock duration of chain persistence in seconds.
    pub write_seconds: f64,
}

/// Samples the line-of-sight extinction posterior under the fixed schedule.
///
/// Burn-in alternates stretch-heavy and replacement-heavy phases, the
/// recorded chain is cleared, and then up to `max_attempts` main runs of
/// `2^attempt * steps` recorded steps each are checked against the
/// Gelman-Rubin threshold, with a short un-recorded transitional phase
/// between attempts. The chain of the final attempt is persisted to `sink`
/// under `group` whether or not the run converged; non-convergence is
/// reported both on the saved payload and in the returned report.
pub fn sample_los_extinction<S: ChainSink>(
    stack: &ImgStack,
    n_regions: usize,
    p0: f64,
    ebv_max: f64,
    config: &DriverConfig,
    sink: &mut S,
    group: &str,
) -> Result<DriverReport, DustError> {
    let t_start = Instant::now();

    let params = LosParams::new(stack, p0, ebv_max)?;
    let posterior = LosPosterior::new(params, n_regions)?;
    let options = &config.options;
    let mut sampler = EnsembleSampler::new(
        &posterior,
        options.samplers_per_dim,
        options.n_threads,
        config.sampler.clone(),
        options.master_seed,
    )?;

    let steps = options.steps;
    info!(
        group,
        n_images = stack.n_images(),
        n_regions,
        walkers = sampler.n_walkers(),
        steps,
        "burn-in"
    );
    for (percent, bandwidth) in BURN_IN_SCHEDULE {
        sampler.step(steps * percent / 100, false, 0.0, Some(bandwidth));
    }
    sampler.clear();

    info!(group, "main run");
    let mut converged = false;
    let mut attempts = 0;
    let mut main_steps = 0;
    let mut gelman_rubin = Vec::new();
    while attempts < config.max_attempts && !converged {
        main_steps = (1usize << attempts) * steps;
        sampler.step(main_steps, true, 0.0, Some(0.1));
        gelman_rubin = sampler.gelman_rubin();
        converged = gelman_rubin.iter().all(|rhat| *rhat <= config.gr_threshold);
        attempts += 1;
        if !converged && attempts < config.max_attempts {
            info!(group, attempt = attempts, "extending run");
            sampler.step(steps / 5, false, 0.0, Some(1.0));
            sampler.clear();
        }
    }
    let sample_seconds = t_start.elapsed().as_secs_f64();

    let stats = sampler.stats();
    let chain = sampler.into_chain();
    let t_write = Instant::now();
    sink.save(&chain, group, DELTA_EBV_LABEL, converged)?;
    let write_seconds = t_write.elapsed().as_secs_f64();
    let total_seconds = t_start.elapsed().as_secs_f64();

    if converged {
        info!(
            group,
            attempts,
            main_steps,
            samples = chain.len(),
            total_seconds,
            "converged"
        );
    } else {
        warn!(
            group,
            attempts,
            ?gelman_rubin,
            total_seconds,
            "failed to converge; chain persisted anyway"
        );
    }

    Ok(DriverReport {
        converged,
        attempts,
        main_steps,
        gelman_rubin,
        stats,
        total_seconds,
        sample_seconds,
        write_seconds,
    })
}
