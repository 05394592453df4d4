use std::collections::BTreeMap;

use dustline_core::{DustError, RngHandle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::config::SamplerConfig;
use crate::determinism::{self, Substream};
use crate::diagnostics;
use crate::target::Target;

/// Kind of proposal evaluated for a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Goodman-Weare stretch move toward a peer from the opposite half.
    Stretch,
    /// Differential-evolution replacement move built from two peers.
    Replacement,
}

impl MoveKind {
    fn as_str(&self) -> &'static str {
        match self {
            MoveKind::Stretch => "stretch",
            MoveKind::Replacement => "replacement",
        }
    }
}

/// Aggregate acceptance statistics for a sampler's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplerStats {
    /// Acceptance rate per move kind.
    pub acceptance_rates: BTreeMap<String, f64>,
    /// Total proposals evaluated.
    pub proposed: u64,
    /// Total proposals accepted.
    pub accepted: u64,
    /// Ensemble steps taken, recorded or not.
    pub steps: u64,
}

struct Walker {
    state: Vec<f64>,
    ln_posterior: f64,
}

/// Affine-invariant ensemble sampler over a [`Target`] distribution.
///
/// Holds `samplers_per_dim * dim` walkers partitioned into two
/// complementary halves. Each step updates the first half against the
/// second and then the second against the first; walkers within a half are
/// independent, so their proposals run on a worker pool and join at the
/// half barrier. Every proposal derives its own RNG substream from the
/// master seed, making runs bit-reproducible for any thread count.
pub struct EnsembleSampler<'a, T: Target> {
    target: &'a T,
    dim: usize,
    config: SamplerConfig,
    master_seed: u64,
    walkers: Vec<Walker>,
    chain: Chain,
    pool: rayon::ThreadPool,
    accepted: BTreeMap<MoveKind, u64>,
    proposed: BTreeMap<MoveKind, u64>,
    step_counter: u64,
}

impl<'a, T: Target> EnsembleSampler<'a, T> {
    /// Builds an ensemble and draws every walker's initial state.
    ///
    /// `n_threads == 0` sizes the worker pool to one thread per core.
    pub fn new(
        target: &'a T,
        samplers_per_dim: usize,
        n_threads: usize,
        config: SamplerConfig,
        master_seed: u64,
    ) -> Result<Self, DustError> {
        let dim = target.dim();
        if dim == 0 {
            return Err(DustError::sampler(
                "dim-zero",
                "target dimensionality must be positive",
            ));
        }
        let n_walkers = samplers_per_dim * dim;
        if n_walkers < 2 || n_walkers % 2 != 0 {
            return Err(DustError::sampler(
                "walkers-shape",
                format!(
                    "walker count {n_walkers} (samplers_per_dim {samplers_per_dim} x dim {dim}) \
                     must be even and at least 2"
                ),
            ));
        }
        if !(config.scale.is_finite() && config.scale > 1.0) {
            return Err(DustError::sampler(
                "scale-range",
                format!("stretch scale {} must be greater than 1", config.scale),
            ));
        }
        if !(0.0..=1.0).contains(&config.replacement_bandwidth) {
            return Err(DustError::sampler(
                "bandwidth-range",
                format!(
                    "replacement bandwidth {} must lie in [0, 1]",
                    config.replacement_bandwidth
                ),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|err| DustError::sampler("worker-pool", err.to_string()))?;

        let mut walkers = Vec::with_capacity(n_walkers);
        for index in 0..n_walkers {
            let mut rng = determinism::rng_for(master_seed, Substream::Init { walker: index });
            let state = target.initial_state(&mut rng);
            debug_assert_eq!(state.len(), dim);
            let ln_posterior = target.ln_posterior(&state);
            walkers.push(Walker {
                state,
                ln_posterior,
            });
        }

        Ok(Self {
            target,
            dim,
            config,
            master_seed,
            walkers,
            chain: Chain::new(dim, n_walkers),
            pool,
            accepted: BTreeMap::new(),
            proposed: BTreeMap::new(),
            step_counter: 0,
        })
    }

    /// Number of walkers in the ensemble.
    pub fn n_walkers(&self) -> usize {
        self.walkers.len()
    }

    /// Iterates over the walkers' current states.
    pub fn walker_states(&self) -> impl Iterator<Item = &[f64]> {
        self.walkers.iter().map(|walker| walker.state.as_slice())
    }

    /// Advances the whole ensemble by `n_steps`.
    ///
    /// When `record` is set, every post-update walker state is appended to
    /// the chain with its log-posterior. `temperature` multiplies the
    /// log-posterior difference in the acceptance test, with `0` behaving
    /// as `1`. `bandwidth` overrides the configured stretch-move
    /// probability for the duration of the call.
    pub fn step(&mut self, n_steps: usize, record: bool, temperature: f64, bandwidth: Option<f64>) {
        let bandwidth = bandwidth.unwrap_or(self.config.replacement_bandwidth);
        for _ in 0..n_steps {
            let step_index = self.step_counter;
            self.update_half(true, temperature, bandwidth, step_index);
            self.update_half(false, temperature, bandwidth, step_index);
            self.step_counter += 1;
            if record {
                for (index, walker) in self.walkers.iter().enumerate() {
                    self.chain.append(index, &walker.state, walker.ln_posterior);
                }
            }
        }
    }

    /// Empties the recorded chain without touching walker states.
    pub fn clear(&mut self) {
        self.chain.clear();
    }

    /// The recorded chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Consumes the sampler, yielding the recorded chain.
    pub fn into_chain(self) -> Chain {
        self.chain
    }

    /// Per-dimension Gelman-Rubin statistic over the recorded chain.
    pub fn gelman_rubin(&self) -> Vec<f64> {
        diagnostics::gelman_rubin(&self.chain)
    }

    /// Acceptance statistics accumulated since construction.
    pub fn stats(&self) -> SamplerStats {
        let mut acceptance_rates = BTreeMap::new();
        let mut proposed_total = 0;
        let mut accepted_total = 0;
        for (kind, &proposed) in &self.proposed {
            let accepted = self.accepted.get(kind).copied().unwrap_or(0);
            proposed_total += proposed;
            accepted_total += accepted;
            let rate = if proposed == 0 {
                0.0
            } else {
                accepted as f64 / proposed as f64
            };
            acceptance_rates.insert(kind.as_str().to_string(), rate);
        }
        SamplerStats {
            acceptance_rates,
            proposed: proposed_total,
            accepted: accepted_total,
            steps: self.step_counter,
        }
    }

    fn update_half(&mut self, first: bool, temperature: f64, bandwidth: f64, step_index: u64) {
        let half = self.walkers.len() / 2;
        let dim = self.dim;
        let scale = self.config.scale;
        let gamma = 2.38 / (2.0 * dim as f64).sqrt();
        let master_seed = self.master_seed;
        let target = self.target;

        let (lo, hi) = self.walkers.split_at_mut(half);
        let (active, peers, offset): (&mut [Walker], &[Walker], usize) = if first {
            (lo, hi, 0)
        } else {
            (hi, lo, half)
        };

        let outcomes: Vec<(MoveKind, bool)> = self.pool.install(|| {
            active
                .par_iter_mut()
                .enumerate()
                .map(|(index, walker)| {
                    let mut rng = determinism::rng_for(
                        master_seed,
                        Substream::Proposal {
                            step: step_index,
                            walker: offset + index,
                        },
                    );
                    propose_and_accept(
                        target,
                        walker,
                        peers,
                        dim,
                        scale,
                        bandwidth,
                        temperature,
                        gamma,
                        &mut rng,
                    )
                })
                .collect()
        });

        for (kind, accepted) in outcomes {
            *self.proposed.entry(kind).or_insert(0) += 1;
            if accepted {
                *self.accepted.entry(kind).or_insert(0) += 1;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn propose_and_accept<T: Target>(
    target: &T,
    walker: &mut Walker,
    peers: &[Walker],
    dim: usize,
    scale: f64,
    bandwidth: f64,
    temperature: f64,
    gamma: f64,
    rng: &mut RngHandle,
) -> (MoveKind, bool) {
    let factor = if temperature > 0.0 { temperature } else { 1.0 };
    // The replacement move needs two distinct peers.
    let use_stretch = peers.len() < 2 || rng.uniform() < bandwidth;

    if use_stretch {
        let peer = &peers[rng.index(peers.len())];
        // Inverse CDF of g(z) ~ 1/sqrt(z) on [1/a, a].
        let u = rng.uniform();
        let z = (1.0 + (scale - 1.0) * u).powi(2) / scale;
        let proposal: Vec<f64> = walker
            .state
            .iter()
            .zip(peer.state.iter())
            .map(|(&own, &other)| other + z * (own - other))
            .collect();
        let ln_new = target.ln_posterior(&proposal);
        let ln_accept = (dim as f64 - 1.0) * z.ln() + factor * (ln_new - walker.ln_posterior);
        let accepted = ln_accept >= 0.0 || rng.uniform().ln() < ln_accept;
        if accepted {
            walker.state = proposal;
            walker.ln_posterior = ln_new;
        }
        (MoveKind::Stretch, accepted)
    } else {
        let j1 = rng.index(peers.len());
        let mut j2 = rng.index(peers.len() - 1);
        if j2 >= j1 {
            j2 += 1;
        }
        let proposal: Vec<f64> = walker
            .state
            .iter()
            .zip(peers[j1].state.iter().zip(peers[j2].state.iter()))
            .map(|(&own, (&a, &b))| own + gamma * (a - b))
            .collect();
        let ln_new = target.ln_posterior(&proposal);
        let ln_accept = factor * (ln_new - walker.ln_posterior);
        let accepted = ln_accept >= 0.0 || rng.uniform().ln() < ln_accept;
        if accepted {
            walker.state = proposal;
            walker.ln_posterior = ln_new;
        }
        (MoveKind::Replacement, accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gaussian {
        dim: usize,
    }

    impl Target for Gaussian {
        fn dim(&self) -> usize {
            self.dim
        }

        fn ln_posterior(&self, state: &[f64]) -> f64 {
            -0.5 * state.iter().map(|v| v * v).sum::<f64>()
        }

        fn initial_state(&self, rng: &mut RngHandle) -> Vec<f64> {
            (0..self.dim).map(|_| rng.uniform() - 0.5).collect()
        }
    }

    #[test]
    fn recording_emits_one_sample_per_walker_per_step() {
        let target = Gaussian { dim: 2 };
        let mut sampler =
            EnsembleSampler::new(&target, 2, 1, SamplerConfig::default(), 17).unwrap();
        assert_eq!(sampler.n_walkers(), 4);
        sampler.step(5, false, 0.0, None);
        assert!(sampler.chain().is_empty());
        sampler.step(10, true, 0.0, None);
        assert_eq!(sampler.chain().len(), 40);
        assert_eq!(sampler.chain().steps_recorded(), 10);
        sampler.clear();
        assert!(sampler.chain().is_empty());
        assert_eq!(sampler.stats().steps, 15);
    }

    #[test]
    fn runs_replay_identically_for_any_thread_count() {
        let target = Gaussian { dim: 3 };
        let mut serial =
            EnsembleSampler::new(&target, 4, 1, SamplerConfig::default(), 99).unwrap();
        let mut parallel =
            EnsembleSampler::new(&target, 4, 4, SamplerConfig::default(), 99).unwrap();
        serial.step(25, true, 0.0, None);
        parallel.step(25, true, 0.0, None);
        assert_eq!(serial.chain(), parallel.chain());
    }

    #[test]
    fn temperature_zero_behaves_as_unit_temperature() {
        let target = Gaussian { dim: 2 };
        let mut zero = EnsembleSampler::new(&target, 3, 1, SamplerConfig::default(), 7).unwrap();
        let mut unit = EnsembleSampler::new(&target, 3, 1, SamplerConfig::default(), 7).unwrap();
        zero.step(30, true, 0.0, None);
        unit.step(30, true, 1.0, None);
        assert_eq!(zero.chain(), unit.chain());
    }

    #[test]
    fn rejects_odd_or_tiny_ensembles_and_bad_knobs() {
        let target = Gaussian { dim: 3 };
        assert!(EnsembleSampler::new(&target, 1, 1, SamplerConfig::default(), 0).is_err());
        let bad_scale = SamplerConfig {
            scale: 1.0,
            ..SamplerConfig::default()
        };
        assert!(EnsembleSampler::new(&target, 2, 1, bad_scale, 0).is_err());
        let bad_bandwidth = SamplerConfig {
            replacement_bandwidth: 1.5,
            ..SamplerConfig::default()
        };
        assert!(EnsembleSampler::new(&target, 2, 1, bad_bandwidth, 0).is_err());
    }

    #[test]
    fn stats_track_both_move_kinds() {
        let target = Gaussian { dim: 2 };
        let mut sampler =
            EnsembleSampler::new(&target, 4, 1, SamplerConfig::default(), 21).unwrap();
        sampler.step(50, false, 0.0, Some(0.5));
        let stats = sampler.stats();
        assert_eq!(stats.proposed, 50 * 8);
        assert!(stats.acceptance_rates.contains_key("stretch"));
        assert!(stats.acceptance_rates.contains_key("replacement"));
        assert!(stats.accepted <= stats.proposed);
    }
}
