#![deny(missing_docs)]

//! Affine-invariant ensemble MCMC for line-of-sight extinction profiles.
//!
//! Given an [`dustline_stack::ImgStack`] of per-star posterior surfaces over
//! (distance modulus, reddening), the crate evaluates the un-normalized
//! log-posterior of a monotone piecewise reddening profile, samples it with
//! an ensemble of walkers split into complementary halves, checks
//! convergence with the Gelman-Rubin diagnostic, and persists the recorded
//! chain through a pluggable sink. [`driver::sample_los_extinction`] wires
//! the pieces together under the fixed burn-in / retry schedule.

/// Chain storage and persistence sinks.
pub mod chain;
/// Serde-backed sampler and driver configuration.
pub mod config;
/// Deterministic seed derivation for walkers and proposals.
pub mod determinism;
/// Convergence diagnostics over recorded walker chains.
pub mod diagnostics;
/// Burn-in schedule, main run, and Gelman-Rubin retry loop.
pub mod driver;
/// The affine-invariant ensemble sampler.
pub mod ensemble;
/// Line-of-sight posterior evaluation and initial-state generation.
pub mod posterior;
/// The target-distribution seam between posterior and sampler.
pub mod target;

pub use chain::{Chain, ChainPayload, ChainSample, ChainSink, JsonChainSink, NullChainSink};
pub use config::{DriverConfig, McmcOptions, SamplerConfig};
pub use diagnostics::gelman_rubin;
pub use driver::{sample_los_extinction, DriverReport};
pub use ensemble::{EnsembleSampler, MoveKind, SamplerStats};
pub use posterior::{line_integral, LosParams, LosPosterior};
pub use target::Target;
