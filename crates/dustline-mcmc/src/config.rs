use serde::{Deserialize, Serialize};

/// Ensemble dimensions and scheduling knobs for one line-of-sight run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McmcOptions {
    /// Base number of steps per schedule unit; burn-in phases and main-run
    /// attempts are sized as fractions and multiples of this count.
    pub steps: usize,
    /// Walkers per profile dimension; the ensemble holds
    /// `samplers_per_dim * (n_regions + 1)` walkers, which must be even.
    #[serde(default = "default_samplers_per_dim")]
    pub samplers_per_dim: usize,
    /// Worker threads updating walkers within a half (0 uses one per core).
    #[serde(default = "default_n_threads")]
    pub n_threads: usize,
    /// Master seed from which every walker and proposal substream derives.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
}

fn default_samplers_per_dim() -> usize {
    4
}

fn default_n_threads() -> usize {
    1
}

fn default_master_seed() -> u64 {
    0xD05E_D057_B10C_5EED_u64
}

impl Default for McmcOptions {
    fn default() -> Self {
        Self {
            steps: 1000,
            samplers_per_dim: default_samplers_per_dim(),
            n_threads: default_n_threads(),
            master_seed: default_master_seed(),
        }
    }
}

/// Proposal-mix parameters of the ensemble sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Stretch-move scale `a > 1`. The source pipeline runs with 1.1;
    /// canonical Goodman-Weare uses 2.0.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Probability of proposing a stretch move rather than a replacement
    /// move, in `[0, 1]`.
    #[serde(default = "default_replacement_bandwidth")]
    pub replacement_bandwidth: f64,
}

fn default_scale() -> f64 {
    1.1
}

fn default_replacement_bandwidth() -> f64 {
    0.75
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            replacement_bandwidth: default_replacement_bandwidth(),
        }
    }
}

/// Configuration of the convergence-checking driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Ensemble dimensions and base step count.
    #[serde(default)]
    pub options: McmcOptions,
    /// Proposal-mix parameters.
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Maximum number of recorded main-run attempts.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Per-dimension Gelman-Rubin threshold below which a run converges.
    #[serde(default = "default_gr_threshold")]
    pub gr_threshold: f64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_gr_threshold() -> f64 {
    1.2
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            options: McmcOptions::default(),
            sampler: SamplerConfig::default(),
            max_attempts: default_max_attempts(),
            gr_threshold: default_gr_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_json_fills_defaults() {
        let config: DriverConfig = serde_json::from_str(r#"{"options":{"steps":250}}"#).unwrap();
        assert_eq!(config.options.steps, 250);
        assert_eq!(config.options.samplers_per_dim, 4);
        assert_eq!(config.max_attempts, 3);
        assert!((config.gr_threshold - 1.2).abs() < 1e-12);
        assert!((config.sampler.scale - 1.1).abs() < 1e-12);
        assert!((config.sampler.replacement_bandwidth - 0.75).abs() < 1e-12);
    }
}
