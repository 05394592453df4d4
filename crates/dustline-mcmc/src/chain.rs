use std::fs;
use std::path::{Path, PathBuf};

use dustline_core::DustError;
use serde::{Deserialize, Serialize};

/// One recorded ensemble state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainSample {
    /// Index of the walker that produced the state.
    pub walker: usize,
    /// The profile vector at the time of recording.
    pub state: Vec<f64>,
    /// Cached log-posterior of the state.
    pub ln_posterior: f64,
}

/// Append-only record of ensemble states emitted while recording.
///
/// Samples are stored step-major: one entry per walker, walkers in index
/// order, for every recorded step. Burn-in discarding and thinning are the
/// caller's business; the driver clears the chain between schedule phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chain {
    dim: usize,
    n_walkers: usize,
    samples: Vec<ChainSample>,
}

impl Chain {
    /// Creates an empty chain for the given ensemble shape.
    pub fn new(dim: usize, n_walkers: usize) -> Self {
        Self {
            dim,
            n_walkers,
            samples: Vec::new(),
        }
    }

    /// Appends one walker state with its log-posterior.
    pub fn append(&mut self, walker: usize, state: &[f64], ln_posterior: f64) {
        debug_assert_eq!(state.len(), self.dim);
        self.samples.push(ChainSample {
            walker,
            state: state.to_vec(),
            ln_posterior,
        });
    }

    /// Discards every recorded sample, keeping the ensemble shape.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Dimensionality of recorded states.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of walkers feeding the chain.
    pub fn n_walkers(&self) -> usize {
        self.n_walkers
    }

    /// Number of recorded samples (walker states, not steps).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the chain holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of fully recorded ensemble steps.
    pub fn steps_recorded(&self) -> usize {
        if self.n_walkers == 0 {
            0
        } else {
            self.samples.len() / self.n_walkers
        }
    }

    /// Immutable view over the recorded samples.
    pub fn samples(&self) -> &[ChainSample] {
        &self.samples
    }
}

/// Serializable payload written by [`JsonChainSink`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainPayload {
    /// Caller-supplied storage group (for example `/pixel 512/los extinction`).
    pub group: String,
    /// Human readable label for the recorded quantity.
    pub label: String,
    /// Dimensionality of recorded states.
    pub dim: usize,
    /// Number of walkers feeding the chain.
    pub n_walkers: usize,
    /// Whether the run satisfied the Gelman-Rubin threshold.
    pub converged: bool,
    /// The recorded samples in step-major order.
    pub samples: Vec<ChainSample>,
}

impl ChainPayload {
    /// Restores a payload from disk.
    pub fn load(path: &Path) -> Result<Self, DustError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| DustError::chain_io("chain-read", path, err))?;
        serde_json::from_str(&contents)
            .map_err(|err| DustError::chain_io("chain-parse", path, err))
    }
}

/// Destination for recorded chains.
pub trait ChainSink {
    /// Persists the chain under the caller-supplied group path.
    ///
    /// `converged` flags whether the driver's convergence check passed; the
    /// chain is persisted either way. Failures surface to the caller; the
    /// driver does not retry.
    fn save(
        &mut self,
        chain: &Chain,
        group: &str,
        label: &str,
        converged: bool,
    ) -> Result<(), DustError>;
}

/// Sink that discards every chain. Useful for benches and schedule tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChainSink;

impl ChainSink for NullChainSink {
    fn save(&mut self, _: &Chain, _: &str, _: &str, _: bool) -> Result<(), DustError> {
        Ok(())
    }
}

/// Sink that writes one pretty-printed JSON payload per saved chain.
#[derive(Debug, Clone)]
pub struct JsonChainSink {
    root: PathBuf,
}

impl JsonChainSink {
    /// Creates a sink rooted at `root`; the directory is created on save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file a given group serializes to.
    pub fn path_for(&self, group: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_group(group)))
    }
}

impl ChainSink for JsonChainSink {
    fn save(
        &mut self,
        chain: &Chain,
        group: &str,
        label: &str,
        converged: bool,
    ) -> Result<(), DustError> {
        let payload = ChainPayload {
            group: group.to_string(),
            label: label.to_string(),
            dim: chain.dim(),
            n_walkers: chain.n_walkers(),
            converged,
            samples: chain.samples().to_vec(),
        };
        let path = self.path_for(group);
        fs::create_dir_all(&self.root)
            .map_err(|err| DustError::chain_io("chain-mkdir", &self.root, err))?;
        let json = serde_json::to_string_pretty(&payload).map_err(|err| {
            DustError::chain("chain-serialize", format!("{err} (group {group})"))
        })?;
        fs::write(&path, json).map_err(|err| DustError::chain_io("chain-write", &path, err))
    }
}

/// Flattens a group path into a single filesystem-safe file stem.
fn sanitize_group(group: &str) -> String {
    let mut stem = String::with_capacity(group.len());
    let mut last_dash = true;
    for c in group.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
            last_dash = false;
        } else if !last_dash {
            stem.push('-');
            last_dash = true;
        }
    }
    let stem = stem.trim_end_matches('-');
    if stem.is_empty() {
        "chain".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_recorded_counts_full_ensembles() {
        let mut chain = Chain::new(2, 4);
        assert!(chain.is_empty());
        for step in 0..3 {
            for walker in 0..4 {
                chain.append(walker, &[step as f64, step as f64 + 1.0], -1.0);
            }
        }
        assert_eq!(chain.len(), 12);
        assert_eq!(chain.steps_recorded(), 3);
        chain.clear();
        assert_eq!(chain.steps_recorded(), 0);
        assert_eq!(chain.n_walkers(), 4);
    }

    #[test]
    fn group_names_flatten_to_safe_stems() {
        assert_eq!(
            sanitize_group("/pixel 512/los extinction"),
            "pixel-512-los-extinction"
        );
        assert_eq!(sanitize_group("///"), "chain");
    }
}
