//! Error reporting for the dustline pipeline.

use std::fmt::{self, Display};
use std::path::Path;

use thiserror::Error;

/// Subsystem a [`DustError`] originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Probability-surface stacks and grid descriptors.
    Stack,
    /// Line-of-sight posterior configuration.
    Posterior,
    /// Ensemble sampler configuration and scheduling.
    Sampler,
    /// Chain persistence.
    Chain,
    /// Inverse-CDF drawer construction.
    Draw,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Stack => "stack",
            ErrorKind::Posterior => "posterior",
            ErrorKind::Sampler => "sampler",
            ErrorKind::Chain => "chain",
            ErrorKind::Draw => "draw",
        })
    }
}

/// Canonical error type for the dustline pipeline.
///
/// Every failure names the subsystem it came from and carries a stable
/// machine readable code that callers and tests match on. The offending
/// values (axis numbers, bounds, file paths) are embedded directly in the
/// message at the point where they are known; there is no separate
/// context payload to assemble or forward.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error ({code}): {message}")]
pub struct DustError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl DustError {
    fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Builds a stack or grid-descriptor error.
    pub fn stack(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Stack, code, message)
    }

    /// Builds a posterior configuration error.
    pub fn posterior(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Posterior, code, message)
    }

    /// Builds a sampler configuration error.
    pub fn sampler(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Sampler, code, message)
    }

    /// Builds a chain persistence error.
    pub fn chain(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Chain, code, message)
    }

    /// Builds a chain persistence error tied to a filesystem path.
    pub fn chain_io(code: &'static str, path: &Path, source: impl Display) -> Self {
        Self::new(
            ErrorKind::Chain,
            code,
            format!("{source} ({})", path.display()),
        )
    }

    /// Builds an inverse-CDF drawer error.
    pub fn draw(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Draw, code, message)
    }

    /// The subsystem the error originates from.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Stable machine readable code identifying the failure.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Human readable description with the offending values embedded.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_subsystem_and_code() {
        let err = DustError::stack("rect-extent", "axis 1 extent [2, 1] must have max > min");
        assert_eq!(
            err.to_string(),
            "stack error (rect-extent): axis 1 extent [2, 1] must have max > min"
        );
    }

    #[test]
    fn chain_io_embeds_the_path() {
        let err = DustError::chain_io("chain-read", Path::new("/runs/out.json"), "no such file");
        assert_eq!(err.kind(), ErrorKind::Chain);
        assert!(err.message().contains("/runs/out.json"));
        assert!(err.message().contains("no such file"));
    }
}
