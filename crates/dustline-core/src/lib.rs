#![deny(missing_docs)]

//! Shared infrastructure for the dustline workspace: the error taxonomy
//! and the RNG handle used by every sampler and catalog draw.

pub mod errors;
pub mod rng;

pub use errors::{DustError, ErrorKind};
pub use rng::RngHandle;
