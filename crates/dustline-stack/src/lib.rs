#![deny(missing_docs)]

//! Stacks of per-star probability surfaces sharing one rectangular grid.
//!
//! Each surface is an un-normalized posterior density over (distance
//! modulus, reddening) for a single star, tabulated on the common
//! [`Rect2D`] grid. The stack owns every surface and the grid descriptor;
//! loaders populate surfaces in place, and the line-of-sight sampler reads
//! them without further dimension checks.

pub mod rect;
pub mod stack;

pub use rect::Rect2D;
pub use stack::ImgStack;
