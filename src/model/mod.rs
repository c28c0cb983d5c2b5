//! Model layer: the pre-trained Gaussian mixture and posterior inference.
//!
//! Depends only on [`crate::core`]. Everything downstream (statistics
//! extraction, kernels) consumes the mixture through this module.

pub mod gmm;

pub use gmm::{DiagonalGmm, GmmError, Posteriors};
