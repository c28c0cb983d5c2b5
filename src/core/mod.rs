//! Core foundation layer.
//!
//! Bottom layer of the crate with no internal dependencies; every other
//! layer builds on these types.
//!
//! # Contents
//!
//! - [`types`]: descriptor batches and spatio-temporal locations
//! - [`matrix`]: dense row-major f64 matrix for features and kernels

pub mod matrix;
pub mod types;

pub use matrix::DenseMatrix;
pub use types::{DescriptorSet, Location, ShapeError};
