//! Encoding layer: sufficient statistics, feature expansion, normalization.
//!
//! The pipeline runs in three stages, each usable on its own:
//!
//! 1. [`compute_spatial_sstats`]: condense descriptors + locations into a
//!    per-slice statistics vector (the only thing worth persisting).
//! 2. [`expand_spatial_features`]: turn stored statistics into spatial
//!    Fisher vector rows.
//! 3. [`Standardizer`] / [`power_normalize`] / [`l2_norms_squared`]: the
//!    normalization steps applied before kernel accumulation.

pub mod features;
pub mod normalize;
pub mod sstats;

use thiserror::Error;

use crate::model::GmmError;

pub use features::{PRIOR_MEAN, PRIOR_VARIANCE, expand_spatial_features, spatial_feature_len};
pub use normalize::{Standardizer, l2_norms_squared, power_normalize};
pub use sstats::{compute_spatial_sstats, spatial_sstats_len};

/// Errors from the encoding pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// A batch with zero descriptor rows was supplied.
    #[error("descriptor batch is empty")]
    EmptyBatch,

    /// Descriptor and location counts disagree.
    #[error("descriptor rows {descriptors} do not match location rows {locations}")]
    RowMismatch {
        /// Number of descriptor rows.
        descriptors: usize,
        /// Number of location rows.
        locations: usize,
    },

    /// A matrix has the wrong number of columns for this operation.
    #[error("matrix has {got} columns, expected {expected}")]
    WidthMismatch {
        /// Columns supplied.
        got: usize,
        /// Columns required.
        expected: usize,
    },

    /// A statistics buffer is not a positive multiple of the unit length.
    #[error("statistics length {len} is not a positive multiple of the unit length {unit}")]
    BadStatsLength {
        /// Number of values supplied.
        len: usize,
        /// Unit length for one slice.
        unit: usize,
    },

    /// Posterior inference failed.
    #[error(transparent)]
    Gmm(#[from] GmmError),
}

/// Result alias for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;
