//! Engine layer: model state and kernel accumulation over the store.
//!
//! Top of the crate's dependency order; ties the encoding pipeline to the
//! statistics store and exposes the batched kernel computation.

pub mod kernels;
pub mod model;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::io::StoreError;

pub use kernels::{KernelAccumulator, KernelConfig};
pub use model::{ModelKind, SpatialModel, UnknownModelKind};

/// Errors from kernel accumulation and the batched pipeline.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Train and test sample lists must be walked pairwise.
    #[error("train and test lists have different lengths: {train} vs {test}")]
    PairListMismatch {
        /// Number of training sample names.
        train: usize,
        /// Number of test sample names.
        test: usize,
    },

    /// A train feature batch does not match the accumulator shape.
    #[error("accumulator sized for {expected} training rows, got {got}")]
    TrainRowCount {
        /// Rows in the offending batch.
        got: usize,
        /// Rows the accumulator was built for.
        expected: usize,
    },

    /// A test feature batch does not match the accumulator shape.
    #[error("accumulator sized for {expected} test rows, got {got}")]
    TestRowCount {
        /// Rows in the offending batch.
        got: usize,
        /// Rows the accumulator was built for.
        expected: usize,
    },

    /// Expansion or normalization failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The statistics store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, KernelError>;
