//! DrishtiFV - Spatial Fisher vector encoding for video descriptors
//!
//! Implements the spatial Fisher vector construction of Krapac et al.
//! (ICCV 2011) for bags of local video descriptors: per-sample sufficient
//! statistics under a Gaussian mixture, their expansion into spatial
//! feature vectors, and the normalized train/test kernel matrices consumed
//! by a downstream classifier. Statistics are computed once per sample and
//! cached in a directory-backed store; everything after that point runs
//! from the store alone.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │           (model state, kernel pipeline)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Persistence
//! │           (sstats store, mixture format)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   encoding/                         │  ← Core numerics
//! │        (statistics, features, normalization)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    model/                           │  ← Mixture model
//! │              (diagonal GMM, posteriors)             │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │             (descriptors, matrices)                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Pipeline
//!
//! ## Stage 1: Extraction
//! - Descriptors and their normalized (x, y, t) locations enter as a batch
//! - The mixture assigns weight-aware posteriors per descriptor
//! - Soft counts and location moments condense to `K + 6K` values per slice
//!
//! ## Stage 2: Storage
//! - Each sample's slices land in the store as raw f32 plus a sidecar
//! - Batches are integrity-checked and merged into per-set samples
//!
//! ## Stage 3: Expansion and kernels
//! - Stored statistics expand to `6K`-wide spatial Fisher vectors
//! - Standardize (train-fitted), signed power, L2 accumulation
//! - Kernel sums over channels finalize into train-train and test-train
//!   matrices

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Mixture model (depends on core)
// ============================================================================
pub mod model;

// ============================================================================
// Layer 3: Encoding pipeline (depends on core, model)
// ============================================================================
pub mod encoding;

// ============================================================================
// Layer 4: Persistence (depends on core, model)
// ============================================================================
pub mod io;

// ============================================================================
// Layer 5: Engine (depends on all layers)
// ============================================================================
pub mod engine;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::{DenseMatrix, DescriptorSet, Location, ShapeError};

// Mixture model
pub use model::{DiagonalGmm, GmmError, Posteriors};

// Encoding pipeline
pub use encoding::{
    EncodingError, Standardizer, compute_spatial_sstats, expand_spatial_features,
    l2_norms_squared, power_normalize, spatial_feature_len, spatial_sstats_len,
};

// Persistence
pub use io::{
    FormatError, IntegrityFault, IntegrityReport, SampleInfo, SstatsMap, StoreError, load_gmm,
    save_gmm,
};

// Engine
pub use engine::{
    KernelAccumulator, KernelConfig, KernelError, ModelKind, SpatialModel, UnknownModelKind,
};
