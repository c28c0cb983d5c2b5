//! Model state and the batched kernel pipeline.
//!
//! [`SpatialModel`] bundles the mixture with the model variant tag and
//! derives the lengths every other stage depends on. The variants form a
//! closed set: a spatial-only model, and a combined model whose appearance
//! half is computed elsewhere. Both drive the same spatial pipeline here;
//! the tag distinguishes them in result naming and dispatch.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::{DenseMatrix, DescriptorSet, Location};
use crate::encoding::{
    compute_spatial_sstats, expand_spatial_features, spatial_feature_len, spatial_sstats_len,
};
use crate::io::SstatsMap;
use crate::model::DiagonalGmm;

use super::{KernelAccumulator, KernelConfig, Result};

/// Model variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Spatial Fisher vectors only.
    Spatial,
    /// Spatial half of a combined appearance + spatial model.
    Combined,
}

/// A model-kind name that maps to no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model kind '{0}'")]
pub struct UnknownModelKind(pub String);

impl FromStr for ModelKind {
    type Err = UnknownModelKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sfv" => Ok(ModelKind::Spatial),
            "fv_sfv" | "fv-sfv" => Ok(ModelKind::Combined),
            other => Err(UnknownModelKind(other.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Spatial => write!(f, "sfv"),
            ModelKind::Combined => write!(f, "fv_sfv"),
        }
    }
}

/// Mixture plus variant tag, the state threaded through the pipeline.
#[derive(Debug, Clone)]
pub struct SpatialModel {
    gmm: DiagonalGmm,
    kind: ModelKind,
}

impl SpatialModel {
    /// Bundle a trained mixture with a variant tag.
    pub fn new(gmm: DiagonalGmm, kind: ModelKind) -> Self {
        Self { gmm, kind }
    }

    /// The underlying mixture.
    #[inline]
    pub fn gmm(&self) -> &DiagonalGmm {
        &self.gmm
    }

    /// The variant tag.
    #[inline]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Number of mixture components.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.gmm.num_components()
    }

    /// Length of one slice of statistics under this model.
    #[inline]
    pub fn sstats_len(&self) -> usize {
        spatial_sstats_len(self.gmm.num_components())
    }

    /// Width of one expanded feature row under this model.
    #[inline]
    pub fn feature_len(&self) -> usize {
        spatial_feature_len(self.gmm.num_components())
    }

    /// Extract statistics for one slice of descriptors.
    pub fn compute_sstats(
        &self,
        descriptors: &DescriptorSet,
        locations: &[Location],
    ) -> Result<Vec<f32>> {
        Ok(compute_spatial_sstats(descriptors, locations, &self.gmm)?)
    }

    /// Expand stored statistics into feature rows.
    pub fn expand(&self, sstats: &[f32]) -> Result<DenseMatrix> {
        Ok(expand_spatial_features(sstats, self.gmm.num_components())?)
    }

    /// Accumulate kernels over aligned per-channel statistics samples.
    ///
    /// `train_names` and `test_names` are walked pairwise; each pair is
    /// read from the store, expanded, and folded into `acc`. Lists of
    /// different lengths are an error rather than a silent truncation, and
    /// a malformed sample aborts the batch with the offending pair intact
    /// in the error.
    pub fn compute_spatial_kernels(
        &self,
        store: &SstatsMap,
        train_names: &[String],
        test_names: &[String],
        config: &KernelConfig,
        acc: &mut KernelAccumulator,
    ) -> Result<()> {
        if train_names.len() != test_names.len() {
            return Err(super::KernelError::PairListMismatch {
                train: train_names.len(),
                test: test_names.len(),
            });
        }

        log::info!(
            "accumulating kernels for model '{}' over {} channel pairs",
            self,
            train_names.len()
        );
        for (i, (train_name, test_name)) in
            train_names.iter().zip(test_names.iter()).enumerate()
        {
            log::debug!(
                "kernel pair {}/{}: '{}' vs '{}'",
                i + 1,
                train_names.len(),
                train_name,
                test_name
            );
            let train = self.expand(&store.read(train_name)?)?;
            let test = self.expand(&store.read(test_name)?)?;
            acc.process_pair(train, test, config)?;
        }
        Ok(())
    }
}

impl fmt::Display for SpatialModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} k={} d={}",
            self.kind,
            self.gmm.num_components(),
            self.gmm.dim()
        )
    }
}
