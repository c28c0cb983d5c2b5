//! Diagonal-covariance Gaussian mixture model for posterior inference.
//!
//! The mixture is supplied pre-trained (training is out of scope) and is
//! read-only after construction. Its one capability is computing the
//! posterior matrix Q for a descriptor batch: component-weight-aware
//! responsibilities, evaluated in log space so distant descriptors cannot
//! underflow a whole row to zero.
//!
//! # Algorithm
//!
//! For descriptor x and component c with weight w, mean mu, variance sigma²:
//!
//! ```text
//! score_c = ln w + sum_d [ -0.5 ln(2 pi sigma²_cd) - 0.5 (x_d - mu_cd)² / sigma²_cd ]
//! Q[x, c] = exp(score_c - logsumexp(score))
//! ```
//!
//! Each row of Q sums to 1. The per-component log-normalizers and inverse
//! variances are precomputed at construction.

use std::f64::consts::PI;

use thiserror::Error;

use crate::core::DescriptorSet;

/// Errors from mixture construction or inference.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GmmError {
    /// The mixture has no components.
    #[error("mixture must have at least one component")]
    NoComponents,

    /// The descriptor dimension is zero.
    #[error("descriptor dimension must be at least 1")]
    ZeroDimension,

    /// A parameter block does not have `components * dim` values.
    #[error("{name} block has {got} values, expected {expected}")]
    BlockLength {
        /// Which block is malformed ("means" or "variances").
        name: &'static str,
        /// Number of values supplied.
        got: usize,
        /// Required number of values.
        expected: usize,
    },

    /// A component weight is zero, negative, or non-finite.
    #[error("component {index} has invalid weight {value}")]
    InvalidWeight {
        /// Component index.
        index: usize,
        /// Offending weight.
        value: f32,
    },

    /// A variance entry is zero, negative, or non-finite.
    #[error("variance entry {index} has invalid value {value}")]
    InvalidVariance {
        /// Flat index into the variance block.
        index: usize,
        /// Offending variance.
        value: f32,
    },

    /// Descriptors have a different dimension than the mixture.
    #[error("descriptor dimension {descriptors} does not match mixture dimension {model}")]
    DimensionMismatch {
        /// Dimension of the descriptor batch.
        descriptors: usize,
        /// Dimension of the mixture.
        model: usize,
    },
}

/// Result alias for mixture operations.
pub type Result<T> = std::result::Result<T, GmmError>;

/// Posterior matrix Q: one row per descriptor, one column per component.
///
/// Transient output of [`DiagonalGmm::posteriors`]; never persisted. Rows
/// sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posteriors {
    data: Vec<f32>,
    n: usize,
    k: usize,
}

impl Posteriors {
    /// Number of descriptor rows.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of mixture components.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Borrow the posterior row for descriptor `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.k..(i + 1) * self.k]
    }

    /// The flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Pre-trained Gaussian mixture with diagonal covariances.
///
/// Parameters are stored as flat f32 blocks (`components * dim` values for
/// means and variances); derived quantities used by inference are f64.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalGmm {
    weights: Vec<f32>,
    means: Vec<f32>,
    variances: Vec<f32>,
    dim: usize,
    // Derived, precomputed at construction.
    log_weights: Vec<f64>,
    log_norms: Vec<f64>,
    inv_variances: Vec<f64>,
}

impl DiagonalGmm {
    /// Build a mixture from raw parameter blocks.
    ///
    /// `weights` has one entry per component; `means` and `variances` hold
    /// `components * dim` values, component-major. Weights need not sum to
    /// one (posterior normalization cancels any global scale), but every
    /// weight and variance must be positive and finite.
    pub fn new(weights: Vec<f32>, means: Vec<f32>, variances: Vec<f32>, dim: usize) -> Result<Self> {
        let k = weights.len();
        if k == 0 {
            return Err(GmmError::NoComponents);
        }
        if dim == 0 {
            return Err(GmmError::ZeroDimension);
        }
        let expected = k * dim;
        if means.len() != expected {
            return Err(GmmError::BlockLength {
                name: "means",
                got: means.len(),
                expected,
            });
        }
        if variances.len() != expected {
            return Err(GmmError::BlockLength {
                name: "variances",
                got: variances.len(),
                expected,
            });
        }
        for (index, &value) in weights.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(GmmError::InvalidWeight { index, value });
            }
        }
        for (index, &value) in variances.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(GmmError::InvalidVariance { index, value });
            }
        }

        let log_weights: Vec<f64> = weights.iter().map(|&w| (w as f64).ln()).collect();
        let inv_variances: Vec<f64> = variances.iter().map(|&v| 1.0 / v as f64).collect();
        let log_norms: Vec<f64> = (0..k)
            .map(|c| {
                let block = &variances[c * dim..(c + 1) * dim];
                -0.5 * block.iter().map(|&v| (2.0 * PI * v as f64).ln()).sum::<f64>()
            })
            .collect();

        Ok(Self {
            weights,
            means,
            variances,
            dim,
            log_weights,
            log_norms,
            inv_variances,
        })
    }

    /// Number of mixture components.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.weights.len()
    }

    /// Descriptor dimension the mixture was trained on.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Component weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Flat component-major mean block (`components * dim` values).
    #[inline]
    pub fn means(&self) -> &[f32] {
        &self.means
    }

    /// Flat component-major variance block (`components * dim` values).
    #[inline]
    pub fn variances(&self) -> &[f32] {
        &self.variances
    }

    /// Mean of component `c`.
    #[inline]
    pub fn component_mean(&self, c: usize) -> &[f32] {
        &self.means[c * self.dim..(c + 1) * self.dim]
    }

    /// Variance diagonal of component `c`.
    #[inline]
    pub fn component_variance(&self, c: usize) -> &[f32] {
        &self.variances[c * self.dim..(c + 1) * self.dim]
    }

    /// Compute the posterior matrix for a descriptor batch.
    pub fn posteriors(&self, descriptors: &DescriptorSet) -> Result<Posteriors> {
        let mut out = Posteriors::default();
        self.posteriors_into(descriptors, &mut out)?;
        Ok(out)
    }

    /// Compute posteriors into an existing buffer, reusing its allocation.
    pub fn posteriors_into(&self, descriptors: &DescriptorSet, out: &mut Posteriors) -> Result<()> {
        if descriptors.dim() != self.dim {
            return Err(GmmError::DimensionMismatch {
                descriptors: descriptors.dim(),
                model: self.dim,
            });
        }
        let n = descriptors.len();
        let k = self.num_components();
        out.data.clear();
        out.data.resize(n * k, 0.0);
        out.n = n;
        out.k = k;

        let mut scores = vec![0.0f64; k];
        for (i, x) in descriptors.rows().enumerate() {
            let mut max_score = f64::NEG_INFINITY;
            for c in 0..k {
                let base = c * self.dim;
                let mut quad = 0.0f64;
                for (d, &xd) in x.iter().enumerate() {
                    let diff = xd as f64 - self.means[base + d] as f64;
                    quad += diff * diff * self.inv_variances[base + d];
                }
                let score = self.log_weights[c] + self.log_norms[c] - 0.5 * quad;
                scores[c] = score;
                if score > max_score {
                    max_score = score;
                }
            }

            let mut total = 0.0f64;
            for score in scores.iter_mut() {
                *score = (*score - max_score).exp();
                total += *score;
            }
            let row = &mut out.data[i * k..(i + 1) * k];
            for (q, &score) in row.iter_mut().zip(scores.iter()) {
                *q = (score / total) as f32;
            }
        }
        Ok(())
    }
}
