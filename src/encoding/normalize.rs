//! Normalization steps applied to feature rows before kernel accumulation.
//!
//! Order matters: standardize with parameters fitted on the training rows,
//! power-normalize, then rescale by the L2 norms at kernel finalization.

use crate::core::DenseMatrix;

use super::{EncodingError, Result};

/// Per-column affine transform fitted on training features.
///
/// Fitting records the column means and standard deviations (population
/// form, dividing by the row count); applying maps each column to zero mean
/// and unit spread. The same fitted transform must be applied to training
/// and test rows so that both live in a common coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardizer {
    /// Fit column statistics on a feature matrix.
    ///
    /// Columns with no spread get scale 1 so that applying the transform
    /// maps them to zero instead of dividing by zero.
    pub fn fit(features: &DenseMatrix) -> Result<Self> {
        if features.rows() == 0 {
            return Err(EncodingError::EmptyBatch);
        }
        let cols = features.cols();
        let inv_n = 1.0 / features.rows() as f64;

        let mut mean = vec![0.0f64; cols];
        for r in 0..features.rows() {
            for (m, &v) in mean.iter_mut().zip(features.row(r)) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m *= inv_n;
        }

        let mut scale = vec![0.0f64; cols];
        for r in 0..features.rows() {
            for ((s, &v), &m) in scale.iter_mut().zip(features.row(r)).zip(mean.iter()) {
                let d = v - m;
                *s += d * d;
            }
        }
        for s in scale.iter_mut() {
            *s = (*s * inv_n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    /// Apply the fitted transform in place.
    pub fn apply(&self, features: &mut DenseMatrix) -> Result<()> {
        if features.cols() != self.mean.len() {
            return Err(EncodingError::WidthMismatch {
                got: features.cols(),
                expected: self.mean.len(),
            });
        }
        for r in 0..features.rows() {
            for ((v, &m), &s) in features
                .row_mut(r)
                .iter_mut()
                .zip(self.mean.iter())
                .zip(self.scale.iter())
            {
                *v = (*v - m) / s;
            }
        }
        Ok(())
    }

    /// Fitted column means.
    #[inline]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted column scales.
    #[inline]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Signed power normalization, `x -> sign(x) * |x|^alpha`, in place.
///
/// `alpha` in `(0, 1)` compresses large coordinates; 0.5 is the usual
/// choice for Fisher vectors.
pub fn power_normalize(features: &mut DenseMatrix, alpha: f64) {
    for v in features.as_mut_slice().iter_mut() {
        *v = v.signum() * v.abs().powf(alpha);
    }
}

/// Squared L2 norm of every row.
pub fn l2_norms_squared(features: &DenseMatrix) -> Vec<f64> {
    (0..features.rows())
        .map(|r| features.row(r).iter().map(|&v| v * v).sum())
        .collect()
}
