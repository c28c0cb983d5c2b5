//! Kernel accumulation over per-channel feature batches.
//!
//! Train/test kernel matrices are built channel by channel: every channel
//! contributes one (train, test) feature pair, and the accumulator sums
//! Gram matrices and squared L2 norms across channels. Finalization divides
//! the sums by the combined norms, which is equivalent to L2-normalizing
//! the concatenation of all channels' feature vectors.

use crate::core::DenseMatrix;
use crate::encoding::{Standardizer, l2_norms_squared, power_normalize};

use super::{KernelError, Result};

/// Knobs for the per-pair normalization pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelConfig {
    /// Exponent of the signed power normalization.
    pub power_alpha: f64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { power_alpha: 0.5 }
    }
}

impl KernelConfig {
    /// Set the power-normalization exponent.
    pub fn with_power_alpha(mut self, alpha: f64) -> Self {
        self.power_alpha = alpha;
        self
    }
}

/// Running kernel state: train-train and test-train Gram sums plus the
/// per-sample L2 denominators.
///
/// Sized once for the sample counts and mutated in place by
/// [`process_pair`](KernelAccumulator::process_pair); callers read the
/// state through [`finalize`](KernelAccumulator::finalize) after the batch
/// completes. Never cleared implicitly.
#[derive(Debug, Clone)]
pub struct KernelAccumulator {
    kxx: DenseMatrix,
    kyx: DenseMatrix,
    zx: Vec<f64>,
    zy: Vec<f64>,
    pairs: usize,
}

impl KernelAccumulator {
    /// Accumulator for `n_train` training and `n_test` test samples.
    pub fn new(n_train: usize, n_test: usize) -> Self {
        Self {
            kxx: DenseMatrix::zeros(n_train, n_train),
            kyx: DenseMatrix::zeros(n_test, n_train),
            zx: vec![0.0; n_train],
            zy: vec![0.0; n_test],
            pairs: 0,
        }
    }

    /// Number of training samples this accumulator is sized for.
    #[inline]
    pub fn n_train(&self) -> usize {
        self.zx.len()
    }

    /// Number of test samples this accumulator is sized for.
    #[inline]
    pub fn n_test(&self) -> usize {
        self.zy.len()
    }

    /// Number of pairs accumulated since construction or the last reset.
    #[inline]
    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Zero all accumulated state.
    pub fn reset(&mut self) {
        self.kxx.fill(0.0);
        self.kyx.fill(0.0);
        self.zx.iter_mut().for_each(|z| *z = 0.0);
        self.zy.iter_mut().for_each(|z| *z = 0.0);
        self.pairs = 0;
    }

    /// Fold one channel's feature pair into the accumulator.
    ///
    /// Standardization parameters are fitted on `train` and reused for
    /// `test`; fitting them per side would place the two sets in different
    /// coordinate systems. Both matrices are consumed since they are
    /// normalized in place.
    pub fn process_pair(
        &mut self,
        mut train: DenseMatrix,
        mut test: DenseMatrix,
        config: &KernelConfig,
    ) -> Result<()> {
        if train.rows() != self.n_train() {
            return Err(KernelError::TrainRowCount {
                got: train.rows(),
                expected: self.n_train(),
            });
        }
        if test.rows() != self.n_test() {
            return Err(KernelError::TestRowCount {
                got: test.rows(),
                expected: self.n_test(),
            });
        }

        let standardizer = Standardizer::fit(&train)?;
        standardizer.apply(&mut train)?;
        standardizer.apply(&mut test)?;
        power_normalize(&mut train, config.power_alpha);
        power_normalize(&mut test, config.power_alpha);

        for (z, n) in self.zx.iter_mut().zip(l2_norms_squared(&train)) {
            *z += n;
        }
        for (z, n) in self.zy.iter_mut().zip(l2_norms_squared(&test)) {
            *z += n;
        }
        self.kxx.add_gram(&train, &train);
        self.kyx.add_gram(&test, &train);
        self.pairs += 1;
        Ok(())
    }

    /// L2-normalized kernels `(kxx, kyx)`.
    ///
    /// Entry `(i, j)` of the train-train kernel is divided by
    /// `sqrt(zx[i] * zx[j])`, and of the test-train kernel by
    /// `sqrt(zy[i] * zx[j])`. Samples whose features stayed identically
    /// zero keep zero entries instead of turning into NaN.
    pub fn finalize(&self) -> (DenseMatrix, DenseMatrix) {
        let zx_root: Vec<f64> = self.zx.iter().map(|&z| norm_root(z)).collect();
        let zy_root: Vec<f64> = self.zy.iter().map(|&z| norm_root(z)).collect();

        let mut kxx = self.kxx.clone();
        for i in 0..kxx.rows() {
            let row = kxx.row_mut(i);
            for (j, v) in row.iter_mut().enumerate() {
                *v /= zx_root[i] * zx_root[j];
            }
        }

        let mut kyx = self.kyx.clone();
        for i in 0..kyx.rows() {
            let row = kyx.row_mut(i);
            for (j, v) in row.iter_mut().enumerate() {
                *v /= zy_root[i] * zx_root[j];
            }
        }
        (kxx, kyx)
    }

    /// Raw train-train Gram sum, before L2 normalization.
    #[inline]
    pub fn kxx_raw(&self) -> &DenseMatrix {
        &self.kxx
    }

    /// Raw test-train Gram sum, before L2 normalization.
    #[inline]
    pub fn kyx_raw(&self) -> &DenseMatrix {
        &self.kyx
    }

    /// Accumulated squared norms of the training samples.
    #[inline]
    pub fn zx(&self) -> &[f64] {
        &self.zx
    }

    /// Accumulated squared norms of the test samples.
    #[inline]
    pub fn zy(&self) -> &[f64] {
        &self.zy
    }
}

fn norm_root(z: f64) -> f64 {
    if z > 0.0 {
        z.sqrt()
    } else {
        1.0
    }
}
