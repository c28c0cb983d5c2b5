//! Feature expansion: stored statistics to spatial Fisher vector rows.
//!
//! Expansion is a pure function of the statistics and two constant vectors,
//! the parameters of the spatial prior: a single Gaussian over locations
//! drawn uniformly from the normalized video volume, with mean 1/2 and
//! variance 1/12 per axis. Each slice of statistics becomes one feature row
//! `[ d_mm | d_S ]` of width 6K, the gradients with respect to the prior
//! mean and variance:
//!
//! ```text
//! d_mm[3c + a] = Qll[3c + a] - Qsum[c] * mm[a]
//! d_S [3c + a] = -Qll2[3c + a] - Qsum[c] * mm[a]^2 + Qsum[c] * S[a]
//!               + 2 * Qll[3c + a] * mm[a]
//! ```
//!
//! Expansion runs in f64 and feature rows stay f64 through normalization
//! and kernel accumulation.

use crate::core::{DenseMatrix, Location};

use super::{EncodingError, Result, spatial_sstats_len};

/// Mean of the uniform spatial prior, per axis.
pub const PRIOR_MEAN: [f64; Location::AXES] = [0.5, 0.5, 0.5];

/// Variance of the uniform spatial prior, per axis (uniform on `[0, 1]`
/// has variance 1/12).
pub const PRIOR_VARIANCE: [f64; Location::AXES] = [1.0 / 12.0, 1.0 / 12.0, 1.0 / 12.0];

/// Width of one feature row for a K-component mixture.
#[inline]
pub fn spatial_feature_len(k: usize) -> usize {
    2 * Location::AXES * k
}

/// Expand statistics into feature rows, one per stored slice.
///
/// `sstats` must hold a positive whole number of slices of length
/// [`spatial_sstats_len`]`(k)`; the result has that many rows and
/// [`spatial_feature_len`]`(k)` columns.
pub fn expand_spatial_features(sstats: &[f32], k: usize) -> Result<DenseMatrix> {
    let unit = spatial_sstats_len(k);
    if unit == 0 || sstats.is_empty() || sstats.len() % unit != 0 {
        return Err(EncodingError::BadStatsLength {
            len: sstats.len(),
            unit,
        });
    }

    let slices = sstats.len() / unit;
    let width = spatial_feature_len(k);
    let half = width / 2;
    let mut out = DenseMatrix::zeros(slices, width);

    for (s, slice) in sstats.chunks_exact(unit).enumerate() {
        let qsum = &slice[..k];
        let qll = &slice[k..k + Location::AXES * k];
        let qll2 = &slice[k + Location::AXES * k..];
        let row = out.row_mut(s);

        for c in 0..k {
            let count = qsum[c] as f64;
            for a in 0..Location::AXES {
                let j = Location::AXES * c + a;
                let moment1 = qll[j] as f64;
                let moment2 = qll2[j] as f64;
                let mm = PRIOR_MEAN[a];
                row[j] = moment1 - count * mm;
                row[half + j] = -moment2 - count * mm * mm
                    + count * PRIOR_VARIANCE[a]
                    + 2.0 * moment1 * mm;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centered_slice_has_zero_mean_gradient() {
        // Soft count 1 with both moments at 0.5: locations centered on the
        // prior, so the mean gradient vanishes.
        let sstats = vec![1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        let features = expand_spatial_features(&sstats, 1).unwrap();

        assert_eq!(features.rows(), 1);
        assert_eq!(features.cols(), 6);
        for a in 0..3 {
            assert_relative_eq!(features.at(0, a), 0.0);
            // -0.5 - 0.25 + 1/12 + 0.5 = -1/6
            assert_relative_eq!(features.at(0, 3 + a), -1.0 / 6.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dead_component_expands_to_zeros() {
        // Component 1 received no posterior mass; its triplets must stay
        // zero in both halves.
        let mut sstats = vec![0.0f32; spatial_sstats_len(2)];
        sstats[0] = 1.0; // count for component 0
        sstats[2] = 0.4; // first moments of component 0
        sstats[3] = 0.5;
        sstats[4] = 0.6;
        sstats[8] = 0.3; // second moments of component 0
        sstats[9] = 0.35;
        sstats[10] = 0.45;

        let features = expand_spatial_features(&sstats, 2).unwrap();
        assert_eq!(features.cols(), 12);
        for a in 0..3 {
            assert_relative_eq!(features.at(0, 3 + a), 0.0);
            assert_relative_eq!(features.at(0, 9 + a), 0.0);
        }
        // Component 0 is live.
        assert_relative_eq!(features.at(0, 0), 0.4 - 0.5, epsilon = 1e-7);
    }

    #[test]
    fn test_multiple_slices_expand_rowwise() {
        let one = vec![1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        let mut two = one.clone();
        two.extend([1.0, 0.6, 0.5, 0.5, 0.5, 0.5, 0.5]);

        let features = expand_spatial_features(&two, 1).unwrap();
        assert_eq!(features.rows(), 2);
        assert_relative_eq!(features.at(0, 0), 0.0);
        assert_relative_eq!(features.at(1, 0), 0.1, epsilon = 1e-7);
    }

    #[test]
    fn test_rejects_partial_slice() {
        let sstats = vec![0.0f32; 10];
        assert_eq!(
            expand_spatial_features(&sstats, 1).unwrap_err(),
            EncodingError::BadStatsLength { len: 10, unit: 7 }
        );
    }

    #[test]
    fn test_rejects_empty_input() {
        assert_eq!(
            expand_spatial_features(&[], 2).unwrap_err(),
            EncodingError::BadStatsLength { len: 0, unit: 14 }
        );
    }
}
