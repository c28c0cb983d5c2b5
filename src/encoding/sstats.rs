//! Sufficient-statistics extraction.
//!
//! Condenses a descriptor batch with spatio-temporal locations into a
//! fixed-length vector, following the spatial Fisher vector construction of
//! Krapac et al., "Modeling spatial layout with Fisher vectors for image
//! categorization" (ICCV 2011). For a mixture with K components the vector
//! holds three blocks:
//!
//! ```text
//! [ soft counts | first moments | second moments ]     K + 3K + 3K values
//! ```
//!
//! With Q the N x K posterior matrix and L the N x 3 location matrix, the
//! blocks are `sum_n Q[n, c] / N`, `(Q' L) / N` and `(Q' L^2) / N`. Moment
//! blocks are component-major: entry `3c + a` pairs component `c` with axis
//! `a` in x, y, t order. Statistics for one slice are all downstream stages
//! need; the descriptors themselves can be discarded after this step.

use crate::core::{DescriptorSet, Location};
use crate::model::DiagonalGmm;

use super::{EncodingError, Result};

/// Length of the statistics vector for one slice under a K-component mixture.
#[inline]
pub fn spatial_sstats_len(k: usize) -> usize {
    k * (1 + 2 * Location::AXES)
}

/// Compute spatial sufficient statistics for one slice.
///
/// `locations` must hold one entry per descriptor row, already normalized to
/// `[0, 1]` against the video extents. Accumulation runs in f64 and is
/// rounded to f32 once at the end, so the result does not depend on batch
/// ordering beyond f64 rounding.
pub fn compute_spatial_sstats(
    descriptors: &DescriptorSet,
    locations: &[Location],
    gmm: &DiagonalGmm,
) -> Result<Vec<f32>> {
    if descriptors.len() != locations.len() {
        return Err(EncodingError::RowMismatch {
            descriptors: descriptors.len(),
            locations: locations.len(),
        });
    }
    if descriptors.is_empty() {
        return Err(EncodingError::EmptyBatch);
    }

    let k = gmm.num_components();
    let posteriors = gmm.posteriors(descriptors)?;

    let mut counts = vec![0.0f64; k];
    let mut first = vec![0.0f64; Location::AXES * k];
    let mut second = vec![0.0f64; Location::AXES * k];

    for (i, location) in locations.iter().enumerate() {
        let axes = location.as_array();
        for (c, &q) in posteriors.row(i).iter().enumerate() {
            let q = q as f64;
            counts[c] += q;
            let base = Location::AXES * c;
            for (a, &l) in axes.iter().enumerate() {
                let l = l as f64;
                first[base + a] += q * l;
                second[base + a] += q * l * l;
            }
        }
    }

    let inv_n = 1.0 / descriptors.len() as f64;
    let mut out = Vec::with_capacity(spatial_sstats_len(k));
    out.extend(counts.iter().map(|&v| (v * inv_n) as f32));
    out.extend(first.iter().map(|&v| (v * inv_n) as f32));
    out.extend(second.iter().map(|&v| (v * inv_n) as f32));
    Ok(out)
}
