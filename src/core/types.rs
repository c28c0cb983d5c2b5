//! Descriptor and location types for spatial Fisher-vector encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when raw data does not match the declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Flat buffer length is not a multiple of the row width.
    #[error("data length {len} is not a multiple of row width {width}")]
    NotMultiple {
        /// Number of values in the flat buffer.
        len: usize,
        /// Declared row width.
        width: usize,
    },

    /// A pushed row has the wrong number of values.
    #[error("row has {got} values, expected {expected}")]
    RowLength {
        /// Number of values in the offending row.
        got: usize,
        /// Row width of the set.
        expected: usize,
    },
}

/// Normalized location of a local descriptor inside a video volume.
///
/// Coordinates are expressed in the unit cube: `x` and `y` are the frame
/// position divided by frame width/height, `t` is the frame index divided
/// by the video length. All three lie in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal position in [0, 1].
    pub x: f32,
    /// Vertical position in [0, 1].
    pub y: f32,
    /// Temporal position in [0, 1].
    pub t: f32,
}

impl Location {
    /// Number of location axes (x, y, t).
    pub const AXES: usize = 3;

    /// Create a new location.
    #[inline]
    pub fn new(x: f32, y: f32, t: f32) -> Self {
        Self { x, y, t }
    }

    /// The coordinates as an array in (x, y, t) order.
    #[inline]
    pub fn as_array(&self) -> [f32; Self::AXES] {
        [self.x, self.y, self.t]
    }
}

/// A batch of D-dimensional local descriptors, one row per detected feature.
///
/// Rows are stored contiguously (row-major) so the posterior computation can
/// walk descriptors without indirection. Descriptors are typically
/// PCA-projected local features, f32 like everything at rest in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    data: Vec<f32>,
    dim: usize,
}

impl DescriptorSet {
    /// Create an empty set of `dim`-dimensional descriptors.
    pub fn new(dim: usize) -> Self {
        debug_assert!(dim > 0, "descriptor dimension must be positive");
        Self {
            data: Vec::new(),
            dim,
        }
    }

    /// Create an empty set with room for `capacity` descriptors.
    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        debug_assert!(dim > 0, "descriptor dimension must be positive");
        Self {
            data: Vec::with_capacity(dim * capacity),
            dim,
        }
    }

    /// Wrap a flat row-major buffer as an N x `dim` descriptor set.
    pub fn from_flat(data: Vec<f32>, dim: usize) -> Result<Self, ShapeError> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(ShapeError::NotMultiple {
                len: data.len(),
                width: dim,
            });
        }
        Ok(Self { data, dim })
    }

    /// Append one descriptor row.
    pub fn push(&mut self, row: &[f32]) -> Result<(), ShapeError> {
        if row.len() != self.dim {
            return Err(ShapeError::RowLength {
                got: row.len(),
                expected: self.dim,
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Number of descriptors in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Check if the set holds no descriptors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dimensionality of each descriptor.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Borrow descriptor `i` as a slice of length `dim`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over descriptor rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }

    /// The underlying flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
