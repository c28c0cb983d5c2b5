//! Dense row-major matrix used by the feature and kernel computations.
//!
//! Feature batches and Gram accumulators are flat `Vec<f64>` buffers with
//! explicit index arithmetic. Values are f64: expanded features flow through
//! standardization and running kernel sums, and the extra width keeps those
//! accumulations stable while stored statistics stay f32.

use super::types::ShapeError;

/// Dense row-major matrix of f64 values.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl DenseMatrix {
    /// Create a matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap a flat row-major buffer; the row count is inferred from `cols`.
    pub fn from_flat(data: Vec<f64>, cols: usize) -> Result<Self, ShapeError> {
        if cols == 0 || data.len() % cols != 0 {
            return Err(ShapeError::NotMultiple {
                len: data.len(),
                width: cols,
            });
        }
        let rows = data.len() / cols;
        Ok(Self { data, rows, cols })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at (row, col).
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Borrow row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Mutably borrow row `i`.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// The whole buffer in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the whole buffer in row-major order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Accumulate the product of two feature batches: `self += a * b^T`.
    ///
    /// `a` is (rows x w), `b` is (cols x w); entry (i, j) gains the dot
    /// product of row i of `a` with row j of `b`. Callers validate shapes
    /// and report typed errors; here mismatches are programming errors.
    pub fn add_gram(&mut self, a: &DenseMatrix, b: &DenseMatrix) {
        debug_assert_eq!(a.cols, b.cols, "gram factors must share row width");
        debug_assert_eq!(self.rows, a.rows, "gram rows mismatch");
        debug_assert_eq!(self.cols, b.rows, "gram cols mismatch");

        for i in 0..self.rows {
            let ai = a.row(i);
            let out = &mut self.data[i * self.cols..(i + 1) * self.cols];
            for (j, out_ij) in out.iter_mut().enumerate() {
                let bj = b.row(j);
                let dot: f64 = ai.iter().zip(bj).map(|(x, y)| x * y).sum();
                *out_ij += dot;
            }
        }
    }
}
