//! CSR (Compressed Sparse Row) store for 2D `f32` feature matrices
//!
//! A [`CsrStore`] is immutable once constructed: it is built by the binary
//! codec (or from validated parts) and then only read.
//!
//! # Format
//!
//! For an m×n sparse matrix with nnz non-zeros:
//! - `row_ptr`: `Vec<usize>` of length m+1 - row_ptr\[i\] points to start of row i
//! - `col_indices`: `Vec<u32>` of length nnz - column index for each non-zero
//! - `values`: `Vec<f32>` of length nnz - the non-zero values
//! - `shape`: (m, n) - dimensions of the matrix
//!
//! Within each row the column indices are strictly increasing.
//!
//! # Examples
//!
//! ```
//! use csrslice_sparse::csr::CsrStore;
//!
//! // [1.0  0    0  ]
//! // [0    0    0  ]
//! // [4.0  5.0  0  ]
//! let row_ptr = vec![0, 1, 1, 3];
//! let col_indices = vec![0, 0, 1];
//! let values = vec![1.0, 4.0, 5.0];
//!
//! let csr = CsrStore::new(row_ptr, col_indices, values, (3, 3)).unwrap();
//! assert_eq!(csr.nnz(), 3);
//!
//! let (cols, vals) = csr.row_span(2).unwrap();
//! assert_eq!(cols, &[0, 1]);
//! assert_eq!(vals, &[4.0, 5.0]);
//! ```

use crate::dense::DenseMatrix;
use crate::error::{FormatError, IndexError, SparseResult};

/// Column ordering requirement applied when a store is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrder {
    /// Column indices strictly increase within every row
    #[default]
    StrictlyIncreasing,
    /// Any order, duplicates allowed; only bounds are checked
    Any,
}

impl ColumnOrder {
    /// Parse from a configuration string (`strict` or `any`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "strictly-increasing" => Some(ColumnOrder::StrictlyIncreasing),
            "any" | "unchecked" => Some(ColumnOrder::Any),
            _ => None,
        }
    }
}

/// Immutable CSR matrix with `f32` values and `u32` column indices
#[derive(Debug, Clone, PartialEq)]
pub struct CsrStore {
    /// Row pointers: row_ptr[i] = start index of row i in col_indices/values
    /// Length: nrows + 1, with row_ptr[nrows] = nnz
    row_ptr: Vec<usize>,

    /// Column indices for each non-zero element
    col_indices: Vec<u32>,

    /// Values of non-zero elements
    values: Vec<f32>,

    /// Shape: (nrows, ncols)
    shape: (usize, usize),
}

impl CsrStore {
    /// Create a new CSR store with strictly increasing columns per row
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`FormatError`]:
    /// - row_ptr length is not nrows + 1
    /// - col_indices and values have different lengths
    /// - row_ptr does not start at 0, decreases, or does not end at nnz
    /// - a column index is out of bounds or out of order within its row
    pub fn new(
        row_ptr: Vec<usize>,
        col_indices: Vec<u32>,
        values: Vec<f32>,
        shape: (usize, usize),
    ) -> Result<Self, FormatError> {
        Self::with_column_order(
            row_ptr,
            col_indices,
            values,
            shape,
            ColumnOrder::StrictlyIncreasing,
        )
    }

    /// Create a new CSR store with an explicit column ordering requirement
    pub fn with_column_order(
        row_ptr: Vec<usize>,
        col_indices: Vec<u32>,
        values: Vec<f32>,
        shape: (usize, usize),
        order: ColumnOrder,
    ) -> Result<Self, FormatError> {
        let (nrows, ncols) = shape;

        let expected = nrows
            .checked_add(1)
            .ok_or(FormatError::DimensionOverflow {
                field: "num_rows",
                value: nrows as u64,
            })?;
        if row_ptr.len() != expected {
            return Err(FormatError::RowPtrLength {
                len: row_ptr.len(),
                nrows,
                expected,
            });
        }

        if col_indices.len() != values.len() {
            return Err(FormatError::LengthMismatch {
                col_indices: col_indices.len(),
                values: values.len(),
            });
        }

        validate_structure(&row_ptr, &col_indices, ncols, order)?;

        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape,
        })
    }

    /// Create an empty store with given shape
    ///
    /// # Errors
    ///
    /// [`FormatError::DimensionOverflow`] if `nrows + 1` does not fit in `usize`.
    pub fn zeros(shape: (usize, usize)) -> Result<Self, FormatError> {
        let len = shape
            .0
            .checked_add(1)
            .ok_or(FormatError::DimensionOverflow {
                field: "num_rows",
                value: shape.0 as u64,
            })?;
        Ok(Self {
            row_ptr: vec![0; len],
            col_indices: Vec::new(),
            values: Vec::new(),
            shape,
        })
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Shape of the matrix (nrows, ncols)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Get row pointers
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Get column indices
    pub fn col_indices(&self) -> &[u32] {
        &self.col_indices
    }

    /// Get values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Compute density (nnz / total_elements)
    pub fn density(&self) -> f64 {
        let total = self.nrows() as f64 * self.ncols() as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.nnz() as f64 / total
    }

    /// Heap bytes held by the three arrays
    pub fn nbytes(&self) -> usize {
        self.row_ptr.len() * std::mem::size_of::<usize>()
            + self.col_indices.len() * std::mem::size_of::<u32>()
            + self.values.len() * std::mem::size_of::<f32>()
    }

    /// Number of stored entries in row `i`
    pub fn row_nnz(&self, i: usize) -> Result<usize, IndexError> {
        self.check_row(i)?;
        Ok(self.row_ptr[i + 1] - self.row_ptr[i])
    }

    /// Get a row as (col_indices, values) slices
    ///
    /// # Errors
    ///
    /// [`IndexError::RowOutOfBounds`] if `i >= nrows`.
    pub fn row_span(&self, i: usize) -> Result<(&[u32], &[f32]), IndexError> {
        self.check_row(i)?;
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        Ok((&self.col_indices[start..end], &self.values[start..end]))
    }

    /// Row span without the bounds check; callers validate `i` first
    #[inline]
    pub(crate) fn row_span_unchecked(&self, i: usize) -> (&[u32], &[f32]) {
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        (&self.col_indices[start..end], &self.values[start..end])
    }

    fn check_row(&self, i: usize) -> Result<(), IndexError> {
        if i >= self.nrows() {
            return Err(IndexError::RowOutOfBounds {
                row: i,
                nrows: self.nrows(),
            });
        }
        Ok(())
    }

    /// Convert to a dense matrix
    pub fn to_dense(&self) -> SparseResult<DenseMatrix> {
        let (nrows, ncols) = self.shape;
        let mut dense = DenseMatrix::zeros(nrows, ncols)?;
        let data = dense.as_mut_slice();

        for row in 0..nrows {
            let (cols, vals) = self.row_span_unchecked(row);
            let base = row * ncols;
            for (&col, &value) in cols.iter().zip(vals) {
                data[base + col as usize] = value;
            }
        }

        Ok(dense)
    }

    /// Create a store from a dense matrix, keeping every non-zero element
    pub fn from_dense(dense: &DenseMatrix) -> SparseResult<Self> {
        let (nrows, ncols) = dense.shape();
        if ncols > 0 && ncols - 1 > u32::MAX as usize {
            return Err(FormatError::DimensionOverflow {
                field: "num_cols",
                value: ncols as u64,
            }
            .into());
        }

        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();

        row_ptr.push(0);
        for row in dense.rows() {
            for (col, &value) in row.iter().enumerate() {
                if value != 0.0 {
                    col_indices.push(col as u32);
                    values.push(value);
                }
            }
            row_ptr.push(values.len());
        }

        Ok(Self::new(row_ptr, col_indices, values, (nrows, ncols))?)
    }
}

/// Check row pointers and per-row column indices, reporting the first violation
fn validate_structure(
    row_ptr: &[usize],
    col_indices: &[u32],
    ncols: usize,
    order: ColumnOrder,
) -> Result<(), FormatError> {
    let nnz = col_indices.len();

    if let Some(&first) = row_ptr.first() {
        if first != 0 {
            return Err(FormatError::RowPtrStart { found: first });
        }
    }

    for (row, w) in row_ptr.windows(2).enumerate() {
        let (start, end) = (w[0], w[1]);
        if start > end {
            return Err(FormatError::RowPtrNotSorted { row, start, end });
        }
        if end > nnz {
            return Err(FormatError::RowPtrPastEnd { row, end, nnz });
        }

        let mut prev: Option<u32> = None;
        for (position, &col) in col_indices[start..end].iter().enumerate() {
            if col as usize >= ncols {
                return Err(FormatError::ColIndexOutOfBounds {
                    row,
                    position,
                    col,
                    ncols,
                });
            }
            if order == ColumnOrder::StrictlyIncreasing {
                if let Some(p) = prev {
                    if col <= p {
                        return Err(FormatError::ColIndicesNotIncreasing {
                            row,
                            position,
                            prev: p,
                            col,
                        });
                    }
                }
                prev = Some(col);
            }
        }
    }

    let last = row_ptr.last().copied().unwrap_or(0);
    if last != nnz {
        return Err(FormatError::RowPtrEnd { found: last, nnz });
    }

    Ok(())
}
