//! Row slicing: gather an ordered list of CSR rows into a dense matrix
//!
//! Output row `i` is the dense expansion of source row `indices[i]`. Indices
//! may repeat and need not be sorted; every occurrence produces its own fully
//! materialised row. Columns absent from a source row are exactly `0.0`.
//!
//! All indices are validated before the output buffer is allocated, so a
//! failing request allocates nothing. The scatter touches only stored entries:
//! the work over the source is O(total requested nnz).
//!
//! # Examples
//!
//! ```
//! use csrslice_sparse::{slice_rows, CsrStore};
//!
//! let csr = CsrStore::new(vec![0, 1, 1, 3], vec![0, 0, 1], vec![1.0, 4.0, 5.0], (3, 3)).unwrap();
//!
//! let dense = slice_rows(&csr, &[2i32, 0, 2]).unwrap();
//! assert_eq!(dense.shape(), (3, 3));
//! assert_eq!(dense.row(0), Some(&[4.0, 5.0, 0.0][..]));
//! assert_eq!(dense.row(1), Some(&[1.0, 0.0, 0.0][..]));
//! assert_eq!(dense.row(2), Some(&[4.0, 5.0, 0.0][..]));
//!
//! assert!(slice_rows(&csr, &[-1i32]).is_err());
//! ```

use crate::csr::CsrStore;
use crate::dense::{dense_len, DenseMatrix};
use crate::error::{SliceError, SparseResult};

/// Integer types accepted as requested row indices
pub trait RowIndex: Copy {
    /// The index as a row number, or `None` if it is negative or too large
    fn to_row(self) -> Option<usize>;

    /// The exact index value for error reports
    fn to_i128(self) -> i128;
}

impl RowIndex for i32 {
    #[inline]
    fn to_row(self) -> Option<usize> {
        usize::try_from(self).ok()
    }

    #[inline]
    fn to_i128(self) -> i128 {
        i128::from(self)
    }
}

impl RowIndex for i64 {
    #[inline]
    fn to_row(self) -> Option<usize> {
        usize::try_from(self).ok()
    }

    #[inline]
    fn to_i128(self) -> i128 {
        i128::from(self)
    }
}

impl RowIndex for u32 {
    #[inline]
    fn to_row(self) -> Option<usize> {
        usize::try_from(self).ok()
    }

    #[inline]
    fn to_i128(self) -> i128 {
        i128::from(self)
    }
}

impl RowIndex for usize {
    #[inline]
    fn to_row(self) -> Option<usize> {
        Some(self)
    }

    #[inline]
    fn to_i128(self) -> i128 {
        // usize is at most 64 bits wide
        self as i128
    }
}

/// Check that every index lies in `[0, nrows)`
///
/// # Errors
///
/// [`SliceError::OutOfRange`] for the first offending index, with its
/// position in `indices`.
pub fn validate_indices<I: RowIndex>(store: &CsrStore, indices: &[I]) -> Result<(), SliceError> {
    let nrows = store.nrows();
    for (position, &index) in indices.iter().enumerate() {
        match index.to_row() {
            Some(row) if row < nrows => {}
            _ => {
                return Err(SliceError::OutOfRange {
                    position,
                    index: index.to_i128(),
                    nrows,
                })
            }
        }
    }
    Ok(())
}

/// Gather the requested rows into a new dense matrix
///
/// The result has shape `(indices.len(), store.ncols())`.
///
/// # Errors
///
/// - [`SliceError::OutOfRange`] if any index is outside `[0, nrows)`
/// - [`AllocationError`](crate::error::AllocationError) if the output cannot
///   be sized or allocated
pub fn slice_rows<I: RowIndex>(store: &CsrStore, indices: &[I]) -> SparseResult<DenseMatrix> {
    validate_indices(store, indices)?;

    let mut dense = DenseMatrix::zeros(indices.len(), store.ncols())?;
    scatter_rows(store, indices, dense.as_mut_slice());

    tracing::trace!(
        rows = indices.len(),
        ncols = store.ncols(),
        "sliced rows into dense matrix"
    );
    Ok(dense)
}

/// Gather the requested rows into a caller-provided row-major buffer
///
/// `out` must hold exactly `indices.len() * store.ncols()` elements. Nothing
/// is written unless every index and the buffer length are valid.
pub fn slice_rows_into<I: RowIndex>(
    store: &CsrStore,
    indices: &[I],
    out: &mut [f32],
) -> SparseResult<()> {
    let expected = dense_len(indices.len(), store.ncols())?;
    if out.len() != expected {
        return Err(SliceError::OutputLength {
            expected,
            actual: out.len(),
        }
        .into());
    }
    validate_indices(store, indices)?;

    out.fill(0.0);
    scatter_rows(store, indices, out);
    Ok(())
}

/// Scatter each requested row's stored entries into its output row
///
/// `indices` must already be validated and `out` zeroed.
fn scatter_rows<I: RowIndex>(store: &CsrStore, indices: &[I], out: &mut [f32]) {
    let ncols = store.ncols();
    if ncols == 0 {
        return;
    }

    for (out_row, &index) in out.chunks_exact_mut(ncols).zip(indices) {
        let Some(row) = index.to_row() else {
            continue;
        };
        let (cols, vals) = store.row_span_unchecked(row);
        for (&col, &value) in cols.iter().zip(vals) {
            out_row[col as usize] = value;
        }
    }
}

impl CsrStore {
    /// Gather rows into a dense matrix; see [`slice_rows`]
    pub fn slice_rows<I: RowIndex>(&self, indices: &[I]) -> SparseResult<DenseMatrix> {
        slice_rows(self, indices)
    }
}
