//! Row-major dense matrices produced by the slice engine
//!
//! A [`DenseMatrix`] owns one contiguous `f32` buffer of `nrows * ncols`
//! elements. Row `i` occupies `data[i * ncols..(i + 1) * ncols]`.
//!
//! # Examples
//!
//! ```
//! use csrslice_sparse::DenseMatrix;
//!
//! let dense = DenseMatrix::from_vec(vec![1.0, 0.0, 0.0, 4.0, 5.0, 0.0], (2, 3)).unwrap();
//! assert_eq!(dense.shape(), (2, 3));
//! assert_eq!(dense.row(1), Some(&[4.0, 5.0, 0.0][..]));
//! assert_eq!(dense.view().unwrap()[[1, 1]], 5.0);
//! ```

use crate::error::{try_vec_with_capacity, AllocationError, FormatError};
use scirs2_core::ndarray_ext::ArrayView2;

/// Dense row-major `f32` matrix
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f32>,
    shape: (usize, usize),
}

impl DenseMatrix {
    /// Allocate a zero-filled matrix
    ///
    /// # Errors
    ///
    /// [`AllocationError::SizeOverflow`] if `nrows * ncols` overflows, and
    /// [`AllocationError::Exhausted`] if the buffer cannot be allocated.
    pub fn zeros(nrows: usize, ncols: usize) -> Result<Self, AllocationError> {
        let len = dense_len(nrows, ncols)?;
        let mut data = try_vec_with_capacity(len, "dense matrix")?;
        data.resize(len, 0.0);
        Ok(Self {
            data,
            shape: (nrows, ncols),
        })
    }

    /// Wrap an existing row-major buffer
    pub fn from_vec(data: Vec<f32>, shape: (usize, usize)) -> Result<Self, FormatError> {
        let (nrows, ncols) = shape;
        if nrows.checked_mul(ncols) != Some(data.len()) {
            return Err(FormatError::DenseLength {
                nrows,
                ncols,
                actual: data.len(),
            });
        }
        Ok(Self { data, shape })
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

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major element buffer
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Pointer to the first element
    ///
    /// Valid for `len()` reads while `self` is alive and unmoved.
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    /// Get a row, or `None` if `i >= nrows`
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.nrows() {
            return None;
        }
        let ncols = self.ncols();
        Some(&self.data[i * ncols..(i + 1) * ncols])
    }

    /// Iterate over rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.nrows()).filter_map(move |i| self.row(i))
    }

    /// Element at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.nrows() || col >= self.ncols() {
            return None;
        }
        Some(self.data[row * self.ncols() + col])
    }

    /// Borrow as a 2-D array view for numeric pipelines
    pub fn view(&self) -> Result<ArrayView2<'_, f32>, FormatError> {
        let (nrows, ncols) = self.shape;
        ArrayView2::from_shape(self.shape, &self.data).map_err(|_| FormatError::DenseLength {
            nrows,
            ncols,
            actual: self.data.len(),
        })
    }

    /// Consume the matrix, returning its row-major buffer
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Element count of an `nrows × ncols` dense buffer
pub(crate) fn dense_len(nrows: usize, ncols: usize) -> Result<usize, AllocationError> {
    nrows
        .checked_mul(ncols)
        .filter(|len| len.checked_mul(std::mem::size_of::<f32>()).is_some())
        .ok_or(AllocationError::SizeOverflow { nrows, ncols })
}
