//! Unified error types for the CSR store, codec and slice engine
//!
//! # Design
//!
//! - **`SparseError`**: top-level enum returned by every fallible operation
//! - **`FormatError`**: malformed or inconsistent CSR content (file or parts)
//! - **`IndexError`**: row lookups outside `[0, nrows)` on a store
//! - **`SliceError`**: requested slice rows outside `[0, nrows)`
//! - **`AllocationError`**: size overflow or memory exhaustion, kept distinct
//!   from every input-validation failure
//!
//! # Examples
//!
//! ```
//! use csrslice_sparse::error::{FormatError, SparseError};
//!
//! let err: SparseError = FormatError::RowPtrStart { found: 3 }.into();
//! assert!(matches!(err, SparseError::Format(_)));
//! assert!(err.to_string().contains("row_ptr[0]"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all store, codec and slice operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// The file could not be opened, mapped, read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSR content
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Store row lookup out of range
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Slice request out of range
    #[error("Slice error: {0}")]
    Slice(#[from] SliceError),

    /// Buffer could not be sized or allocated
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Caller-supplied parameter outside its domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Malformed or inconsistent CSR content
///
/// Every variant names the first offending field or row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Truncated input while reading {field}: need {expected} bytes, {available} available")]
    Truncated {
        field: &'static str,
        expected: u64,
        available: u64,
    },

    #[error("Trailing bytes after values: expected file length {expected}, got {actual}")]
    TrailingBytes { expected: u64, actual: u64 },

    #[error("Header field {field} = {value} does not fit this platform")]
    DimensionOverflow { field: &'static str, value: u64 },

    #[error("Invalid row pointers: length {len} for {nrows} rows (expected {expected})")]
    RowPtrLength {
        len: usize,
        nrows: usize,
        expected: usize,
    },

    #[error("Dense buffer of {actual} elements does not match shape {nrows}×{ncols}")]
    DenseLength {
        nrows: usize,
        ncols: usize,
        actual: usize,
    },

    #[error("Length mismatch: {col_indices} col_indices but {values} values")]
    LengthMismatch { col_indices: usize, values: usize },

    #[error("row_ptr[0] must be 0, found {found}")]
    RowPtrStart { found: usize },

    #[error("Row pointer not sorted at row {row}: {start} > {end}")]
    RowPtrNotSorted { row: usize, start: usize, end: usize },

    #[error("row_ptr[nrows] = {found} does not match nnz = {nnz}")]
    RowPtrEnd { found: usize, nnz: usize },

    #[error("Row pointer past end at row {row}: {end} > nnz = {nnz}")]
    RowPtrPastEnd { row: usize, end: usize, nnz: usize },

    #[error("Column index out of bounds in row {row} at entry {position}: {col} >= {ncols}")]
    ColIndexOutOfBounds {
        row: usize,
        position: usize,
        col: u32,
        ncols: usize,
    },

    #[error("Column indices not strictly increasing in row {row} at entry {position}: {prev} then {col}")]
    ColIndicesNotIncreasing {
        row: usize,
        position: usize,
        prev: u32,
        col: u32,
    },
}

/// Store row lookup outside `[0, nrows)`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Row index out of bounds: {row} >= {nrows}")]
    RowOutOfBounds { row: usize, nrows: usize },
}

/// Slice request that cannot be served
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("Requested row {index} at position {position} is out of range [0, {nrows})")]
    OutOfRange {
        position: usize,
        index: i128,
        nrows: usize,
    },

    #[error("Output buffer has {actual} elements, slice needs {expected}")]
    OutputLength { expected: usize, actual: usize },
}

/// Buffer sizing or allocation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Dense shape {nrows}×{ncols} overflows the address space")]
    SizeOverflow { nrows: usize, ncols: usize },

    #[error("Out of memory allocating {elements} elements for {what}")]
    Exhausted { what: &'static str, elements: usize },
}

/// Result type alias for sparse operations
pub type SparseResult<T> = Result<T, SparseError>;

impl SparseError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SparseError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a slice out-of-range error
    pub fn out_of_range(position: usize, index: i128, nrows: usize) -> Self {
        SparseError::Slice(SliceError::OutOfRange {
            position,
            index,
            nrows,
        })
    }
}

/// Reserve exactly `len` elements, reporting exhaustion as [`AllocationError`]
pub(crate) fn try_vec_with_capacity<T>(
    len: usize,
    what: &'static str,
) -> Result<Vec<T>, AllocationError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| AllocationError::Exhausted {
            what,
            elements: len,
        })?;
    Ok(v)
}
