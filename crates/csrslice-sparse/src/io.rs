//! Binary CSR file format
//!
//! Reads and writes [`CsrStore`]s in a single fixed binary layout. Loading
//! memory-maps the file and decodes it in one pass.
//!
//! # Binary Format
//!
//! All integers are little-endian; values are IEEE-754 `f32`. There is no
//! magic number and no version tag.
//!
//! - num_rows: u64 (8 bytes)
//! - num_cols: u64 (8 bytes)
//! - nnz: u64 (8 bytes)
//! - row_ptr: [u64; num_rows + 1]
//! - col_idx: [u32; nnz]
//! - values: [f32; nnz]
//!
//! The file length must equal `24 + 8 * (num_rows + 1) + 8 * nnz` exactly.
//! The length is checked before any array is allocated.
//!
//! # Example
//!
//! ```
//! use csrslice_sparse::io::{decode, encode, LoadOptions};
//! use csrslice_sparse::CsrStore;
//!
//! let csr = CsrStore::new(vec![0, 1, 1, 3], vec![0, 0, 1], vec![1.0, 4.0, 5.0], (3, 3)).unwrap();
//!
//! let mut bytes = Vec::new();
//! encode(&csr, &mut bytes).unwrap();
//! assert_eq!(bytes.len(), 24 + 8 * 4 + 4 * 3 + 4 * 3);
//!
//! let back = decode(&bytes, &LoadOptions::default()).unwrap();
//! assert_eq!(back, csr);
//! ```

use crate::csr::{ColumnOrder, CsrStore};
use crate::error::{try_vec_with_capacity, FormatError, SparseError, SparseResult};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Byte length of the fixed header
pub const HEADER_LEN: usize = 24;

const ROW_PTR_WIDTH: u64 = 8;
const COL_IDX_WIDTH: u64 = 4;
const VALUE_WIDTH: u64 = 4;

/// Options applied while decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Column ordering enforced within each row
    pub column_order: ColumnOrder,
}

/// Fixed-width file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub num_rows: u64,
    pub num_cols: u64,
    pub nnz: u64,
}

impl FormatHeader {
    /// Header describing an existing store
    pub fn of(store: &CsrStore) -> Self {
        Self {
            num_rows: store.nrows() as u64,
            num_cols: store.ncols() as u64,
            nnz: store.nnz() as u64,
        }
    }

    /// Parse the header from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::Truncated {
                field: "header",
                expected: HEADER_LEN as u64,
                available: bytes.len() as u64,
            });
        }
        Ok(Self {
            num_rows: read_u64(&bytes[0..8]),
            num_cols: read_u64(&bytes[8..16]),
            nnz: read_u64(&bytes[16..24]),
        })
    }

    /// Serialize to the on-disk representation
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(&self.num_rows.to_le_bytes());
        out[8..16].copy_from_slice(&self.num_cols.to_le_bytes());
        out[16..24].copy_from_slice(&self.nnz.to_le_bytes());
        out
    }

    /// Byte ranges of the three arrays, and the total file length
    fn layout(&self) -> Result<Layout, FormatError> {
        let overflow = |field: &'static str, value: u64| FormatError::DimensionOverflow { field, value };

        let row_ptr_len = self
            .num_rows
            .checked_add(1)
            .ok_or(overflow("num_rows", self.num_rows))?;
        let row_ptr_bytes = row_ptr_len
            .checked_mul(ROW_PTR_WIDTH)
            .ok_or(overflow("num_rows", self.num_rows))?;
        let col_idx_bytes = self
            .nnz
            .checked_mul(COL_IDX_WIDTH)
            .ok_or(overflow("nnz", self.nnz))?;
        let values_bytes = self
            .nnz
            .checked_mul(VALUE_WIDTH)
            .ok_or(overflow("nnz", self.nnz))?;

        let row_ptr_end = (HEADER_LEN as u64)
            .checked_add(row_ptr_bytes)
            .ok_or(overflow("num_rows", self.num_rows))?;
        let col_idx_end = row_ptr_end
            .checked_add(col_idx_bytes)
            .ok_or(overflow("nnz", self.nnz))?;
        let values_end = col_idx_end
            .checked_add(values_bytes)
            .ok_or(overflow("nnz", self.nnz))?;

        Ok(Layout {
            row_ptr_end,
            col_idx_end,
            values_end,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Layout {
    row_ptr_end: u64,
    col_idx_end: u64,
    values_end: u64,
}

/// Total encoded size of `store` in bytes
pub fn encoded_len(store: &CsrStore) -> u64 {
    HEADER_LEN as u64
        + (store.nrows() as u64 + 1) * ROW_PTR_WIDTH
        + store.nnz() as u64 * (COL_IDX_WIDTH + VALUE_WIDTH)
}

/// Decode a store from its binary representation
///
/// # Errors
///
/// - [`FormatError`] for any length, range or ordering violation, naming the
///   first offending field or row
/// - [`AllocationError`](crate::error::AllocationError) if the arrays cannot
///   be allocated
pub fn decode(bytes: &[u8], options: &LoadOptions) -> SparseResult<CsrStore> {
    let header = FormatHeader::parse(bytes)?;
    let layout = header.layout()?;
    let available = bytes.len() as u64;

    for (field, end) in [
        ("row_ptr", layout.row_ptr_end),
        ("col_idx", layout.col_idx_end),
        ("values", layout.values_end),
    ] {
        if available < end {
            return Err(FormatError::Truncated {
                field,
                expected: end,
                available,
            }
            .into());
        }
    }
    if available > layout.values_end {
        return Err(FormatError::TrailingBytes {
            expected: layout.values_end,
            actual: available,
        }
        .into());
    }

    // Every range below is in bounds and fits usize: it lies inside `bytes`.
    let nrows = to_usize("num_rows", header.num_rows)?;
    let ncols = to_usize("num_cols", header.num_cols)?;
    let nnz = to_usize("nnz", header.nnz)?;
    let row_ptr_bytes = &bytes[HEADER_LEN..layout.row_ptr_end as usize];
    let col_idx_bytes = &bytes[layout.row_ptr_end as usize..layout.col_idx_end as usize];
    let values_bytes = &bytes[layout.col_idx_end as usize..layout.values_end as usize];

    let mut row_ptr = try_vec_with_capacity(nrows + 1, "row_ptr")?;
    for chunk in row_ptr_bytes.chunks_exact(ROW_PTR_WIDTH as usize) {
        row_ptr.push(to_usize("row_ptr", read_u64(chunk))?);
    }

    let mut col_indices = try_vec_with_capacity(nnz, "col_idx")?;
    col_indices.extend(
        col_idx_bytes
            .chunks_exact(COL_IDX_WIDTH as usize)
            .map(read_u32),
    );

    let mut values = try_vec_with_capacity(nnz, "values")?;
    values.extend(
        values_bytes
            .chunks_exact(VALUE_WIDTH as usize)
            .map(|chunk| f32::from_bits(read_u32(chunk))),
    );

    let store = CsrStore::with_column_order(
        row_ptr,
        col_indices,
        values,
        (nrows, ncols),
        options.column_order,
    )?;
    Ok(store)
}

/// Encode a store into `writer`
pub fn encode<W: Write>(store: &CsrStore, mut writer: W) -> std::io::Result<()> {
    writer.write_all(&FormatHeader::of(store).to_bytes())?;

    for &ptr in store.row_ptr() {
        writer.write_all(&(ptr as u64).to_le_bytes())?;
    }
    for &col in store.col_indices() {
        writer.write_all(&col.to_le_bytes())?;
    }
    for &value in store.values() {
        writer.write_all(&value.to_le_bytes())?;
    }

    writer.flush()
}

/// Load a store from a binary file
///
/// The file is memory-mapped and decoded; the map is dropped before
/// returning, so the store owns all of its data.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> SparseResult<CsrStore> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SparseError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| SparseError::io(path, e))?
        .len();

    // Zero-length files cannot be mapped on every platform.
    let store = if len == 0 {
        decode(&[], options)?
    } else {
        // Safety: the map is read-only and private to this call; the bytes are
        // copied into owned arrays before it is dropped.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SparseError::io(path, e))?;
        decode(&mmap, options)?
    };

    tracing::info!(
        nrows = store.nrows(),
        ncols = store.ncols(),
        nnz = store.nnz(),
        bytes = len,
        "loaded CSR store"
    );
    Ok(store)
}

/// Save a store to a binary file, replacing any existing file
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn save<P: AsRef<Path>>(store: &CsrStore, path: P) -> SparseResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SparseError::io(path, e))?;
    encode(store, BufWriter::new(file)).map_err(|e| SparseError::io(path, e))?;

    tracing::info!(
        nrows = store.nrows(),
        nnz = store.nnz(),
        bytes = encoded_len(store),
        "saved CSR store"
    );
    Ok(())
}

fn to_usize(field: &'static str, value: u64) -> Result<usize, FormatError> {
    usize::try_from(value).map_err(|_| FormatError::DimensionOverflow { field, value })
}

fn read_u64(chunk: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    u64::from_le_bytes(buf)
}

fn read_u32(chunk: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(chunk);
    u32::from_le_bytes(buf)
}
