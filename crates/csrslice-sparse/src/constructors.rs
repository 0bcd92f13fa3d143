//! Constructors for synthetic CSR stores
//!
//! Used to build benchmark inputs and property-test fixtures without touching
//! the file system.
//!
//! # Examples
//!
//! ```
//! use csrslice_sparse::constructors::random;
//!
//! let csr = random(100, 50, 0.1, 42).unwrap();
//! assert_eq!(csr.shape(), (100, 50));
//! assert!(csr.density() > 0.0 && csr.density() < 0.3);
//! ```

use crate::csr::CsrStore;
use crate::error::{SparseError, SparseResult};
use scirs2_core::random::{rngs::StdRng, RngCore, SeedableRng};

/// Resolution of the density threshold
const DENSITY_SCALE: u64 = 1 << 20;

/// Seeded random store where each cell is stored with probability `density`
///
/// Stored values lie in `(0, 1]`, so every stored entry is non-zero. The same
/// seed always yields the same store.
///
/// # Errors
///
/// [`SparseError::InvalidArgument`] if `density` is not in `[0, 1]` or a
/// column index would not fit in `u32`.
pub fn random(nrows: usize, ncols: usize, density: f64, seed: u64) -> SparseResult<CsrStore> {
    if !(0.0..=1.0).contains(&density) {
        return Err(SparseError::InvalidArgument(format!(
            "density must be in [0, 1], got {density}"
        )));
    }
    if ncols > 0 && ncols - 1 > u32::MAX as usize {
        return Err(SparseError::InvalidArgument(format!(
            "ncols {ncols} exceeds the u32 column index range"
        )));
    }

    let threshold = (density * DENSITY_SCALE as f64) as u64;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut row_ptr = Vec::with_capacity(nrows + 1);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();

    row_ptr.push(0);
    for _ in 0..nrows {
        for col in 0..ncols {
            let r = rng.next_u64();
            if r % DENSITY_SCALE < threshold {
                // Top 24 bits give an exactly representable value in (0, 1].
                let value = ((r >> 40) as f32 + 1.0) / (1u32 << 24) as f32;
                col_indices.push(col as u32);
                values.push(value);
            }
        }
        row_ptr.push(values.len());
    }

    Ok(CsrStore::new(row_ptr, col_indices, values, (nrows, ncols))?)
}

/// Identity matrix of size n×n
pub fn identity(n: usize) -> SparseResult<CsrStore> {
    if n > 0 && n - 1 > u32::MAX as usize {
        return Err(SparseError::InvalidArgument(format!(
            "size {n} exceeds the u32 column index range"
        )));
    }
    let row_ptr = (0..=n).collect();
    let col_indices = (0..n).map(|i| i as u32).collect();
    let values = vec![1.0; n];
    Ok(CsrStore::new(row_ptr, col_indices, values, (n, n))?)
}
