//! # csrslice-sparse
//!
//! CSR feature matrices and row-indexed dense extraction for csrslice.
//!
//! This crate provides:
//! - `CsrStore`: immutable CSR matrix (`u32` columns, `f32` values)
//! - `DenseMatrix`: row-major dense output buffer
//! - Binary codec with one pinned little-endian layout (`io`)
//! - Row slicing: ordered, duplicate-tolerant gather of rows into a dense matrix
//! - Seeded synthetic constructors for benchmarks and tests

#![deny(warnings)]

pub mod constructors;
pub mod csr;
pub mod dense;
pub mod error;
pub mod io;
pub mod slice;

// Re-exports
pub use csr::*;
pub use dense::*;
pub use error::*;
pub use io::{FormatHeader, LoadOptions};
pub use slice::*;
