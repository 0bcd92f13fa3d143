//! # csrslice
//!
//! CSR feature matrices with row-indexed dense extraction.
//!
//! This is the **meta crate** that re-exports all csrslice components.
//!
//! ## Quick Start
//!
//! ```
//! use csrslice::prelude::*;
//!
//! let csr = CsrStore::new(vec![0, 1, 1, 3], vec![0, 0, 1], vec![1.0, 4.0, 5.0], (3, 3))?;
//! let dense = csr.slice_rows(&[0i32, 1, 2])?;
//! assert_eq!(dense.row(2), Some(&[4.0, 5.0, 0.0][..]));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### CSR Store and Slicing ([`sparse`])
//!
//! Validated CSR matrices, the pinned binary layout and the row gather.
//!
//! ```
//! use csrslice::sparse::{constructors, io, LoadOptions};
//!
//! let csr = constructors::random(100, 40, 0.1, 7)?;
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("features.bin");
//! io::save(&csr, &path)?;
//! assert_eq!(io::load(&path, &LoadOptions::default())?, csr);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ### Handles and the Engine ([`runtime`])
//!
//! Generation-tagged handles, the registry and scoped guards.
//!
//! ```
//! use csrslice::prelude::*;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let store = engine.adopt(CsrStore::zeros((4, 2))?)?;
//! let dense = store.slice(&[3i32, 3])?;
//! assert_eq!(dense.shape(), (2, 2));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ### C ABI (`ffi`, feature `ffi`)
//!
//! `csrslice_store_load`, `csrslice_slice`, `csrslice_*_free` and friends,
//! declared in `crates/csrslice-ffi/include/csrslice.h`.

#![deny(warnings)]

pub use csrslice_runtime as runtime;
pub use csrslice_sparse as sparse;

#[cfg(feature = "ffi")]
pub use csrslice_ffi as ffi;

pub mod prelude {
    //! Prelude module for convenient imports

    // Store and slicing
    pub use crate::sparse::{
        slice_rows, slice_rows_into, ColumnOrder, CsrStore, DenseMatrix, LoadOptions, RowIndex,
        SparseError, SparseResult,
    };

    // Engine
    pub use crate::runtime::{
        DenseHandle, Engine, EngineConfig, EngineError, EngineResult, ErrorKind, StoreHandle,
    };
}
