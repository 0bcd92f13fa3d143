//! C ABI for csrslice
//!
//! Exposes loading CSR stores from the binary layout and slicing rows into
//! dense `float` buffers to C and to language runtimes that call C. The
//! declarations live in `include/csrslice.h`.

#![deny(warnings)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod c_api;
pub mod error;

pub use c_api::*;
pub use error::*;
