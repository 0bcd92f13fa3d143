//! # csrslice-runtime
//!
//! Handle-based slice engine for csrslice.
//!
//! This crate provides:
//! - Generation-tagged handles for stores and dense results
//! - A lock-protected slot registry with concurrent lookups
//! - `Engine`: load, slice, resolve and free through handles
//! - Scoped guards that release their handle on drop
//! - Environment-driven engine configuration and tracing setup

#![deny(warnings)]

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod registry;
pub mod tracing_support;

pub use config::EngineConfig;
pub use engine::{DenseGuard, Engine, EngineStats, LoadedStore, SlicedDense, StoreGuard};
pub use error::{CapacityError, ConfigError, EngineError, EngineResult, ErrorKind, HandleError};
pub use handle::{DenseHandle, HandleKind, RawHandle, StoreHandle};
pub use registry::{Registry, RegistryConfig, RegistryStats};
pub use tracing_support::{init_tracing, TracingConfig, TracingFormat};
