//! Runtime error types
//!
//! [`EngineError`] wraps every failure an engine call can produce. Callers at
//! the C boundary only need [`EngineError::kind`] to pick a status code.

use crate::handle::{HandleKind, RawHandle};
use csrslice_sparse::{SliceError, SparseError};
use thiserror::Error;

/// A handle that does not name a live object of the expected kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("null {expected} handle")]
    Null { expected: HandleKind },

    #[error("handle {handle} is a {found} handle, expected {expected}")]
    WrongKind {
        handle: RawHandle,
        expected: HandleKind,
        found: HandleKind,
    },

    #[error("unknown {expected} handle {handle}")]
    Unknown {
        handle: RawHandle,
        expected: HandleKind,
    },

    #[error("stale {expected} handle {handle}: object already released")]
    Stale {
        handle: RawHandle,
        expected: HandleKind,
    },
}

/// A registry refused a new object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} registry is full ({limit} live objects)")]
pub struct CapacityError {
    pub kind: HandleKind,
    pub limit: usize,
}

/// An environment or configuration value could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Top-level error for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Sparse(#[from] SparseError),

    #[error("Invalid handle: {0}")]
    Handle(#[from] HandleError),

    #[error("Capacity exceeded: {0}")]
    Capacity(#[from] CapacityError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse error category, one per boundary status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Format,
    Index,
    OutOfRange,
    InvalidArgument,
    InvalidHandle,
    Allocation,
    Capacity,
    Config,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Sparse(e) => match e {
                SparseError::Io { .. } => ErrorKind::Io,
                SparseError::Format(_) => ErrorKind::Format,
                SparseError::Index(_) => ErrorKind::Index,
                SparseError::Slice(SliceError::OutOfRange { .. }) => ErrorKind::OutOfRange,
                SparseError::Slice(SliceError::OutputLength { .. }) => ErrorKind::InvalidArgument,
                SparseError::Allocation(_) => ErrorKind::Allocation,
                SparseError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            },
            EngineError::Handle(_) => ErrorKind::InvalidHandle,
            EngineError::Capacity(_) => ErrorKind::Capacity,
            EngineError::Config(_) => ErrorKind::Config,
        }
    }
}
