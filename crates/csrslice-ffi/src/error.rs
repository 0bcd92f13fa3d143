//! Status codes and per-thread error detail for the C API
//!
//! Every entry point returns `CSRSLICE_SUCCESS` (0) or one negative code. The
//! message of the most recent failure on the calling thread stays available
//! through `csrslice_last_error` until the next call on that thread.

use csrslice_runtime::{EngineError, ErrorKind};
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;
use thiserror::Error;

pub const CSRSLICE_SUCCESS: c_int = 0;
pub const CSRSLICE_ERROR_INVALID_ARGUMENT: c_int = -1;
pub const CSRSLICE_ERROR_IO: c_int = -2;
pub const CSRSLICE_ERROR_FORMAT: c_int = -3;
pub const CSRSLICE_ERROR_OUT_OF_RANGE: c_int = -4;
pub const CSRSLICE_ERROR_INVALID_HANDLE: c_int = -5;
pub const CSRSLICE_ERROR_ALLOCATION: c_int = -6;
pub const CSRSLICE_ERROR_CAPACITY: c_int = -7;
pub const CSRSLICE_ERROR_CONFIG: c_int = -8;
pub const CSRSLICE_ERROR_PANIC: c_int = -9;
pub const CSRSLICE_ERROR_INTERNAL: c_int = -10;

/// Failure of one C API call
#[derive(Error, Debug)]
pub enum FfiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Panic in native code: {0}")]
    Panic(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FfiError {
    pub fn status(&self) -> c_int {
        match self {
            FfiError::InvalidArgument(_) => CSRSLICE_ERROR_INVALID_ARGUMENT,
            FfiError::Engine(e) => match e.kind() {
                ErrorKind::Io => CSRSLICE_ERROR_IO,
                ErrorKind::Format => CSRSLICE_ERROR_FORMAT,
                ErrorKind::Index | ErrorKind::OutOfRange => CSRSLICE_ERROR_OUT_OF_RANGE,
                ErrorKind::InvalidArgument => CSRSLICE_ERROR_INVALID_ARGUMENT,
                ErrorKind::InvalidHandle => CSRSLICE_ERROR_INVALID_HANDLE,
                ErrorKind::Allocation => CSRSLICE_ERROR_ALLOCATION,
                ErrorKind::Capacity => CSRSLICE_ERROR_CAPACITY,
                ErrorKind::Config => CSRSLICE_ERROR_CONFIG,
            },
            FfiError::Panic(_) => CSRSLICE_ERROR_PANIC,
            FfiError::Internal(_) => CSRSLICE_ERROR_INTERNAL,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        FfiError::InvalidArgument(msg.into())
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `err` as this thread's last error and return its status code
pub fn set_last_error(err: &FfiError) -> c_int {
    let message = CString::new(err.to_string().replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
    err.status()
}

pub fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// This thread's last error message, if any
pub fn last_error_message() -> Option<String> {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|msg| msg.to_string_lossy().into_owned())
    })
}

/// Pointer to this thread's last error message, or null
///
/// Valid until the next C API call on the same thread.
pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |msg| msg.as_ptr())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use csrslice_runtime::{HandleError, HandleKind};
    use csrslice_sparse::SparseError;

    #[test]
    fn test_status_codes_are_distinct() {
        let codes = [
            CSRSLICE_ERROR_INVALID_ARGUMENT,
            CSRSLICE_ERROR_IO,
            CSRSLICE_ERROR_FORMAT,
            CSRSLICE_ERROR_OUT_OF_RANGE,
            CSRSLICE_ERROR_INVALID_HANDLE,
            CSRSLICE_ERROR_ALLOCATION,
            CSRSLICE_ERROR_CAPACITY,
            CSRSLICE_ERROR_CONFIG,
            CSRSLICE_ERROR_PANIC,
            CSRSLICE_ERROR_INTERNAL,
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_engine_error_status() {
        let err = FfiError::from(EngineError::from(SparseError::out_of_range(0, -2, 4)));
        assert_eq!(err.status(), CSRSLICE_ERROR_OUT_OF_RANGE);

        let err = FfiError::from(EngineError::from(HandleError::Null {
            expected: HandleKind::Dense,
        }));
        assert_eq!(err.status(), CSRSLICE_ERROR_INVALID_HANDLE);
    }

    #[test]
    fn test_last_error_roundtrip() {
        clear_last_error();
        assert!(last_error_ptr().is_null());

        let status = set_last_error(&FfiError::invalid("count\0overflow"));
        assert_eq!(status, CSRSLICE_ERROR_INVALID_ARGUMENT);
        assert_eq!(
            last_error_message().as_deref(),
            Some("Invalid argument: count overflow")
        );
        assert!(!last_error_ptr().is_null());

        clear_last_error();
        assert_eq!(last_error_message(), None);
    }
}
