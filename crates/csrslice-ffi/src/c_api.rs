//! C entry points
//!
//! All functions share one process-wide [`Engine`], created on first use from
//! the `CSRSLICE_*` environment variables. Handles are `uint64_t` values; `0`
//! is never a valid handle. Output pointers are written only on success.
//!
//! No entry point unwinds: panics are caught and reported as
//! `CSRSLICE_ERROR_PANIC`.

use crate::error::{
    clear_last_error, last_error_ptr, set_last_error, FfiError, CSRSLICE_SUCCESS,
};
use csrslice_runtime::{
    init_tracing, DenseHandle, Engine, EngineConfig, EngineError, StoreHandle, TracingConfig,
};
use std::any::Any;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::OnceLock;

static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Result of `csrslice_store_load`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrsliceLoadResult {
    pub store_handle: u64,
    pub nrows: u64,
    pub ncols: u64,
}

/// Arguments and results of `csrslice_slice`
///
/// The caller fills `store_handle`, `indices` and `count`; on success the
/// library fills `dense_handle`, `data_out`, `nrows_out` and `ncols_out`.
/// `data_out` is read-only and stays valid until `dense_handle` is freed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CsrsliceSliceArgs {
    pub store_handle: u64,
    pub indices: *const i32,
    pub count: u64,
    pub dense_handle: u64,
    pub data_out: *const f32,
    pub nrows_out: u64,
    pub ncols_out: u64,
}

fn engine() -> Result<&'static Engine, FfiError> {
    if let Some(engine) = ENGINE.get() {
        return Ok(engine);
    }
    let config = EngineConfig::from_env().map_err(EngineError::from)?;
    Ok(ENGINE.get_or_init(|| Engine::new(config)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one entry point body, mapping errors and panics to status codes
fn guarded<F>(name: &'static str, body: F) -> c_int
where
    F: FnOnce() -> Result<(), FfiError>,
{
    clear_last_error();
    let outcome = panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(FfiError::Panic(panic_message(payload.as_ref()))));
    match outcome {
        Ok(()) => CSRSLICE_SUCCESS,
        Err(e) => {
            tracing::debug!(call = name, error = %e, "C API call failed");
            set_last_error(&e)
        }
    }
}

unsafe fn path_arg<'a>(path: *const c_char) -> Result<&'a Path, FfiError> {
    if path.is_null() {
        return Err(FfiError::invalid("path must not be null"));
    }
    let path = unsafe { CStr::from_ptr(path) }
        .to_str()
        .map_err(|e| FfiError::invalid(format!("path is not valid UTF-8: {e}")))?;
    Ok(Path::new(path))
}

unsafe fn out_arg<'a, T>(ptr: *mut T, name: &str) -> Result<&'a mut T, FfiError> {
    unsafe { ptr.as_mut() }.ok_or_else(|| FfiError::invalid(format!("{name} must not be null")))
}

/// Library version as a static NUL-terminated string
#[unsafe(no_mangle)]
pub extern "C" fn csrslice_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Create the process engine and, when the host has none, a tracing subscriber
///
/// Optional: every other entry point creates the engine on first use. Safe to
/// call repeatedly.
#[unsafe(no_mangle)]
pub extern "C" fn csrslice_init() -> c_int {
    guarded("csrslice_init", || {
        if let Err(e) = init_tracing(TracingConfig::default()) {
            tracing::debug!(error = %e, "keeping existing tracing subscriber");
        }
        engine().map(|_| ())
    })
}

/// Load a store from `path` and register it
///
/// # Safety
///
/// `path` must be a valid NUL-terminated string and `out` must point to a
/// writable `CsrsliceLoadResult`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_store_load(
    path: *const c_char,
    out: *mut CsrsliceLoadResult,
) -> c_int {
    guarded("csrslice_store_load", || {
        let path = unsafe { path_arg(path) }?;
        let out = unsafe { out_arg(out, "out") }?;

        let loaded = engine()?.load(path)?;
        *out = CsrsliceLoadResult {
            store_handle: loaded.handle.into_raw(),
            nrows: loaded.nrows as u64,
            ncols: loaded.ncols as u64,
        };
        Ok(())
    })
}

/// Write a registered store to `path` in the binary layout
///
/// # Safety
///
/// `path` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_store_save(store_handle: u64, path: *const c_char) -> c_int {
    guarded("csrslice_store_save", || {
        let path = unsafe { path_arg(path) }?;
        engine()?.save(StoreHandle::from_raw(store_handle), path)?;
        Ok(())
    })
}

/// Shape and stored-entry count of a registered store
///
/// # Safety
///
/// Each non-null output pointer must be writable; null outputs are skipped.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_store_shape(
    store_handle: u64,
    nrows_out: *mut u64,
    ncols_out: *mut u64,
    nnz_out: *mut u64,
) -> c_int {
    guarded("csrslice_store_shape", || {
        let store = engine()?.store(StoreHandle::from_raw(store_handle))?;
        let (nrows, ncols) = store.shape();
        unsafe {
            if let Some(out) = nrows_out.as_mut() {
                *out = nrows as u64;
            }
            if let Some(out) = ncols_out.as_mut() {
                *out = ncols as u64;
            }
            if let Some(out) = nnz_out.as_mut() {
                *out = store.nnz() as u64;
            }
        }
        Ok(())
    })
}

/// Gather `args.count` rows of a store into a new dense matrix
///
/// Indices are `int32_t` and must lie in `[0, nrows)`; negative values are
/// rejected. On failure no handle is created and `args` outputs are left
/// untouched.
///
/// # Safety
///
/// `args` must point to a valid `CsrsliceSliceArgs` whose `indices` points to
/// `count` readable `int32_t` values (it may be null when `count` is 0).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_slice(args: *mut CsrsliceSliceArgs) -> c_int {
    guarded("csrslice_slice", || {
        let args = unsafe { out_arg(args, "args") }?;
        let count = usize::try_from(args.count)
            .map_err(|_| FfiError::invalid(format!("count {} is too large", args.count)))?;

        let indices: &[i32] = if count == 0 {
            &[]
        } else if args.indices.is_null() {
            return Err(FfiError::invalid("indices must not be null when count > 0"));
        } else {
            unsafe { std::slice::from_raw_parts(args.indices, count) }
        };

        let sliced = engine()?.slice(StoreHandle::from_raw(args.store_handle), indices)?;
        let (nrows, ncols) = sliced.shape();
        args.dense_handle = sliced.handle.into_raw();
        args.data_out = sliced.as_ptr();
        args.nrows_out = nrows as u64;
        args.ncols_out = ncols as u64;
        Ok(())
    })
}

/// Buffer and shape of a registered dense matrix
///
/// # Safety
///
/// `data_out` must be writable; non-null shape outputs must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_dense_data(
    dense_handle: u64,
    data_out: *mut *const f32,
    nrows_out: *mut u64,
    ncols_out: *mut u64,
) -> c_int {
    guarded("csrslice_dense_data", || {
        let data = unsafe { out_arg(data_out, "data_out") }?;
        let dense = engine()?.dense(DenseHandle::from_raw(dense_handle))?;
        let (nrows, ncols) = dense.shape();

        // The registry keeps its own reference until the handle is freed
        *data = dense.as_ptr();
        unsafe {
            if let Some(out) = nrows_out.as_mut() {
                *out = nrows as u64;
            }
            if let Some(out) = ncols_out.as_mut() {
                *out = ncols as u64;
            }
        }
        Ok(())
    })
}

/// Release a store; a second free returns `CSRSLICE_ERROR_INVALID_HANDLE`
#[unsafe(no_mangle)]
pub extern "C" fn csrslice_store_free(store_handle: u64) -> c_int {
    guarded("csrslice_store_free", || {
        engine()?.free_store(StoreHandle::from_raw(store_handle))?;
        Ok(())
    })
}

/// Release a dense matrix and its buffer; a second free returns
/// `CSRSLICE_ERROR_INVALID_HANDLE`
#[unsafe(no_mangle)]
pub extern "C" fn csrslice_dense_free(dense_handle: u64) -> c_int {
    guarded("csrslice_dense_free", || {
        engine()?.free_dense(DenseHandle::from_raw(dense_handle))?;
        Ok(())
    })
}

/// Message for the last failed call on this thread, or null
///
/// The pointer stays valid until the next C API call on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn csrslice_last_error() -> *const c_char {
    last_error_ptr()
}

#[unsafe(no_mangle)]
pub extern "C" fn csrslice_clear_last_error() {
    clear_last_error();
}

/// Number of live store and dense handles
///
/// # Safety
///
/// Each non-null output pointer must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn csrslice_live_handles(stores_out: *mut u64, dense_out: *mut u64) -> c_int {
    guarded("csrslice_live_handles", || {
        let engine = engine()?;
        unsafe {
            if let Some(out) = stores_out.as_mut() {
                *out = engine.live_stores() as u64;
            }
            if let Some(out) = dense_out.as_mut() {
                *out = engine.live_dense() as u64;
            }
        }
        Ok(())
    })
}
