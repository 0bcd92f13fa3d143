//! C API tests: status codes, output contracts and handle lifecycles
//!
//! All tests share the process-wide engine, so they only make assertions
//! about handles they created themselves.

use csrslice_ffi::{
    csrslice_clear_last_error, csrslice_dense_data, csrslice_dense_free, csrslice_init,
    csrslice_last_error, csrslice_live_handles, csrslice_slice, csrslice_store_free,
    csrslice_store_load, csrslice_store_save, csrslice_store_shape, CsrsliceLoadResult,
    CsrsliceSliceArgs, CSRSLICE_ERROR_FORMAT, CSRSLICE_ERROR_INVALID_ARGUMENT,
    CSRSLICE_ERROR_INVALID_HANDLE, CSRSLICE_ERROR_IO, CSRSLICE_ERROR_OUT_OF_RANGE,
    CSRSLICE_SUCCESS,
};
use csrslice_sparse::constructors::random;
use csrslice_sparse::io::save;
use csrslice_sparse::CsrStore;
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::{Arc, Barrier};
use std::thread;

/// Test fixture owning a temp directory with the 3×3 example store
struct Fixture {
    _dir: tempfile::TempDir,
    path: CString,
}

impl Fixture {
    fn new() -> Self {
        Self::with_store(
            &CsrStore::new(vec![0, 1, 1, 3], vec![0, 0, 1], vec![1.0, 4.0, 5.0], (3, 3)).unwrap(),
        )
    }

    fn with_store(store: &CsrStore) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("store.bin");
        save(store, &path).expect("Failed to write store");
        Self {
            path: c_path(&path),
            _dir: dir,
        }
    }

    fn load(&self) -> CsrsliceLoadResult {
        let mut out = CsrsliceLoadResult::default();
        let status = unsafe { csrslice_store_load(self.path.as_ptr(), &mut out) };
        assert_eq!(status, CSRSLICE_SUCCESS, "load failed: {:?}", last_error());
        out
    }
}

fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}

fn last_error() -> Option<String> {
    let ptr = csrslice_last_error();
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

fn slice_args(store_handle: u64, indices: &[i32]) -> CsrsliceSliceArgs {
    CsrsliceSliceArgs {
        store_handle,
        indices: indices.as_ptr(),
        count: indices.len() as u64,
        dense_handle: 0,
        data_out: ptr::null(),
        nrows_out: 0,
        ncols_out: 0,
    }
}

unsafe fn dense_slice<'a>(args: &CsrsliceSliceArgs) -> &'a [f32] {
    let len = (args.nrows_out * args.ncols_out) as usize;
    if len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(args.data_out, len) }
    }
}

#[test]
fn test_init_is_idempotent() {
    assert_eq!(csrslice_init(), CSRSLICE_SUCCESS);
    assert_eq!(csrslice_init(), CSRSLICE_SUCCESS);
}

#[test]
fn test_three_by_three_scenario() {
    let fixture = Fixture::new();
    let loaded = fixture.load();
    assert_ne!(loaded.store_handle, 0);
    assert_eq!((loaded.nrows, loaded.ncols), (3, 3));

    let indices = [0i32, 1, 2];
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);
    assert_eq!((args.nrows_out, args.ncols_out), (3, 3));
    assert_eq!(
        unsafe { dense_slice(&args) },
        &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 5.0, 0.0]
    );

    assert_eq!(csrslice_dense_free(args.dense_handle), CSRSLICE_SUCCESS);
    assert_eq!(csrslice_store_free(loaded.store_handle), CSRSLICE_SUCCESS);
}

#[test]
fn test_duplicates_and_order() {
    let fixture = Fixture::new();
    let loaded = fixture.load();

    let indices = [2i32, 0, 2];
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);
    assert_eq!(
        unsafe { dense_slice(&args) },
        &[4.0, 5.0, 0.0, 1.0, 0.0, 0.0, 4.0, 5.0, 0.0]
    );

    csrslice_dense_free(args.dense_handle);
    csrslice_store_free(loaded.store_handle);
}

#[test]
fn test_out_of_range_leaves_outputs_untouched() {
    let fixture = Fixture::new();
    let loaded = fixture.load();

    for bad in [[0i32, -1], [3, 0]] {
        let mut args = slice_args(loaded.store_handle, &bad);
        let status = unsafe { csrslice_slice(&mut args) };
        assert_eq!(status, CSRSLICE_ERROR_OUT_OF_RANGE);
        assert_eq!(args.dense_handle, 0);
        assert!(args.data_out.is_null());
        assert!(last_error().unwrap().contains("out of range"));
    }

    csrslice_store_free(loaded.store_handle);
}

#[test]
fn test_empty_request() {
    let fixture = Fixture::new();
    let loaded = fixture.load();

    let mut args = slice_args(loaded.store_handle, &[]);
    args.indices = ptr::null();
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);
    assert_eq!((args.nrows_out, args.ncols_out), (0, 3));
    assert_eq!(csrslice_dense_free(args.dense_handle), CSRSLICE_SUCCESS);

    let mut args = slice_args(loaded.store_handle, &[]);
    args.indices = ptr::null();
    args.count = 2;
    assert_eq!(
        unsafe { csrslice_slice(&mut args) },
        CSRSLICE_ERROR_INVALID_ARGUMENT
    );

    csrslice_store_free(loaded.store_handle);
}

#[test]
fn test_double_free_is_reported() {
    let fixture = Fixture::new();
    let loaded = fixture.load();
    let indices = [1i32];
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);

    assert_eq!(csrslice_dense_free(args.dense_handle), CSRSLICE_SUCCESS);
    assert_eq!(
        csrslice_dense_free(args.dense_handle),
        CSRSLICE_ERROR_INVALID_HANDLE
    );
    assert_eq!(csrslice_store_free(loaded.store_handle), CSRSLICE_SUCCESS);
    assert_eq!(
        csrslice_store_free(loaded.store_handle),
        CSRSLICE_ERROR_INVALID_HANDLE
    );
    assert_eq!(csrslice_store_free(0), CSRSLICE_ERROR_INVALID_HANDLE);

    // Released stores cannot be sliced
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(
        unsafe { csrslice_slice(&mut args) },
        CSRSLICE_ERROR_INVALID_HANDLE
    );
}

#[test]
fn test_dense_handle_is_not_a_store_handle() {
    let fixture = Fixture::new();
    let loaded = fixture.load();
    let indices = [0i32];
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);

    assert_eq!(
        csrslice_store_free(args.dense_handle),
        CSRSLICE_ERROR_INVALID_HANDLE
    );
    assert_eq!(
        csrslice_dense_free(loaded.store_handle),
        CSRSLICE_ERROR_INVALID_HANDLE
    );

    assert_eq!(csrslice_dense_free(args.dense_handle), CSRSLICE_SUCCESS);
    assert_eq!(csrslice_store_free(loaded.store_handle), CSRSLICE_SUCCESS);
}

#[test]
fn test_dense_data_and_shape_queries() {
    let fixture = Fixture::with_store(&random(20, 7, 0.4, 9).unwrap());
    let loaded = fixture.load();

    let (mut nrows, mut ncols, mut nnz) = (0u64, 0u64, 0u64);
    let status =
        unsafe { csrslice_store_shape(loaded.store_handle, &mut nrows, &mut ncols, &mut nnz) };
    assert_eq!(status, CSRSLICE_SUCCESS);
    assert_eq!((nrows, ncols), (20, 7));
    assert!(nnz > 0);

    let indices = [19i32, 3];
    let mut args = slice_args(loaded.store_handle, &indices);
    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);

    let mut data: *const f32 = ptr::null();
    let (mut rows, mut cols) = (0u64, 0u64);
    let status = unsafe { csrslice_dense_data(args.dense_handle, &mut data, &mut rows, &mut cols) };
    assert_eq!(status, CSRSLICE_SUCCESS);
    assert_eq!(data, args.data_out);
    assert_eq!((rows, cols), (2, 7));

    let mut live_stores = 0u64;
    let mut live_dense = 0u64;
    assert_eq!(
        unsafe { csrslice_live_handles(&mut live_stores, &mut live_dense) },
        CSRSLICE_SUCCESS
    );
    assert!(live_stores >= 1 && live_dense >= 1);

    csrslice_dense_free(args.dense_handle);
    csrslice_store_free(loaded.store_handle);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut out = CsrsliceLoadResult::default();

    let missing = c_path(&dir.path().join("missing.bin"));
    assert_eq!(
        unsafe { csrslice_store_load(missing.as_ptr(), &mut out) },
        CSRSLICE_ERROR_IO
    );
    assert!(last_error().unwrap().contains("missing.bin"));

    let truncated = dir.path().join("truncated.bin");
    std::fs::write(&truncated, [0u8; 20]).unwrap();
    let truncated = c_path(&truncated);
    assert_eq!(
        unsafe { csrslice_store_load(truncated.as_ptr(), &mut out) },
        CSRSLICE_ERROR_FORMAT
    );
    assert_eq!(out.store_handle, 0);

    assert_eq!(
        unsafe { csrslice_store_load(truncated.as_ptr(), ptr::null_mut()) },
        CSRSLICE_ERROR_INVALID_ARGUMENT
    );
}

#[test]
fn test_save_roundtrip() {
    let fixture = Fixture::new();
    let loaded = fixture.load();

    let dir = tempfile::tempdir().unwrap();
    let copy = c_path(&dir.path().join("copy.bin"));
    assert_eq!(
        unsafe { csrslice_store_save(loaded.store_handle, copy.as_ptr()) },
        CSRSLICE_SUCCESS
    );

    let mut reloaded = CsrsliceLoadResult::default();
    assert_eq!(
        unsafe { csrslice_store_load(copy.as_ptr(), &mut reloaded) },
        CSRSLICE_SUCCESS
    );
    assert_ne!(reloaded.store_handle, loaded.store_handle);
    assert_eq!((reloaded.nrows, reloaded.ncols), (3, 3));

    csrslice_store_free(reloaded.store_handle);
    csrslice_store_free(loaded.store_handle);
}

#[test]
fn test_last_error_is_per_thread_and_clearable() {
    let status = csrslice_store_free(0);
    assert_eq!(status, CSRSLICE_ERROR_INVALID_HANDLE);
    assert!(last_error().is_some());

    let other = thread::spawn(|| {
        let ptr = csrslice_last_error();
        ptr.is_null()
    });
    assert!(other.join().unwrap());

    csrslice_clear_last_error();
    assert!(last_error().is_none());
}

#[test]
fn test_concurrent_slicing_from_threads() {
    let fixture = Fixture::with_store(&random(300, 50, 0.2, 21).unwrap());
    let loaded = fixture.load();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            let store = loaded.store_handle;
            thread::spawn(move || {
                barrier.wait();
                for i in 0..25 {
                    let indices = [(t * 25 + i) as i32 % 300, 0];
                    let mut args = slice_args(store, &indices);
                    assert_eq!(unsafe { csrslice_slice(&mut args) }, CSRSLICE_SUCCESS);
                    assert_eq!((args.nrows_out, args.ncols_out), (2, 50));
                    assert_eq!(csrslice_dense_free(args.dense_handle), CSRSLICE_SUCCESS);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(csrslice_store_free(loaded.store_handle), CSRSLICE_SUCCESS);
}
