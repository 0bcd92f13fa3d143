//! The slice engine: stores and dense results behind handles
//!
//! An [`Engine`] owns two registries, one for loaded CSR stores and one for
//! dense slice results. Every call is synchronous. A store may be sliced from
//! many threads at once; a release racing a slice never invalidates memory the
//! slice is using and later calls with the released handle fail with
//! [`HandleError`](crate::HandleError).
//!
//! # Examples
//!
//! ```
//! use csrslice_runtime::{Engine, EngineConfig};
//! use csrslice_sparse::CsrStore;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let csr = CsrStore::new(vec![0, 1, 1, 3], vec![0, 0, 1], vec![1.0, 4.0, 5.0], (3, 3)).unwrap();
//! let loaded = engine.register_store(csr).unwrap();
//!
//! let sliced = engine.slice(loaded.handle, &[2i32, 0]).unwrap();
//! assert_eq!(sliced.shape(), (2, 3));
//! assert_eq!(sliced.matrix.row(0), Some(&[4.0, 5.0, 0.0][..]));
//!
//! engine.free_dense(sliced.handle).unwrap();
//! engine.free_store(loaded.handle).unwrap();
//! assert!(engine.free_store(loaded.handle).is_err());
//! ```

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::handle::{DenseHandle, HandleKind, StoreHandle};
use crate::registry::{Registry, RegistryStats};
use csrslice_sparse::io;
use csrslice_sparse::{CsrStore, DenseMatrix, FormatError, RowIndex};
use scirs2_core::ndarray_ext::ArrayView2;
use std::path::Path;
use std::sync::Arc;

/// A store registered with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedStore {
    pub handle: StoreHandle,
    pub nrows: usize,
    pub ncols: usize,
    pub nnz: usize,
}

impl LoadedStore {
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
}

/// A registered slice result with shared access to its buffer
///
/// `matrix` stays readable for as long as this value lives, even after the
/// handle is freed.
#[derive(Debug, Clone)]
pub struct SlicedDense {
    pub handle: DenseHandle,
    pub matrix: Arc<DenseMatrix>,
}

impl SlicedDense {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    pub fn view(&self) -> Result<ArrayView2<'_, f32>, FormatError> {
        self.matrix.view()
    }

    /// Pointer to the first element of the row-major buffer
    pub fn as_ptr(&self) -> *const f32 {
        self.matrix.as_ptr()
    }
}

/// Registry statistics for both object kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub stores: RegistryStats,
    pub dense: RegistryStats,
}

/// Handle-based slice engine
pub struct Engine {
    config: EngineConfig,
    stores: Registry<CsrStore>,
    dense: Registry<DenseMatrix>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            stores: Registry::new(HandleKind::Store, config.store_registry()),
            dense: Registry::new(HandleKind::Dense, config.dense_registry()),
            config,
        }
    }

    /// Engine configured from `CSRSLICE_*` environment variables
    pub fn from_env() -> EngineResult<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a store from a binary file and register it
    ///
    /// Nothing is registered if decoding fails.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> EngineResult<LoadedStore> {
        let store = io::load(path.as_ref(), &self.config.load_options())?;
        self.register_store(store)
    }

    /// Register an in-memory store
    pub fn register_store(&self, store: CsrStore) -> EngineResult<LoadedStore> {
        let (nrows, ncols) = store.shape();
        let nnz = store.nnz();
        let handle = StoreHandle::from_raw(self.stores.register(store)?.into_raw());
        Ok(LoadedStore {
            handle,
            nrows,
            ncols,
            nnz,
        })
    }

    /// Write a registered store in the binary layout
    #[tracing::instrument(skip_all, fields(handle = %handle, path = %path.as_ref().display()))]
    pub fn save<P: AsRef<Path>>(&self, handle: StoreHandle, path: P) -> EngineResult<()> {
        let store = self.store(handle)?;
        io::save(&store, path.as_ref())?;
        Ok(())
    }

    /// Resolve a store handle
    pub fn store(&self, handle: StoreHandle) -> EngineResult<Arc<CsrStore>> {
        Ok(self.stores.resolve(handle.raw())?)
    }

    /// Gather rows of a store into a new registered dense matrix
    ///
    /// Indices are validated before anything is allocated; on failure no
    /// handle is created.
    #[tracing::instrument(skip_all, fields(handle = %handle, rows = indices.len()))]
    pub fn slice<I: RowIndex>(
        &self,
        handle: StoreHandle,
        indices: &[I],
    ) -> EngineResult<SlicedDense> {
        let store = self.store(handle)?;
        let matrix = store.slice_rows(indices)?;
        drop(store);

        let matrix = Arc::new(matrix);
        let raw = self.dense.register_shared(Arc::clone(&matrix))?;
        tracing::debug!(shape = ?matrix.shape(), "slice registered");
        Ok(SlicedDense {
            handle: DenseHandle::from_raw(raw.into_raw()),
            matrix,
        })
    }

    /// Resolve a dense handle
    pub fn dense(&self, handle: DenseHandle) -> EngineResult<Arc<DenseMatrix>> {
        Ok(self.dense.resolve(handle.raw())?)
    }

    /// Release a store; the handle is rejected afterwards
    pub fn free_store(&self, handle: StoreHandle) -> EngineResult<()> {
        self.stores.release(handle.raw()).map_err(EngineError::from)
    }

    /// Release a dense matrix; the handle is rejected afterwards
    pub fn free_dense(&self, handle: DenseHandle) -> EngineResult<()> {
        self.dense.release(handle.raw()).map_err(EngineError::from)
    }

    pub fn live_stores(&self) -> usize {
        self.stores.len()
    }

    pub fn live_dense(&self) -> usize {
        self.dense.len()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            stores: self.stores.stats(),
            dense: self.dense.stats(),
        }
    }

    /// Load a store, released when the returned guard drops
    pub fn open<P: AsRef<Path>>(&self, path: P) -> EngineResult<StoreGuard<'_>> {
        let loaded = self.load(path)?;
        Ok(StoreGuard {
            engine: self,
            loaded,
            armed: true,
        })
    }

    /// Register a store, released when the returned guard drops
    pub fn adopt(&self, store: CsrStore) -> EngineResult<StoreGuard<'_>> {
        let loaded = self.register_store(store)?;
        Ok(StoreGuard {
            engine: self,
            loaded,
            armed: true,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("live_stores", &self.live_stores())
            .field("live_dense", &self.live_dense())
            .finish()
    }
}

/// Scoped store handle
pub struct StoreGuard<'e> {
    engine: &'e Engine,
    loaded: LoadedStore,
    armed: bool,
}

impl<'e> StoreGuard<'e> {
    pub fn handle(&self) -> StoreHandle {
        self.loaded.handle
    }

    pub fn info(&self) -> &LoadedStore {
        &self.loaded
    }

    pub fn shape(&self) -> (usize, usize) {
        self.loaded.shape()
    }

    /// Slice this store; the result is released when its guard drops
    pub fn slice<I: RowIndex>(&self, indices: &[I]) -> EngineResult<DenseGuard<'e>> {
        let sliced = self.engine.slice(self.loaded.handle, indices)?;
        Ok(DenseGuard {
            engine: self.engine,
            sliced,
            armed: true,
        })
    }

    /// Keep the store registered and return its handle
    pub fn into_handle(mut self) -> StoreHandle {
        self.armed = false;
        self.loaded.handle
    }
}

impl Drop for StoreGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.engine.free_store(self.loaded.handle) {
                tracing::warn!(handle = %self.loaded.handle, error = %e, "store guard release failed");
            }
        }
    }
}

/// Scoped dense handle
pub struct DenseGuard<'e> {
    engine: &'e Engine,
    sliced: SlicedDense,
    armed: bool,
}

impl DenseGuard<'_> {
    pub fn handle(&self) -> DenseHandle {
        self.sliced.handle
    }

    pub fn sliced(&self) -> &SlicedDense {
        &self.sliced
    }

    /// Keep the matrix registered and return its handle
    pub fn into_handle(mut self) -> DenseHandle {
        self.armed = false;
        self.sliced.handle
    }
}

impl std::ops::Deref for DenseGuard<'_> {
    type Target = DenseMatrix;

    fn deref(&self) -> &DenseMatrix {
        &self.sliced.matrix
    }
}

impl Drop for DenseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.engine.free_dense(self.sliced.handle) {
                tracing::warn!(handle = %self.sliced.handle, error = %e, "dense guard release failed");
            }
        }
    }
}
