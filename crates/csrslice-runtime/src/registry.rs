//! Handle registry: a generation-tagged slot arena behind a read-write lock
//!
//! Lookups take the read lock and may run concurrently; registration and
//! release take the write lock. Objects are held as `Arc<T>`, so a caller that
//! resolved a handle keeps its object alive after a concurrent release. The
//! handle itself stops resolving the moment release returns.

use crate::error::{CapacityError, HandleError};
use crate::handle::{HandleKind, RawHandle, MAX_GENERATION};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for a registry
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Maximum number of live objects (`None` for no limit)
    pub capacity: Option<usize>,
}

/// Statistics for a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Objects currently registered
    pub live: usize,
    /// Highest `live` value observed
    pub peak_live: usize,
    /// Successful registrations
    pub registrations: u64,
    /// Successful releases
    pub releases: u64,
    /// Lookups or releases rejected with a [`HandleError`]
    pub rejected: u64,
    /// Slots permanently retired after exhausting their generations
    pub retired_slots: usize,
}

struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    peak_live: usize,
    registrations: u64,
    releases: u64,
    retired_slots: usize,
}

/// Registry of live objects of one kind
pub struct Registry<T> {
    kind: HandleKind,
    config: RegistryConfig,
    max_generation: u32,
    arena: RwLock<Arena<T>>,
    rejected: AtomicU64,
}

impl<T> Registry<T> {
    pub fn new(kind: HandleKind, config: RegistryConfig) -> Self {
        Self {
            kind,
            config,
            max_generation: MAX_GENERATION,
            arena: RwLock::new(Arena {
                slots: Vec::new(),
                free: Vec::new(),
                live: 0,
                peak_live: 0,
                registrations: 0,
                releases: 0,
                retired_slots: 0,
            }),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Register an object and return its handle
    ///
    /// # Errors
    ///
    /// [`CapacityError`] if the live limit is reached or the arena has no
    /// addressable slot left; the object is dropped.
    pub fn register(&self, value: T) -> Result<RawHandle, CapacityError> {
        self.register_shared(Arc::new(value))
    }

    /// Register an object the caller keeps a reference to
    pub fn register_shared(&self, value: Arc<T>) -> Result<RawHandle, CapacityError> {
        let mut arena = self.arena.write();

        if let Some(limit) = self.config.capacity {
            if arena.live >= limit {
                return Err(CapacityError {
                    kind: self.kind,
                    limit,
                });
            }
        }

        let slot = match arena.free.pop() {
            Some(slot) => slot,
            None => {
                let slot = u32::try_from(arena.slots.len()).map_err(|_| CapacityError {
                    kind: self.kind,
                    limit: arena.live,
                })?;
                arena.slots.push(Slot {
                    generation: 1,
                    value: None,
                });
                slot
            }
        };

        let entry = &mut arena.slots[slot as usize];
        entry.value = Some(value);
        let generation = entry.generation;

        arena.live += 1;
        arena.peak_live = arena.peak_live.max(arena.live);
        arena.registrations += 1;

        let handle = RawHandle::compose(self.kind, generation, slot);
        tracing::debug!(kind = %self.kind, %handle, live = arena.live, "registered");
        Ok(handle)
    }

    /// Look up a live object
    pub fn resolve(&self, handle: RawHandle) -> Result<Arc<T>, HandleError> {
        let slot = self.check(handle)?;
        let arena = self.arena.read();
        match arena.slots.get(slot) {
            Some(entry) if entry.generation == handle.generation() => match &entry.value {
                Some(value) => Ok(Arc::clone(value)),
                None => Err(self.reject(HandleError::Stale {
                    handle,
                    expected: self.kind,
                })),
            },
            Some(entry) if handle.generation() < entry.generation => {
                Err(self.reject(HandleError::Stale {
                    handle,
                    expected: self.kind,
                }))
            }
            _ => Err(self.reject(HandleError::Unknown {
                handle,
                expected: self.kind,
            })),
        }
    }

    /// Release a live object; its handle never resolves again
    ///
    /// The registry's reference is dropped after the write lock is released.
    pub fn release(&self, handle: RawHandle) -> Result<(), HandleError> {
        let slot = self.check(handle)?;
        let released = {
            let mut arena = self.arena.write();
            let max_generation = self.max_generation;

            let Some(entry) = arena.slots.get_mut(slot) else {
                return Err(self.reject(HandleError::Unknown {
                    handle,
                    expected: self.kind,
                }));
            };
            if entry.generation != handle.generation() || entry.value.is_none() {
                let stale = handle.generation() <= entry.generation;
                return Err(self.reject(if stale {
                    HandleError::Stale {
                        handle,
                        expected: self.kind,
                    }
                } else {
                    HandleError::Unknown {
                        handle,
                        expected: self.kind,
                    }
                }));
            }

            let released = entry.value.take();
            let retired = entry.generation >= max_generation;
            if !retired {
                entry.generation += 1;
            }

            if retired {
                arena.retired_slots += 1;
                tracing::debug!(kind = %self.kind, slot, "slot retired");
            } else {
                arena.free.push(handle.slot());
            }
            arena.live -= 1;
            arena.releases += 1;
            tracing::debug!(kind = %self.kind, %handle, live = arena.live, "released");
            released
        };
        drop(released);
        Ok(())
    }

    /// Whether `handle` currently names a live object
    pub fn contains(&self, handle: RawHandle) -> bool {
        let Ok(slot) = self.check_kind(handle) else {
            return false;
        };
        let arena = self.arena.read();
        arena
            .slots
            .get(slot)
            .is_some_and(|e| e.generation == handle.generation() && e.value.is_some())
    }

    pub fn len(&self) -> usize {
        self.arena.read().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        let arena = self.arena.read();
        RegistryStats {
            live: arena.live,
            peak_live: arena.peak_live,
            registrations: arena.registrations,
            releases: arena.releases,
            rejected: self.rejected.load(Ordering::Relaxed),
            retired_slots: arena.retired_slots,
        }
    }

    /// Null and kind checks, counting rejections
    fn check(&self, handle: RawHandle) -> Result<usize, HandleError> {
        self.check_kind(handle).map_err(|e| self.reject(e))
    }

    fn check_kind(&self, handle: RawHandle) -> Result<usize, HandleError> {
        if handle.is_null() {
            return Err(HandleError::Null {
                expected: self.kind,
            });
        }
        match handle.kind() {
            Some(kind) if kind == self.kind => {}
            Some(found) => {
                return Err(HandleError::WrongKind {
                    handle,
                    expected: self.kind,
                    found,
                })
            }
            None => {
                return Err(HandleError::Unknown {
                    handle,
                    expected: self.kind,
                })
            }
        }
        if handle.generation() == 0 {
            return Err(HandleError::Unknown {
                handle,
                expected: self.kind,
            });
        }
        Ok(handle.slot() as usize)
    }

    fn reject(&self, err: HandleError) -> HandleError {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn registry() -> Registry<String> {
        Registry::new(HandleKind::Store, RegistryConfig::default())
    }

    #[test]
    fn test_register_and_resolve() {
        let reg = registry();
        let h = reg.register("a".to_string()).unwrap();
        assert_eq!(h.kind(), Some(HandleKind::Store));
        assert_eq!(h.generation(), 1);
        assert_eq!(*reg.resolve(h).unwrap(), "a");
        assert!(reg.contains(h));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_release_then_resolve_is_stale() {
        let reg = registry();
        let h = reg.register("a".to_string()).unwrap();
        reg.release(h).unwrap();

        assert!(matches!(reg.resolve(h), Err(HandleError::Stale { .. })));
        assert!(matches!(reg.release(h), Err(HandleError::Stale { .. })));
        assert!(!reg.contains(h));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let reg = registry();
        let first = reg.register("a".to_string()).unwrap();
        reg.release(first).unwrap();
        let second = reg.register("b".to_string()).unwrap();

        assert_eq!(first.slot(), second.slot());
        assert_ne!(first, second);
        assert!(reg.resolve(first).is_err());
        assert_eq!(*reg.resolve(second).unwrap(), "b");
    }

    #[test]
    fn test_null_wrong_kind_and_forged() {
        let reg = registry();
        assert!(matches!(
            reg.resolve(RawHandle::NULL),
            Err(HandleError::Null { .. })
        ));

        let dense = RawHandle::compose(HandleKind::Dense, 1, 0);
        assert!(matches!(
            reg.resolve(dense),
            Err(HandleError::WrongKind { .. })
        ));

        let forged = RawHandle::compose(HandleKind::Store, 1, 99);
        assert!(matches!(
            reg.resolve(forged),
            Err(HandleError::Unknown { .. })
        ));

        let h = reg.register("a".to_string()).unwrap();
        let future = RawHandle::compose(HandleKind::Store, h.generation() + 5, h.slot());
        assert!(matches!(
            reg.release(future),
            Err(HandleError::Unknown { .. })
        ));
        assert!(reg.contains(h));
        assert_eq!(reg.stats().rejected, 4);
    }

    #[test]
    fn test_capacity_limit() {
        let reg: Registry<u32> = Registry::new(
            HandleKind::Dense,
            RegistryConfig { capacity: Some(2) },
        );
        let a = reg.register(1).unwrap();
        reg.register(2).unwrap();
        let err = reg.register(3).unwrap_err();
        assert_eq!(err.limit, 2);

        reg.release(a).unwrap();
        assert!(reg.register(4).is_ok());
    }

    #[test]
    fn test_exhausted_generation_retires_slot() {
        let mut reg = registry();
        reg.max_generation = 2;

        let h1 = reg.register("a".to_string()).unwrap();
        reg.release(h1).unwrap();
        let h2 = reg.register("b".to_string()).unwrap();
        assert_eq!(h2.slot(), h1.slot());
        assert_eq!(h2.generation(), 2);
        reg.release(h2).unwrap();

        // Slot 0 is retired; the next object gets a fresh slot
        let h3 = reg.register("c".to_string()).unwrap();
        assert_ne!(h3.slot(), h1.slot());
        assert!(matches!(reg.resolve(h2), Err(HandleError::Stale { .. })));
        assert_eq!(reg.stats().retired_slots, 1);
    }

    #[test]
    fn test_release_drops_object() {
        struct Counted(Arc<AtomicUsize>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let reg = Registry::new(HandleKind::Dense, RegistryConfig::default());
        let h = reg.register(Counted(Arc::clone(&drops))).unwrap();

        let held = reg.resolve(h).unwrap();
        reg.release(h).unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(held);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stats() {
        let reg = registry();
        let a = reg.register("a".to_string()).unwrap();
        let _b = reg.register("b".to_string()).unwrap();
        reg.release(a).unwrap();

        let stats = reg.stats();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.peak_live, 2);
        assert_eq!(stats.registrations, 2);
        assert_eq!(stats.releases, 1);
    }
}
