//! Opaque generation-tagged handles
//!
//! A handle packs three fields into one `u64`:
//!
//! ```text
//! | kind: 8 | generation: 24 | slot: 32 |
//! ```
//!
//! `kind` distinguishes store handles from dense handles, `slot` indexes the
//! registry arena and `generation` must match the slot's current generation.
//! Generations start at 1, so the all-zero value is never a live handle.

use std::fmt;

/// Bits reserved for the generation counter
pub const GENERATION_BITS: u32 = 24;

/// Largest generation a slot can carry before it is retired
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

const SLOT_BITS: u32 = 32;
const KIND_SHIFT: u32 = SLOT_BITS + GENERATION_BITS;

/// Object family a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandleKind {
    /// A loaded CSR store
    Store = 1,
    /// A dense matrix produced by a slice
    Dense = 2,
}

impl HandleKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(HandleKind::Store),
            2 => Some(HandleKind::Dense),
            _ => None,
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Store => write!(f, "store"),
            HandleKind::Dense => write!(f, "dense"),
        }
    }
}

/// Untyped handle as it crosses the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(u64);

impl RawHandle {
    /// The null handle; never refers to an object
    pub const NULL: RawHandle = RawHandle(0);

    pub(crate) fn compose(kind: HandleKind, generation: u32, slot: u32) -> Self {
        debug_assert!(generation > 0 && generation <= MAX_GENERATION);
        RawHandle(
            (u64::from(kind as u8) << KIND_SHIFT)
                | (u64::from(generation) << SLOT_BITS)
                | u64::from(slot),
        )
    }

    pub fn from_raw(raw: u64) -> Self {
        RawHandle(raw)
    }

    pub fn into_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Kind tag, or `None` if the tag names no known kind
    pub fn kind(self) -> Option<HandleKind> {
        HandleKind::from_tag((self.0 >> KIND_SHIFT) as u8)
    }

    pub fn generation(self) -> u32 {
        ((self.0 >> SLOT_BITS) as u32) & MAX_GENERATION
    }

    pub fn slot(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(RawHandle);

        impl $name {
            pub const KIND: HandleKind = $kind;

            /// Wrap a raw value; validity is checked on use
            pub fn from_raw(raw: u64) -> Self {
                $name(RawHandle::from_raw(raw))
            }

            pub fn into_raw(self) -> u64 {
                self.0.into_raw()
            }

            pub fn raw(self) -> RawHandle {
                self.0
            }
        }

        impl From<$name> for RawHandle {
            fn from(handle: $name) -> RawHandle {
                handle.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", Self::KIND, self.0)
            }
        }
    };
}

typed_handle!(
    /// Handle to a registered [`CsrStore`](csrslice_sparse::CsrStore)
    StoreHandle,
    HandleKind::Store
);

typed_handle!(
    /// Handle to a registered [`DenseMatrix`](csrslice_sparse::DenseMatrix)
    DenseHandle,
    HandleKind::Dense
);
