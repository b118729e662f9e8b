//! Opaque handles exchanged with engine clients.

use std::fmt;

/// Index of a variable. Stable across reordering, unlike its level.
pub type VarIndex = u32;

/// Exclusive upper bound on variable indices an engine can represent.
pub const MAX_INDEX: VarIndex = u16::MAX as VarIndex;

/// Opaque 64-bit handle to a diagram vertex.
///
/// The bit layout belongs to the backend that minted the handle; clients may
/// only compare handles, pass them back, or hand them across a binding
/// boundary via [`raw`][NodeId::raw]. The value `0` is the invalid sentinel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The invalid handle.
    pub const INVALID: Self = Self(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}
