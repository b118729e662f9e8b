use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::node_id::NodeId;

/// An edge into the heap, potentially complemented.
///
/// Uses a 32-bit representation where the least significant bit is the
/// complement tag and the remaining bits store the node index.
/// Index 0 is never allocated, so the raw values 0 and 1 never denote a node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(transparent)]
pub(crate) struct Ref(u32);

impl Ref {
    /// Largest node index that still fits next to the tag bit.
    pub const MAX_INDEX: u32 = 0x7FFF_FFFF;

    pub const fn new(index: u32, negated: bool) -> Self {
        Self((index << 1) | (negated as u32))
    }

    pub const fn positive(index: u32) -> Self {
        Self::new(index, false)
    }

    /// Index of the node this edge points to.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 >> 1
    }

    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.0 & 1) != 0
    }

    /// The same edge with the complement tag cleared.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Complement the edge when `cond` holds.
    #[inline]
    pub fn negate_if(self, cond: bool) -> Self {
        if cond {
            -self
        } else {
            self
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl From<Ref> for NodeId {
    fn from(r: Ref) -> Self {
        NodeId::from_raw(r.0 as u64)
    }
}

impl From<NodeId> for Ref {
    fn from(id: NodeId) -> Self {
        // Handles are only ever minted from `Ref`, so the value fits.
        Self(id.raw() as u32)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_negated() {
            write!(f, "~@{}", self.index())
        } else {
            write!(f, "@{}", self.index())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_negation() {
        let pos = Ref::positive(5);
        let neg = -pos;

        assert!(!pos.is_negated());
        assert!(neg.is_negated());
        assert_eq!(pos.index(), neg.index());
        assert_eq!(-neg, pos);
        assert_eq!(neg.regular(), pos);
    }

    #[test]
    fn test_ref_raw() {
        let pos = Ref::positive(100);
        assert_eq!(pos.raw(), 200);
        assert_eq!((-pos).raw(), 201);
    }

    #[test]
    fn test_ref_node_id_conversion() {
        let r = -Ref::positive(42);
        let id = NodeId::from(r);
        assert!(id.is_valid());
        assert_eq!(Ref::from(id), r);
    }

    #[test]
    fn test_ref_display() {
        assert_eq!(format!("{}", Ref::positive(42)), "@42");
        assert_eq!(format!("{}", -Ref::positive(42)), "~@42");
    }

    #[test]
    fn test_negate_if() {
        let r = Ref::positive(7);
        assert_eq!(r.negate_if(false), r);
        assert_eq!(r.negate_if(true), -r);
    }
}
