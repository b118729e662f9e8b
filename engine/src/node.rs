use crate::reference::Ref;

/// Variable label of the terminal node.
pub(crate) const TERMINAL_VAR: u32 = u32::MAX;
/// Variable label of a slot on the free list.
pub(crate) const FREE_VAR: u32 = u32::MAX - 1;

/// A heap slot.
///
/// `refs` counts parents plus external references. A node whose count drops
/// to zero is *dead*: it keeps its own references on its children until the
/// next garbage collection frees it, and can be revived before that.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Node {
    pub var: u32,
    pub low: Ref,
    pub high: Ref,
    pub refs: u32,
}

impl Node {
    pub const fn new(var: u32, low: Ref, high: Ref) -> Self {
        Self { var, low, high, refs: 0 }
    }

    pub const fn free() -> Self {
        Self::new(FREE_VAR, Ref::positive(0), Ref::positive(0))
    }

    pub const fn is_free(&self) -> bool {
        self.var == FREE_VAR
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::free()
    }
}
