//! Per-level unique subtables.
//!
//! Every level of the order owns one subtable keyed by `(low, high)`. All nodes
//! of a subtable carry the same variable, so the variable is not part of the
//! key. Swapping two adjacent levels exchanges their subtables and rewrites
//! only the entries of nodes that change.

use std::collections::HashMap;

use crate::node_id::VarIndex;
use crate::reference::Ref;

#[derive(Debug, Clone)]
pub(crate) struct Subtable {
    /// The variable of every node in this subtable.
    pub variable: VarIndex,
    nodes: HashMap<(Ref, Ref), u32>,
}

impl Subtable {
    pub fn new(variable: VarIndex) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    pub fn find(&self, low: Ref, high: Ref) -> Option<u32> {
        self.nodes.get(&(low, high)).copied()
    }

    pub fn insert(&mut self, low: Ref, high: Ref, index: u32) {
        self.nodes.insert((low, high), index);
    }

    pub fn remove(&mut self, low: Ref, high: Ref) -> Option<u32> {
        self.nodes.remove(&(low, high))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtable_basic() {
        let mut st = Subtable::new(1);

        let low = -Ref::positive(1);
        let high = Ref::positive(1);

        assert!(st.find(low, high).is_none());

        st.insert(low, high, 42);
        assert_eq!(st.find(low, high), Some(42));
        assert_eq!(st.len(), 1);

        assert_eq!(st.remove(low, high), Some(42));
        assert!(st.find(low, high).is_none());
        assert_eq!(st.len(), 0);
    }

    #[test]
    fn test_subtable_multiple_nodes() {
        let mut st = Subtable::new(3);

        st.insert(-Ref::positive(1), Ref::positive(1), 10);
        st.insert(Ref::positive(2), Ref::positive(3), 20);
        st.insert(-Ref::positive(1), Ref::positive(3), 30);

        assert_eq!(st.len(), 3);
        assert_eq!(st.find(Ref::positive(2), Ref::positive(3)), Some(20));
        let mut all: Vec<u32> = st.indices().collect();
        all.sort();
        assert_eq!(all, vec![10, 20, 30]);
    }
}
