use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;

use crate::heap::{Heap, ONE};
use crate::reference::Ref;

impl Heap {
    /// Distinct nodes reachable from `f`, the terminal included.
    pub(crate) fn dag_size_of(&self, f: Ref) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![f];
        while let Some(r) = stack.pop() {
            if !seen.insert(r.index()) || self.is_const(r) {
                continue;
            }
            let node = self.node(r);
            stack.push(node.low);
            stack.push(node.high);
        }
        seen.len()
    }

    /// Satisfying assignments of `f` over `nvars` variables.
    ///
    /// Every node stores the count of its regular function over all `nvars`
    /// variables; a node halves the sum of its children, and a complemented
    /// edge reads `2^nvars - count`.
    pub(crate) fn minterms(&self, f: Ref, nvars: u32) -> BigUint {
        let total = BigUint::from(1u32) << nvars;
        let mut memo = HashMap::new();
        self.minterms_rec(f, &total, &mut memo)
    }

    fn minterms_rec(&self, f: Ref, total: &BigUint, memo: &mut HashMap<u32, BigUint>) -> BigUint {
        let count = if self.is_const(f) {
            total.clone()
        } else if let Some(c) = memo.get(&f.index()) {
            c.clone()
        } else {
            let node = *self.node(f);
            let low = self.minterms_rec(node.low, total, memo);
            let high = self.minterms_rec(node.high, total, memo);
            let c: BigUint = (low + high) >> 1;
            memo.insert(f.index(), c.clone());
            c
        };
        if f.is_negated() {
            total - count
        } else {
            count
        }
    }

    /// Paths from `f` to the `1` terminal.
    pub(crate) fn paths(&self, f: Ref) -> BigUint {
        let mut memo = HashMap::new();
        let (to_one, to_zero) = self.paths_rec(f.regular(), &mut memo);
        if f.is_negated() {
            to_zero
        } else {
            to_one
        }
    }

    /// `(paths to 1, paths to 0)` of the regular node `f`.
    fn paths_rec(&self, f: Ref, memo: &mut HashMap<u32, (BigUint, BigUint)>) -> (BigUint, BigUint) {
        if f == ONE {
            return (BigUint::from(1u32), BigUint::ZERO);
        }
        if let Some(p) = memo.get(&f.index()) {
            return p.clone();
        }
        let node = *self.node(f);
        let mut sum = (BigUint::ZERO, BigUint::ZERO);
        for child in [node.low, node.high] {
            let (one, zero) = self.paths_rec(child.regular(), memo);
            if child.is_negated() {
                sum.0 += zero;
                sum.1 += one;
            } else {
                sum.0 += one;
                sum.1 += zero;
            }
        }
        memo.insert(f.index(), sum.clone());
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ZERO;
    use test_log::test;

    fn setup(n: usize) -> Heap {
        let mut heap = Heap::default();
        for _ in 0..n {
            heap.add_var().unwrap();
        }
        heap
    }

    #[test]
    fn test_dag_size() {
        let mut heap = setup(3);
        let (x, y) = (heap.vars[0], heap.vars[1]);
        assert_eq!(heap.dag_size_of(ONE), 1);
        assert_eq!(heap.dag_size_of(x), 2);

        let f = heap.and_rec(x, y).unwrap();
        assert_eq!(heap.dag_size_of(f), 3);
    }

    #[test]
    fn test_minterms() {
        let mut heap = setup(3);
        let (x, y, z) = (heap.vars[0], heap.vars[1], heap.vars[2]);

        assert_eq!(heap.minterms(ONE, 3), BigUint::from(8u32));
        assert_eq!(heap.minterms(ZERO, 3), BigUint::ZERO);
        assert_eq!(heap.minterms(x, 3), BigUint::from(4u32));

        let f = heap.and_rec(x, y).unwrap();
        heap.inc(f);
        assert_eq!(heap.minterms(f, 3), BigUint::from(2u32));
        assert_eq!(heap.minterms(-f, 3), BigUint::from(6u32));

        let g = heap.or_rec(f, z).unwrap();
        assert_eq!(heap.minterms(g, 3), BigUint::from(5u32));
    }

    #[test]
    fn test_paths() {
        let mut heap = setup(2);
        let (x, y) = (heap.vars[0], heap.vars[1]);

        assert_eq!(heap.paths(ONE), BigUint::from(1u32));
        assert_eq!(heap.paths(ZERO), BigUint::ZERO);

        let f = heap.or_rec(x, y).unwrap();
        heap.inc(f);
        // x=1; x=0,y=1
        assert_eq!(heap.paths(f), BigUint::from(2u32));
        // x=0,y=0
        assert_eq!(heap.paths(-f), BigUint::from(1u32));
    }
}
