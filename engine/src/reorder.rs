//! Dynamic variable reordering.
//!
//! Every method is built from one primitive, the in-place swap of two adjacent
//! levels. A swap rewrites only the nodes of the upper level that depend on the
//! lower one, and keeps their storage slots, so every handle keeps denoting
//! the same function across a reordering.
//!
//! # Methods
//!
//! - **Sifting** (Rudell): move each variable through all positions and leave
//!   it where the heap was smallest. Variables are sifted in decreasing order
//!   of their level width.
//! - **Window permutation**: try every permutation of 2 or 3 adjacent levels
//!   and keep the smallest.
//! - **Random**: exchange random pairs of levels, keeping improvements.
//!
//! The converging variants repeat their base method while it still shrinks
//! the heap.
//!
//! # Blocks
//!
//! A [`VarBlock`] groups variables that must stay on adjacent levels. Sifting
//! moves every outermost block as one unit and then sifts the variables inside
//! non-fixed blocks within their block. A fixed block, or a block holding one,
//! never leaves its levels. Window and random passes skip every swap that
//! would break a block.
//!
//! # References
//!
//! - R. Rudell. "Dynamic variable ordering for ordered binary decision diagrams."
//!   ICCAD 1993. DOI: 10.1109/ICCAD.1993.580054
//! - S. Panda, F. Somenzi. "Who are the variables in your neighborhood."
//!   ICCAD 1995.

use log::debug;
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::heap::Heap;
use crate::node::Node;
use crate::node_id::VarIndex;
use crate::reference::Ref;
use crate::types::ReorderingType;

/// Sifting abandons a direction once the heap grows past this factor of the best size.
const MAX_GROWTH: f64 = 1.2;

/// Variables kept on adjacent levels by reordering.
#[derive(Debug, Clone)]
pub(crate) struct VarBlock {
    members: Vec<bool>,
    len: usize,
    fixed: bool,
}

impl VarBlock {
    fn contains(&self, var: VarIndex) -> bool {
        self.members.get(var as usize).copied().unwrap_or(false)
    }

    /// Whether every member of `self` belongs to `other`.
    fn within(&self, other: &VarBlock) -> bool {
        self.members
            .iter()
            .enumerate()
            .all(|(v, &m)| !m || other.contains(v as VarIndex))
    }

    fn overlaps(&self, other: &VarBlock) -> bool {
        self.members
            .iter()
            .enumerate()
            .any(|(v, &m)| m && other.contains(v as VarIndex))
    }
}

/// Consecutive levels that sifting moves as a whole.
#[derive(Debug, Clone, Copy)]
struct Unit {
    key: usize,
    len: usize,
    movable: bool,
}

impl Heap {
    /// Run one reordering pass with `method`.
    pub(crate) fn reorder(&mut self, method: ReorderingType) -> Result<()> {
        let method = match method {
            ReorderingType::Same => self.autodyn.unwrap_or(ReorderingType::Sift),
            m => m,
        };
        if method == ReorderingType::None || self.subtables.len() < 2 {
            return Ok(());
        }

        self.collect_garbage();
        let initial = self.live();
        debug!("reordering with {}: {} live nodes", method, initial);

        self.reordering = true;
        let result = match method {
            ReorderingType::Same | ReorderingType::None => Ok(()),
            ReorderingType::Random => self.random_exchanges(false),
            ReorderingType::RandomPivot => self.random_exchanges(true),
            ReorderingType::Sift => self.sift_all(),
            ReorderingType::SiftConverge => self.converge(Self::sift_all),
            ReorderingType::Window2 => self.window2().map(|_| ()),
            ReorderingType::Window3 => self.window3().map(|_| ()),
            ReorderingType::Window2Conv => self.converge(|h| h.window2().map(|_| ())),
            ReorderingType::Window3Conv => self.converge(|h| h.window3().map(|_| ())),
        };
        self.reordering = false;

        self.collect_garbage();
        self.reorder_count += 1;
        debug!(
            "reordering #{} done: {} -> {} live nodes",
            self.reorder_count,
            initial,
            self.live()
        );
        result
    }

    /// Repeat `pass` while it shrinks the heap.
    fn converge<F>(&mut self, mut pass: F) -> Result<()>
    where
        F: FnMut(&mut Self) -> Result<()>,
    {
        loop {
            let before = self.live();
            pass(self)?;
            if self.live() >= before {
                return Ok(());
            }
        }
    }

    /// Exchange the variables at `level` and `level + 1` in place.
    pub(crate) fn swap_levels(&mut self, level: usize) -> Result<()> {
        // Node creation must not collect or reorder while a level is half rewritten.
        let outer = std::mem::replace(&mut self.reordering, true);
        let result = self.swap_in_place(level);
        self.reordering = outer;
        result
    }

    fn swap_in_place(&mut self, level: usize) -> Result<()> {
        if self.dead > 0 {
            self.collect_garbage();
        }

        let upper = level;
        let lower = level + 1;
        let x = self.subtables[upper].variable;
        let y = self.subtables[lower].variable;

        // x-nodes now sit one level down; y-nodes move up unchanged.
        self.subtables.swap(upper, lower);
        self.perm[x as usize] = lower as u32;
        self.perm[y as usize] = upper as u32;

        let x_nodes: Vec<u32> = self.subtables[lower].indices().collect();
        for idx in x_nodes {
            let node = self.nodes[idx as usize];
            let (f0, f1) = (node.low, node.high);
            let depends = |r: Ref| !self.is_const(r) && self.node(r).var == y;
            let (dep0, dep1) = (depends(f0), depends(f1));
            if !dep0 && !dep1 {
                continue;
            }

            self.subtables[lower].remove(f0, f1);

            // High edges are regular, so only the low edge may carry a tag.
            let (f10, f11) = if dep1 {
                let n = self.node(f1);
                (n.low, n.high)
            } else {
                (f1, f1)
            };
            let (f00, f01) = if dep0 {
                let n = self.node(f0);
                let neg = f0.is_negated();
                (n.low.negate_if(neg), n.high.negate_if(neg))
            } else {
                (f0, f0)
            };

            let new_high = self.mk(x, f01, f11)?;
            self.inc(new_high);
            let new_low = self.mk(x, f00, f10)?;
            self.inc(new_low);
            self.dec(f1);
            self.dec(f0);

            debug_assert!(!new_high.is_negated());
            self.nodes[idx as usize] = Node {
                var: y,
                low: new_low,
                high: new_high,
                refs: node.refs,
            };
            self.subtables[upper].insert(new_low, new_high, idx);
        }

        self.cache.clear();
        Ok(())
    }

    // ---- blocks ----

    /// Group the variables on levels `perm(first)..=perm(last)`.
    pub(crate) fn add_block(&mut self, first: VarIndex, last: VarIndex, fixed: bool) -> Result<()> {
        self.check_var(first)?;
        self.check_var(last)?;
        let (top, bottom) = (self.perm[first as usize] as usize, self.perm[last as usize] as usize);
        if top > bottom {
            return Err(EngineError::InvalidArgument(format!(
                "bad indexes in variable block: {} is below {}",
                first, last
            )));
        }
        let mut members = vec![false; self.vars.len()];
        for level in top..=bottom {
            members[self.subtables[level].variable as usize] = true;
        }
        let block = VarBlock {
            members,
            len: bottom - top + 1,
            fixed,
        };
        if let Some(other) = self
            .blocks
            .iter()
            .find(|b| block.overlaps(b) && !block.within(b) && !b.within(&block))
        {
            return Err(EngineError::InvalidArgument(format!(
                "variable block {}..={} partially overlaps a block of {} variables",
                first, last, other.len
            )));
        }
        debug!(
            "variable block {}..={} on levels {}..={}{}",
            first,
            last,
            top,
            bottom,
            if fixed { ", fixed" } else { "" }
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Whether variables `x` and `y` may pass each other without breaking a block.
    fn may_pass(&self, x: VarIndex, y: VarIndex) -> bool {
        self.blocks.iter().all(|b| match (b.contains(x), b.contains(y)) {
            (true, true) => !b.fixed,
            (false, false) => true,
            _ => false,
        })
    }

    fn swap_allowed(&self, level: usize) -> bool {
        self.may_pass(self.subtables[level].variable, self.subtables[level + 1].variable)
    }

    /// Whether [`Heap::exchange_levels`] on `a < b` keeps every block intact.
    fn exchange_allowed(&self, a: usize, b: usize) -> bool {
        let (x, y) = (self.subtables[a].variable, self.subtables[b].variable);
        (a + 1..=b).all(|l| self.may_pass(x, self.subtables[l].variable))
            && (a..b).all(|l| self.may_pass(y, self.subtables[l].variable))
    }

    /// Outermost block containing `var`.
    fn outermost_block(&self, var: VarIndex) -> Option<&VarBlock> {
        self.blocks.iter().filter(|b| b.contains(var)).max_by_key(|b| b.len)
    }

    /// Split the order into sifting units, top to bottom.
    fn units(&self) -> Vec<Unit> {
        let mut units = Vec::new();
        let mut level = 0;
        while level < self.subtables.len() {
            let var = self.subtables[level].variable;
            let (len, movable) = match self.outermost_block(var) {
                Some(outer) => (outer.len, !self.blocks.iter().any(|b| b.fixed && b.within(outer))),
                None => (1, true),
            };
            units.push(Unit {
                key: units.len(),
                len,
                movable,
            });
            level += len;
        }
        units
    }

    /// Exchange units `i` and `i + 1`, keeping the order inside each.
    fn exchange_units(&mut self, units: &mut [Unit], i: usize) -> Result<()> {
        let top: usize = units[..i].iter().map(|u| u.len).sum();
        let (upper, lower) = (units[i].len, units[i + 1].len);
        // Raise the lower unit's variables past the upper unit, top first.
        for j in 0..lower {
            self.move_level(top + upper + j, top + j)?;
        }
        units.swap(i, i + 1);
        Ok(())
    }

    /// Move the variable at level `from` to level `to` by adjacent swaps.
    fn move_level(&mut self, from: usize, to: usize) -> Result<()> {
        let mut at = from;
        while at < to {
            self.swap_levels(at)?;
            at += 1;
        }
        while at > to {
            self.swap_levels(at - 1)?;
            at -= 1;
        }
        Ok(())
    }

    /// Exchange the variables at levels `a` and `b`, leaving the rest in place.
    fn exchange_levels(&mut self, a: usize, b: usize) -> Result<()> {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        if a == b {
            return Ok(());
        }
        self.move_level(a, b)?;
        self.move_level(b - 1, a)
    }

    // ---- sifting ----

    fn sift_all(&mut self) -> Result<()> {
        let mut units = self.units();
        let mut order: Vec<(usize, usize)> = Vec::new();
        let mut level = 0;
        for unit in &units {
            let width: usize = (level..level + unit.len).map(|l| self.subtables[l].len()).sum();
            if unit.movable {
                order.push((unit.key, width));
            }
            level += unit.len;
        }
        order.sort_by_key(|&(_, width)| std::cmp::Reverse(width));
        for (key, _) in order {
            self.sift_unit(&mut units, key)?;
        }

        if self.blocks.is_empty() {
            return Ok(());
        }
        // Then each block member inside its block.
        let mut members: Vec<VarIndex> = self
            .subtables
            .iter()
            .map(|s| s.variable)
            .filter(|&v| self.blocks.iter().any(|b| b.contains(v)))
            .collect();
        members.sort_by_key(|&v| std::cmp::Reverse(self.subtables[self.perm[v as usize] as usize].len()));
        for var in members {
            self.sift_variable(var)?;
        }
        Ok(())
    }

    /// Sift the unit `key` through the movable units around it.
    fn sift_unit(&mut self, units: &mut [Unit], key: usize) -> Result<()> {
        let Some(start) = units.iter().position(|u| u.key == key) else {
            return Ok(());
        };
        let mut pos = start;
        let mut best_pos = start;
        let mut best_size = self.live();
        let limit = |best: usize| (best as f64 * MAX_GROWTH) as usize;

        // Up to the top...
        while pos > 0 && units[pos - 1].movable {
            self.exchange_units(units, pos - 1)?;
            pos -= 1;
            let size = self.live();
            if size < best_size {
                best_size = size;
                best_pos = pos;
            } else if size > limit(best_size) {
                break;
            }
        }
        // ...then down to the bottom...
        while pos < start {
            self.exchange_units(units, pos)?;
            pos += 1;
        }
        while pos + 1 < units.len() && units[pos + 1].movable {
            self.exchange_units(units, pos)?;
            pos += 1;
            let size = self.live();
            if size < best_size {
                best_size = size;
                best_pos = pos;
            } else if size > limit(best_size) {
                break;
            }
        }
        // ...and back to the best position.
        while pos > best_pos {
            self.exchange_units(units, pos - 1)?;
            pos -= 1;
        }
        while pos < best_pos {
            self.exchange_units(units, pos)?;
            pos += 1;
        }

        debug!("sift: unit {} position {} -> {}, size {}", key, start, best_pos, best_size);
        Ok(())
    }

    /// Sift one variable as far as the blocks let it move.
    fn sift_variable(&mut self, var: VarIndex) -> Result<()> {
        let num_levels = self.subtables.len();
        let start = self.perm[var as usize] as usize;
        let mut level = start;
        let mut best_level = start;
        let mut best_size = self.live();
        let limit = |best: usize| (best as f64 * MAX_GROWTH) as usize;

        while level > 0 && self.swap_allowed(level - 1) {
            self.swap_levels(level - 1)?;
            level -= 1;
            let size = self.live();
            if size < best_size {
                best_size = size;
                best_level = level;
            } else if size > limit(best_size) {
                break;
            }
        }
        self.move_level(level, start)?;
        level = start;
        while level + 1 < num_levels && self.swap_allowed(level) {
            self.swap_levels(level)?;
            level += 1;
            let size = self.live();
            if size < best_size {
                best_size = size;
                best_level = level;
            } else if size > limit(best_size) {
                break;
            }
        }
        self.move_level(level, best_level)?;

        debug!("sift: var {} level {} -> {}, size {}", var, start, best_level, best_size);
        Ok(())
    }

    // ---- window permutation ----

    fn window2(&mut self) -> Result<bool> {
        let mut improved = false;
        for level in 0..self.subtables.len().saturating_sub(1) {
            if !self.swap_allowed(level) {
                continue;
            }
            let before = self.live();
            self.swap_levels(level)?;
            if self.live() < before {
                improved = true;
            } else {
                self.swap_levels(level)?;
            }
        }
        Ok(improved)
    }

    fn window3(&mut self) -> Result<bool> {
        if self.subtables.len() < 3 {
            return self.window2();
        }
        let mut improved = false;
        for level in 0..self.subtables.len() - 2 {
            let (a, b, c) = (
                self.subtables[level].variable,
                self.subtables[level + 1].variable,
                self.subtables[level + 2].variable,
            );
            if !(self.may_pass(a, b) && self.may_pass(b, c) && self.may_pass(a, c)) {
                continue;
            }
            // abc -> bac -> bca -> cba -> cab -> acb visits all six orders.
            let swaps = [level, level + 1, level, level + 1, level];
            let mut best_size = self.live();
            let mut best = 0;
            for (i, &at) in swaps.iter().enumerate() {
                self.swap_levels(at)?;
                let size = self.live();
                if size < best_size {
                    best_size = size;
                    best = i + 1;
                }
            }
            // acb -> abc, then replay the prefix leading to the best order.
            self.swap_levels(level + 1)?;
            for &at in &swaps[..best] {
                self.swap_levels(at)?;
            }
            improved |= best != 0;
        }
        Ok(improved)
    }

    // ---- random ----

    fn random_exchanges(&mut self, pivot: bool) -> Result<()> {
        let n = self.subtables.len();
        for _ in 0..n {
            let a = if pivot {
                (0..n).max_by_key(|&l| self.subtables[l].len()).unwrap_or(0)
            } else {
                self.rng.gen_range(0..n)
            };
            let b = self.rng.gen_range(0..n);
            if a == b || !self.exchange_allowed(a.min(b), a.max(b)) {
                continue;
            }
            let before = self.live();
            self.exchange_levels(a, b)?;
            if self.live() > before {
                self.exchange_levels(a, b)?;
            }
        }
        Ok(())
    }

    // ---- explicit order ----

    /// Adopt `order`, where `order[level]` is the variable at `level`.
    pub(crate) fn shuffle(&mut self, order: &[VarIndex]) -> Result<()> {
        let n = self.subtables.len();
        if order.len() != n {
            return Err(EngineError::InvalidArgument(format!(
                "order has {} entries, expected {}",
                order.len(),
                n
            )));
        }
        let mut seen = vec![false; n];
        for &v in order {
            match seen.get_mut(v as usize) {
                Some(s) if !*s => *s = true,
                _ => {
                    return Err(EngineError::InvalidArgument(format!(
                        "order is not a permutation (variable {})",
                        v
                    )))
                }
            }
        }
        let mut target = vec![0usize; n];
        for (level, &v) in order.iter().enumerate() {
            target[v as usize] = level;
        }
        for block in &self.blocks {
            let members: Vec<usize> = (0..n).filter(|&v| block.contains(v as VarIndex)).collect();
            let top = members.iter().map(|&v| target[v]).min().unwrap_or(0);
            let bottom = members.iter().map(|&v| target[v]).max().unwrap_or(0);
            let adjacent = members.is_empty() || bottom - top + 1 == members.len();
            let kept = !block.fixed || members.iter().all(|&v| target[v] == self.perm[v] as usize);
            if !adjacent || !kept {
                return Err(EngineError::InvalidArgument(
                    "order breaks a variable block".to_string(),
                ));
            }
        }

        self.collect_garbage();
        self.reordering = true;
        let mut result = Ok(());
        for (target, &var) in order.iter().enumerate() {
            let at = self.perm[var as usize] as usize;
            if let Err(e) = self.move_level(at, target) {
                result = Err(e);
                break;
            }
        }
        self.reordering = false;
        self.collect_garbage();
        self.reorder_count += 1;
        debug!("shuffle: adopted order {:?}", order);
        result
    }
}
