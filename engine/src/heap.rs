//! The complement-edge node heap.
//!
//! # Layout
//!
//! ```text
//! nodes[0]          unused, so that a raw handle of 0 is never a node
//! nodes[1]          the terminal; ONE = @1, ZERO = ~@1
//! nodes[2..]        internal nodes and free slots
//! subtables[level]  unique table of the variable at `level`
//! perm[var]         level of `var`
//! ```
//!
//! Canonical form: the high edge of a stored node is never complemented.
//!
//! # References
//!
//! A node's count is the number of its parents plus external references.
//! Decrementing to zero makes it dead without touching its children; garbage
//! collection frees dead nodes and cascades into children that die as a
//! result. A dead node found in the unique table or the computed table is
//! simply revived by the next increment.

use std::fmt::{Debug, Formatter};

use log::{debug, warn};
use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cache::{Cache, OpKey};
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::node::{Node, TERMINAL_VAR};
use crate::node_id::{NodeId, VarIndex, MAX_INDEX};
use crate::reference::Ref;
use crate::reorder::VarBlock;
use crate::subtable::Subtable;
use crate::types::ReorderingType;

pub(crate) const ONE: Ref = Ref::positive(1);
pub(crate) const ZERO: Ref = Ref::new(1, true);

/// Level reported for the terminal: below every variable.
pub(crate) const TERMINAL_LEVEL: u32 = u32::MAX;

/// Construction hints for a [`Heap`].
#[derive(Debug, Clone)]
pub struct HeapConfig {
    /// Initial node capacity.
    pub unique_slots: usize,
    /// Computed-table slots, rounded up to a power of two.
    pub cache_slots: usize,
    /// Hard cap on allocated internal nodes.
    pub max_nodes: Option<usize>,
    /// Dead nodes tolerated before a garbage collection; defaults to `unique_slots`.
    pub gc_threshold: Option<usize>,
    /// Live nodes that trigger the first automatic reordering.
    pub reorder_threshold: usize,
    /// Seed for the randomized reordering methods.
    pub seed: u64,
}

impl HeapConfig {
    pub const MAX_SLOTS: usize = 1 << 28;

    pub fn validate(&self) -> Result<()> {
        if self.unique_slots == 0 || self.unique_slots > Self::MAX_SLOTS {
            return Err(EngineError::InvalidConfig(format!(
                "unique_slots must be in 1..={}, got {}",
                Self::MAX_SLOTS,
                self.unique_slots
            )));
        }
        if self.cache_slots == 0 || self.cache_slots > Self::MAX_SLOTS {
            return Err(EngineError::InvalidConfig(format!(
                "cache_slots must be in 1..={}, got {}",
                Self::MAX_SLOTS,
                self.cache_slots
            )));
        }
        if self.max_nodes == Some(0) {
            return Err(EngineError::InvalidConfig("max_nodes must be positive".to_string()));
        }
        if self.gc_threshold == Some(0) {
            return Err(EngineError::InvalidConfig("gc_threshold must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            unique_slots: 1 << 14,
            cache_slots: 1 << 16,
            max_nodes: None,
            gc_threshold: None,
            reorder_threshold: 4004,
            seed: 42,
        }
    }
}

pub struct Heap {
    pub(crate) nodes: Vec<Node>,
    pub(crate) free: Vec<u32>,
    pub(crate) subtables: Vec<Subtable>,
    pub(crate) perm: Vec<u32>,
    /// Permanently referenced literal of every variable.
    pub(crate) vars: Vec<Ref>,
    pub(crate) cache: Cache<OpKey, Ref>,

    /// Allocated internal nodes, dead ones included.
    pub(crate) keys: usize,
    pub(crate) dead: usize,
    pub(crate) peak: usize,
    max_nodes: Option<usize>,
    gc_threshold: usize,
    pub(crate) gc_count: usize,

    pub(crate) autodyn: Option<ReorderingType>,
    pub(crate) next_reorder: usize,
    pub(crate) reordering: bool,
    pub(crate) reordered: bool,
    pub(crate) reorder_count: usize,
    pub(crate) rng: ChaCha8Rng,
    /// Variable groups that reordering keeps on adjacent levels.
    pub(crate) blocks: Vec<VarBlock>,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HeapConfig) -> Self {
        let cache_bits = config.cache_slots.next_power_of_two().trailing_zeros();

        let mut nodes = Vec::with_capacity(config.unique_slots + 2);
        nodes.push(Node::free());
        nodes.push(Node::new(TERMINAL_VAR, ONE, ONE));

        debug!(
            "heap: {} unique slots, {} cache slots, limit {:?}",
            config.unique_slots,
            1usize << cache_bits,
            config.max_nodes
        );

        Self {
            nodes,
            free: Vec::new(),
            subtables: Vec::new(),
            perm: Vec::new(),
            vars: Vec::new(),
            cache: Cache::new(cache_bits),
            keys: 0,
            dead: 0,
            peak: 0,
            max_nodes: config.max_nodes,
            gc_threshold: config.gc_threshold.unwrap_or(config.unique_slots),
            gc_count: 0,
            autodyn: None,
            next_reorder: config.reorder_threshold.max(1),
            reordering: false,
            reordered: false,
            reorder_count: 0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            blocks: Vec::new(),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::build(HeapConfig::default())
    }
}

impl Debug for Heap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("vars", &self.vars.len())
            .field("keys", &self.keys)
            .field("dead", &self.dead)
            .field("peak", &self.peak)
            .field("cache_slots", &self.cache.capacity())
            .field("cache_hits", &self.cache.hits())
            .field("cache_misses", &self.cache.misses())
            .field("autodyn", &self.autodyn)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

// Accessors.
impl Heap {
    #[inline]
    pub(crate) fn node(&self, r: Ref) -> &Node {
        &self.nodes[r.index() as usize]
    }

    #[inline]
    pub(crate) fn is_const(&self, r: Ref) -> bool {
        r.index() == 1
    }

    #[inline]
    pub(crate) fn level(&self, r: Ref) -> u32 {
        if self.is_const(r) {
            TERMINAL_LEVEL
        } else {
            self.perm[self.node(r).var as usize]
        }
    }

    /// Cofactors `(low, high)` of `r` with respect to the variable at `level`.
    #[inline]
    pub(crate) fn cofactors(&self, r: Ref, level: u32) -> (Ref, Ref) {
        if self.level(r) == level {
            let node = self.node(r);
            let neg = r.is_negated();
            (node.low.negate_if(neg), node.high.negate_if(neg))
        } else {
            (r, r)
        }
    }

    /// Allocated internal nodes that are not dead.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.keys - self.dead
    }

    /// Validate a client handle.
    pub(crate) fn check(&self, id: NodeId) -> Result<Ref> {
        if !id.is_valid() || id.raw() > u32::MAX as u64 {
            return Err(EngineError::InvalidArgument(format!("bad node handle {}", id)));
        }
        let r = Ref::from(id);
        match self.nodes.get(r.index() as usize) {
            Some(node) if !node.is_free() => Ok(r),
            _ => Err(EngineError::InvalidArgument(format!("stale node handle {}", id))),
        }
    }

    pub(crate) fn check_var(&self, var: VarIndex) -> Result<()> {
        if (var as usize) < self.vars.len() {
            Ok(())
        } else {
            Err(EngineError::InvalidArgument(format!(
                "variable {} out of range (have {})",
                var,
                self.vars.len()
            )))
        }
    }
}

// Reference counting.
impl Heap {
    pub(crate) fn inc(&mut self, r: Ref) {
        if self.is_const(r) {
            return;
        }
        let node = &mut self.nodes[r.index() as usize];
        debug_assert!(!node.is_free(), "reference to freed node {}", r);
        if node.refs == u32::MAX {
            return;
        }
        node.refs += 1;
        if node.refs == 1 {
            self.dead -= 1;
        }
    }

    pub(crate) fn dec(&mut self, r: Ref) {
        if self.is_const(r) {
            return;
        }
        let node = &mut self.nodes[r.index() as usize];
        debug_assert!(!node.is_free(), "dereference of freed node {}", r);
        match node.refs {
            0 => warn!("dereference of dead node {}", r),
            // Saturated counts stick.
            u32::MAX => {}
            _ => {
                node.refs -= 1;
                if node.refs == 0 {
                    self.dead += 1;
                }
            }
        }
    }

    /// Free every dead node, cascading into children that die as a result.
    pub(crate) fn collect_garbage(&mut self) {
        let before = self.keys;
        let mut stack: Vec<u32> = (2..self.nodes.len() as u32)
            .filter(|&i| {
                let node = &self.nodes[i as usize];
                !node.is_free() && node.refs == 0
            })
            .collect();

        while let Some(i) = stack.pop() {
            let node = self.nodes[i as usize];
            if node.is_free() || node.refs != 0 {
                continue;
            }
            let level = self.perm[node.var as usize] as usize;
            self.subtables[level].remove(node.low, node.high);
            self.nodes[i as usize] = Node::free();
            self.free.push(i);
            self.keys -= 1;
            self.dead -= 1;

            for child in [node.low, node.high] {
                if self.is_const(child) {
                    continue;
                }
                let c = &mut self.nodes[child.index() as usize];
                if c.refs == u32::MAX {
                    continue;
                }
                c.refs -= 1;
                if c.refs == 0 {
                    self.dead += 1;
                    stack.push(child.index());
                }
            }
        }

        self.cache.clear();
        self.gc_count += 1;
        debug!("gc #{}: freed {} nodes, {} remain", self.gc_count, before - self.keys, self.keys);
    }
}

// Node creation.
impl Heap {
    /// Reduced, canonical node `var ? high : low`.
    pub(crate) fn mk(&mut self, var: VarIndex, low: Ref, high: Ref) -> Result<Ref> {
        if low == high {
            return Ok(low);
        }
        if high.is_negated() {
            return Ok(-self.find_or_add(var, -low, -high)?);
        }
        self.find_or_add(var, low, high)
    }

    fn find_or_add(&mut self, var: VarIndex, low: Ref, high: Ref) -> Result<Ref> {
        debug_assert!(!high.is_negated());
        let level = self.perm[var as usize] as usize;
        if let Some(i) = self.subtables[level].find(low, high) {
            return Ok(Ref::positive(i));
        }

        if !self.reordering {
            if let Some(method) = self.autodyn {
                if self.live() >= self.next_reorder {
                    debug!("automatic reordering at {} live nodes", self.live());
                    self.reorder(method)?;
                    self.next_reorder = self.next_reorder.saturating_mul(2).max(2 * self.live());
                    self.reordered = true;
                    return Err(EngineError::Reordered);
                }
            }
            let at_limit = self.max_nodes.is_some_and(|limit| self.keys >= limit);
            if self.dead > 0 && (self.dead >= self.gc_threshold || at_limit) {
                self.collect_garbage();
            }
            if let Some(limit) = self.max_nodes {
                if self.keys >= limit {
                    return Err(EngineError::MemoryOut { limit });
                }
            }
        }

        let i = self.alloc(Node::new(var, low, high))?;
        self.inc(low);
        self.inc(high);
        self.subtables[level].insert(low, high, i);
        Ok(Ref::positive(i))
    }

    fn alloc(&mut self, node: Node) -> Result<u32> {
        let i = match self.free.pop() {
            Some(i) => {
                self.nodes[i as usize] = node;
                i
            }
            None => {
                if self.nodes.len() > Ref::MAX_INDEX as usize {
                    return Err(EngineError::MemoryOut { limit: Ref::MAX_INDEX as usize });
                }
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        };
        self.keys += 1;
        // Fresh nodes start unreferenced.
        self.dead += 1;
        self.peak = self.peak.max(self.keys);
        Ok(i)
    }

    /// Run `op`, restarting it whenever automatic reordering interrupts it.
    pub(crate) fn retry<F>(&mut self, mut op: F) -> Result<Ref>
    where
        F: FnMut(&mut Self) -> Result<Ref>,
    {
        loop {
            self.reordered = false;
            match op(self) {
                Err(EngineError::Reordered) => debug!("operation interrupted by reordering, restarting"),
                result => return result,
            }
        }
    }

    /// Append a variable at the bottom of the order.
    pub(crate) fn add_var(&mut self) -> Result<Ref> {
        let var = self.vars.len() as VarIndex;
        if var >= MAX_INDEX {
            return Err(EngineError::InvalidArgument(format!("variable limit {} reached", MAX_INDEX)));
        }
        self.perm.push(self.subtables.len() as u32);
        self.subtables.push(Subtable::new(var));

        match self.retry(|h| h.mk(var, ZERO, ONE)) {
            Ok(r) => {
                self.inc(r);
                self.vars.push(r);
                debug!("new variable {} at level {}", var, self.perm[var as usize]);
                Ok(r)
            }
            Err(e) => {
                // A reordering may have moved the empty level; drop it wherever it is.
                let level = self.perm[var as usize] as usize;
                self.subtables.remove(level);
                self.perm.pop();
                for l in self.perm.iter_mut() {
                    if *l as usize > level {
                        *l -= 1;
                    }
                }
                Err(e)
            }
        }
    }
}

impl Engine for Heap {
    fn name(&self) -> &'static str {
        "heap"
    }

    fn one(&self) -> NodeId {
        ONE.into()
    }

    fn zero(&self) -> NodeId {
        ZERO.into()
    }

    fn is_constant(&self, f: NodeId) -> bool {
        self.is_const(Ref::from(f))
    }

    fn is_complement(&self, f: NodeId) -> bool {
        Ref::from(f).is_negated()
    }

    fn regular(&self, f: NodeId) -> NodeId {
        Ref::from(f).regular().into()
    }

    fn not(&self, f: NodeId) -> NodeId {
        (-Ref::from(f)).into()
    }

    fn node_index(&self, f: NodeId) -> Option<VarIndex> {
        let r = Ref::from(f);
        if self.is_const(r) {
            None
        } else {
            Some(self.node(r).var)
        }
    }

    fn then_child(&self, f: NodeId) -> NodeId {
        self.node(Ref::from(f)).high.into()
    }

    fn else_child(&self, f: NodeId) -> NodeId {
        self.node(Ref::from(f)).low.into()
    }

    fn unique_inter(&mut self, index: VarIndex, t: NodeId, e: NodeId) -> Result<NodeId> {
        self.check_var(index)?;
        let t = self.check(t)?;
        let e = self.check(e)?;
        let level = self.perm[index as usize];
        if self.level(t) <= level || self.level(e) <= level {
            return Err(EngineError::InvalidArgument(format!(
                "children of a node on variable {} must lie below level {}",
                index, level
            )));
        }
        Ok(self.mk(index, e, t)?.into())
    }

    fn reordered(&self) -> bool {
        self.reordered
    }

    fn clear_reordered(&mut self) {
        self.reordered = false;
    }

    fn ref_node(&mut self, f: NodeId) {
        match self.check(f) {
            Ok(r) => self.inc(r),
            Err(e) => warn!("ref_node: {}", e),
        }
    }

    fn deref_node(&mut self, f: NodeId) {
        match self.check(f) {
            Ok(r) => self.dec(r),
            Err(e) => warn!("deref_node: {}", e),
        }
    }

    fn var_count(&self) -> VarIndex {
        self.vars.len() as VarIndex
    }

    fn new_var(&mut self) -> Result<NodeId> {
        Ok(self.add_var()?.into())
    }

    fn ith_var(&self, index: VarIndex) -> Option<NodeId> {
        self.vars.get(index as usize).map(|&r| r.into())
    }

    fn perm(&self, index: VarIndex) -> Option<u32> {
        self.perm.get(index as usize).copied()
    }

    fn inv_perm(&self, level: u32) -> Option<VarIndex> {
        self.subtables.get(level as usize).map(|s| s.variable)
    }

    fn and(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        debug!("and(f = {}, g = {})", f, g);
        Ok(self.retry(|h| h.and_rec(f, g))?.into())
    }

    fn or(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        debug!("or(f = {}, g = {})", f, g);
        Ok(self.retry(|h| h.or_rec(f, g))?.into())
    }

    fn xor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        debug!("xor(f = {}, g = {})", f, g);
        Ok(self.retry(|h| h.xor_rec(f, g))?.into())
    }

    fn nand(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok((-self.retry(|h| h.and_rec(f, g))?).into())
    }

    fn nor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok((-self.retry(|h| h.or_rec(f, g))?).into())
    }

    fn xnor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        Ok((-self.retry(|h| h.xor_rec(f, g))?).into())
    }

    fn ite(&mut self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId> {
        let (f, g, h) = (self.check(f)?, self.check(g)?, self.check(h)?);
        debug!("ite(f = {}, g = {}, h = {})", f, g, h);
        Ok(self.retry(|heap| heap.ite_rec(f, g, h))?.into())
    }

    fn compose(&mut self, f: NodeId, g: NodeId, var: VarIndex) -> Result<NodeId> {
        let (f, g) = (self.check(f)?, self.check(g)?);
        self.check_var(var)?;
        Ok(self.retry(|h| h.compose_top(f, g, var))?.into())
    }

    fn vector_compose(&mut self, f: NodeId, vector: &[NodeId]) -> Result<NodeId> {
        let f = self.check(f)?;
        if vector.len() > self.vars.len() {
            return Err(EngineError::InvalidArgument(format!(
                "substitution vector has {} entries for {} variables",
                vector.len(),
                self.vars.len()
            )));
        }
        let vector = vector.iter().map(|&g| self.check(g)).collect::<Result<Vec<_>>>()?;
        debug!("vector_compose(f = {}, {} entries)", f, vector.len());
        Ok(self.retry(|h| h.vector_compose_top(f, &vector))?.into())
    }

    fn permute(&mut self, f: NodeId, permutation: &[VarIndex]) -> Result<NodeId> {
        let f = self.check(f)?;
        if permutation.len() > self.vars.len() {
            return Err(EngineError::InvalidArgument(format!(
                "permutation has {} entries for {} variables",
                permutation.len(),
                self.vars.len()
            )));
        }
        let vector = self.permutation_vector(permutation)?;
        Ok(self.retry(|h| h.vector_compose_top(f, &vector))?.into())
    }

    fn restrict(&mut self, f: NodeId, c: NodeId) -> Result<NodeId> {
        let (f, c) = (self.check(f)?, self.check(c)?);
        Ok(self.retry(|h| h.restrict_rec(f, c))?.into())
    }

    fn support(&mut self, f: NodeId) -> Result<NodeId> {
        let f = self.check(f)?;
        Ok(self
            .retry(|h| {
                let vars = h.support_vars(f);
                h.cube_rec(&vars)
            })?
            .into())
    }

    fn exist_abstract(&mut self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        let (f, cube) = (self.check(f)?, self.check(cube)?);
        self.check_cube(cube)?;
        Ok(self.retry(|h| h.exist_rec(f, cube))?.into())
    }

    fn univ_abstract(&mut self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        let (f, cube) = (self.check(f)?, self.check(cube)?);
        self.check_cube(cube)?;
        Ok(self.retry(|h| h.univ_rec(f, cube))?.into())
    }

    fn and_abstract(&mut self, f: NodeId, g: NodeId, cube: NodeId) -> Result<NodeId> {
        let (f, g, cube) = (self.check(f)?, self.check(g)?, self.check(cube)?);
        self.check_cube(cube)?;
        Ok(self.retry(|h| h.and_abstract_rec(f, g, cube))?.into())
    }

    fn dag_size(&self, f: NodeId) -> usize {
        self.dag_size_of(Ref::from(f))
    }

    fn count_minterm(&self, f: NodeId, nvars: u32) -> BigUint {
        self.minterms(Ref::from(f), nvars)
    }

    fn count_paths(&self, f: NodeId) -> Result<BigUint> {
        Ok(self.paths(self.check(f)?))
    }

    fn reduce_heap(&mut self, method: ReorderingType) -> Result<()> {
        self.reorder(method)?;
        self.reordered = true;
        Ok(())
    }

    fn autodyn_enable(&mut self, method: ReorderingType) {
        debug!("automatic reordering enabled: {}", method);
        self.autodyn = match method {
            ReorderingType::None => None,
            ReorderingType::Same => Some(self.autodyn.unwrap_or(ReorderingType::Sift)),
            m => Some(m),
        };
    }

    fn autodyn_disable(&mut self) {
        debug!("automatic reordering disabled");
        self.autodyn = None;
    }

    fn autodyn_status(&self) -> Option<ReorderingType> {
        self.autodyn
    }

    fn shuffle_heap(&mut self, order: &[VarIndex]) -> Result<()> {
        self.shuffle(order)?;
        self.reordered = true;
        Ok(())
    }

    fn add_var_block(&mut self, first: VarIndex, last: VarIndex, fixed: bool) -> Result<()> {
        self.add_block(first, last, fixed)
    }

    fn clear_var_blocks(&mut self) {
        debug!("clearing {} variable blocks", self.blocks.len());
        self.blocks.clear();
    }

    fn collect_garbage(&mut self) {
        Heap::collect_garbage(self)
    }

    fn node_count(&self) -> usize {
        self.live()
    }

    fn peak_node_count(&self) -> usize {
        self.peak
    }

    fn cache_slots(&self) -> usize {
        self.cache.capacity()
    }

    fn reorderings(&self) -> usize {
        self.reorder_count
    }

    fn garbage_collections(&self) -> usize {
        self.gc_count
    }
}
