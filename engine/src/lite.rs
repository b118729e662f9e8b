//! A reduced-capability backend.
//!
//! `Lite` shares the heap implementation but exposes only the core primitive
//! set: quantification, explicit order shuffling and path counting fall back
//! to the [`Engine`] defaults and report [`EngineError::NotImplemented`].
//!
//! [`EngineError::NotImplemented`]: crate::EngineError::NotImplemented

use num_bigint::BigUint;

use crate::engine::Engine;
use crate::error::Result;
use crate::heap::{Heap, HeapConfig};
use crate::node_id::{NodeId, VarIndex};
use crate::types::ReorderingType;

#[derive(Debug, Default)]
pub struct Lite {
    heap: Heap,
}

impl Lite {
    pub fn new(config: HeapConfig) -> Result<Self> {
        Ok(Self {
            heap: Heap::new(config)?,
        })
    }
}

impl Engine for Lite {
    fn name(&self) -> &'static str {
        "lite"
    }

    fn one(&self) -> NodeId {
        self.heap.one()
    }
    fn zero(&self) -> NodeId {
        self.heap.zero()
    }
    fn is_constant(&self, f: NodeId) -> bool {
        self.heap.is_constant(f)
    }
    fn is_complement(&self, f: NodeId) -> bool {
        self.heap.is_complement(f)
    }
    fn regular(&self, f: NodeId) -> NodeId {
        self.heap.regular(f)
    }
    fn not(&self, f: NodeId) -> NodeId {
        self.heap.not(f)
    }
    fn node_index(&self, f: NodeId) -> Option<VarIndex> {
        self.heap.node_index(f)
    }
    fn then_child(&self, f: NodeId) -> NodeId {
        self.heap.then_child(f)
    }
    fn else_child(&self, f: NodeId) -> NodeId {
        self.heap.else_child(f)
    }
    fn unique_inter(&mut self, index: VarIndex, t: NodeId, e: NodeId) -> Result<NodeId> {
        self.heap.unique_inter(index, t, e)
    }
    fn reordered(&self) -> bool {
        self.heap.reordered()
    }
    fn clear_reordered(&mut self) {
        self.heap.clear_reordered()
    }

    fn ref_node(&mut self, f: NodeId) {
        self.heap.ref_node(f)
    }
    fn deref_node(&mut self, f: NodeId) {
        self.heap.deref_node(f)
    }

    fn var_count(&self) -> VarIndex {
        self.heap.var_count()
    }
    fn new_var(&mut self) -> Result<NodeId> {
        self.heap.new_var()
    }
    fn ith_var(&self, index: VarIndex) -> Option<NodeId> {
        self.heap.ith_var(index)
    }
    fn perm(&self, index: VarIndex) -> Option<u32> {
        Engine::perm(&self.heap, index)
    }
    fn inv_perm(&self, level: u32) -> Option<VarIndex> {
        self.heap.inv_perm(level)
    }

    fn and(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.and(f, g)
    }
    fn or(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.or(f, g)
    }
    fn xor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.xor(f, g)
    }
    fn nand(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.nand(f, g)
    }
    fn nor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.nor(f, g)
    }
    fn xnor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.heap.xnor(f, g)
    }
    fn ite(&mut self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId> {
        self.heap.ite(f, g, h)
    }
    fn compose(&mut self, f: NodeId, g: NodeId, var: VarIndex) -> Result<NodeId> {
        self.heap.compose(f, g, var)
    }
    fn vector_compose(&mut self, f: NodeId, vector: &[NodeId]) -> Result<NodeId> {
        self.heap.vector_compose(f, vector)
    }
    fn permute(&mut self, f: NodeId, permutation: &[VarIndex]) -> Result<NodeId> {
        self.heap.permute(f, permutation)
    }
    fn restrict(&mut self, f: NodeId, c: NodeId) -> Result<NodeId> {
        self.heap.restrict(f, c)
    }
    fn support(&mut self, f: NodeId) -> Result<NodeId> {
        self.heap.support(f)
    }

    fn dag_size(&self, f: NodeId) -> usize {
        self.heap.dag_size(f)
    }
    fn count_minterm(&self, f: NodeId, nvars: u32) -> BigUint {
        self.heap.count_minterm(f, nvars)
    }

    fn reduce_heap(&mut self, method: ReorderingType) -> Result<()> {
        self.heap.reduce_heap(method)
    }
    fn autodyn_enable(&mut self, method: ReorderingType) {
        self.heap.autodyn_enable(method)
    }
    fn autodyn_disable(&mut self) {
        self.heap.autodyn_disable()
    }
    fn autodyn_status(&self) -> Option<ReorderingType> {
        self.heap.autodyn_status()
    }
    fn add_var_block(&mut self, first: VarIndex, last: VarIndex, fixed: bool) -> Result<()> {
        self.heap.add_var_block(first, last, fixed)
    }
    fn clear_var_blocks(&mut self) {
        self.heap.clear_var_blocks()
    }
    fn collect_garbage(&mut self) {
        Engine::collect_garbage(&mut self.heap)
    }

    fn node_count(&self) -> usize {
        self.heap.node_count()
    }
    fn peak_node_count(&self) -> usize {
        self.heap.peak_node_count()
    }
    fn cache_slots(&self) -> usize {
        self.heap.cache_slots()
    }
    fn reorderings(&self) -> usize {
        self.heap.reorderings()
    }
    fn garbage_collections(&self) -> usize {
        self.heap.garbage_collections()
    }
}
