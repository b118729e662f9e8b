//! The primitive interface every backend exposes.
//!
//! Handles passed in must be live: either referenced by the caller or
//! reachable from a referenced node. Results come back *unreferenced*; the
//! caller takes ownership with [`Engine::ref_node`] before the next call that
//! may create nodes.

use num_bigint::BigUint;

use crate::error::{EngineError, Result};
use crate::node_id::{NodeId, VarIndex};
use crate::types::ReorderingType;

pub trait Engine {
    /// Short backend name, used in log output.
    fn name(&self) -> &'static str;

    // ---- structure ----

    fn one(&self) -> NodeId;
    fn zero(&self) -> NodeId;

    fn is_constant(&self, f: NodeId) -> bool;
    fn is_complement(&self, f: NodeId) -> bool;
    /// `f` with the complement tag cleared.
    fn regular(&self, f: NodeId) -> NodeId;
    fn not(&self, f: NodeId) -> NodeId;

    /// Variable labelling the node under `f`, `None` for the terminal.
    fn node_index(&self, f: NodeId) -> Option<VarIndex>;
    /// Stored high child of the regular node under `f`, ignoring the tag on `f`.
    fn then_child(&self, f: NodeId) -> NodeId;
    /// Stored low child of the regular node under `f`, ignoring the tag on `f`.
    fn else_child(&self, f: NodeId) -> NodeId;

    /// Positive cofactor of the function `f` with respect to its top variable.
    fn high(&self, f: NodeId) -> NodeId {
        let t = self.then_child(f);
        if self.is_complement(f) {
            self.not(t)
        } else {
            t
        }
    }

    /// Negative cofactor of the function `f` with respect to its top variable.
    fn low(&self, f: NodeId) -> NodeId {
        let e = self.else_child(f);
        if self.is_complement(f) {
            self.not(e)
        } else {
            e
        }
    }

    /// Find or create the node `index ? t : e`.
    ///
    /// Fails with [`EngineError::Reordered`] when the creation triggered an
    /// automatic reordering; the caller must restart its computation.
    fn unique_inter(&mut self, index: VarIndex, t: NodeId, e: NodeId) -> Result<NodeId>;

    /// Whether a reordering happened since the flag was last cleared.
    fn reordered(&self) -> bool;
    fn clear_reordered(&mut self);

    // ---- references ----

    fn ref_node(&mut self, f: NodeId);
    fn deref_node(&mut self, f: NodeId);

    // ---- variables ----

    fn var_count(&self) -> VarIndex;
    /// Create a variable at the bottom of the order and return its literal.
    fn new_var(&mut self) -> Result<NodeId>;
    fn ith_var(&self, index: VarIndex) -> Option<NodeId>;
    /// Level of variable `index`.
    fn perm(&self, index: VarIndex) -> Option<u32>;
    /// Variable at `level`.
    fn inv_perm(&self, level: u32) -> Option<VarIndex>;

    // ---- boolean operations ----

    fn and(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn or(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn xor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn nand(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn nor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn xnor(&mut self, f: NodeId, g: NodeId) -> Result<NodeId>;
    fn ite(&mut self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId>;

    /// Substitute `g` for variable `var` in `f`.
    fn compose(&mut self, f: NodeId, g: NodeId, var: VarIndex) -> Result<NodeId>;
    /// Substitute `vector[i]` for every variable `i` simultaneously. Variables
    /// beyond the end of `vector` are left in place.
    fn vector_compose(&mut self, f: NodeId, vector: &[NodeId]) -> Result<NodeId>;
    /// Rename every variable `i` of `f` to `permutation[i]`.
    fn permute(&mut self, f: NodeId, permutation: &[VarIndex]) -> Result<NodeId>;
    /// Coudert-Madre restrict of `f` to the care set `c`.
    fn restrict(&mut self, f: NodeId, c: NodeId) -> Result<NodeId>;
    /// Positive cube of the variables `f` depends on.
    fn support(&mut self, f: NodeId) -> Result<NodeId>;

    // ---- quantification ----

    fn exist_abstract(&mut self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        let _ = (f, cube);
        Err(EngineError::NotImplemented("existential abstraction"))
    }

    fn univ_abstract(&mut self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        let _ = (f, cube);
        Err(EngineError::NotImplemented("universal abstraction"))
    }

    /// Relational product: `exists cube. f & g`.
    fn and_abstract(&mut self, f: NodeId, g: NodeId, cube: NodeId) -> Result<NodeId> {
        let _ = (f, g, cube);
        Err(EngineError::NotImplemented("and-abstraction"))
    }

    // ---- counting ----

    /// Number of distinct nodes in the diagram of `f`, terminal included.
    fn dag_size(&self, f: NodeId) -> usize;
    /// Number of satisfying assignments of `f` over `nvars` variables.
    fn count_minterm(&self, f: NodeId, nvars: u32) -> BigUint;

    /// Number of paths from `f` to the `1` terminal.
    fn count_paths(&self, f: NodeId) -> Result<BigUint> {
        let _ = f;
        Err(EngineError::NotImplemented("path counting"))
    }

    // ---- reordering ----

    fn reduce_heap(&mut self, method: ReorderingType) -> Result<()>;
    fn autodyn_enable(&mut self, method: ReorderingType);
    fn autodyn_disable(&mut self);
    /// The automatic reordering method, `None` when disabled.
    fn autodyn_status(&self) -> Option<ReorderingType>;

    /// Adopt the order where `order[level]` is the variable at `level`.
    fn shuffle_heap(&mut self, order: &[VarIndex]) -> Result<()> {
        let _ = order;
        Err(EngineError::NotImplemented("order shuffling"))
    }

    /// Keep the variables on levels `perm(first)..=perm(last)` adjacent during
    /// reordering. A `fixed` block never changes its levels at all.
    ///
    /// Blocks may nest but must not partially overlap.
    fn add_var_block(&mut self, first: VarIndex, last: VarIndex, fixed: bool) -> Result<()>;
    fn clear_var_blocks(&mut self);

    // ---- memory ----

    /// Reclaim every unreferenced node now, together with the children only
    /// they kept alive.
    fn collect_garbage(&mut self);

    // ---- statistics ----

    /// Internal nodes not yet reclaimed: referenced nodes plus the children of
    /// dead parents that are still waiting for garbage collection. Right after
    /// [`Engine::collect_garbage`] this is exactly the referenced nodes.
    fn node_count(&self) -> usize;
    fn peak_node_count(&self) -> usize;
    fn cache_slots(&self) -> usize;
    fn reorderings(&self) -> usize;
    fn garbage_collections(&self) -> usize;
}
