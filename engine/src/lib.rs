//! # bdd-engine: a reference-counted BDD heap behind a primitive interface
//!
//! This crate provides the diagram engine driven by `bdd-bridge`. Clients see
//! it only through the object-safe [`Engine`] trait: opaque [`NodeId`]
//! handles, terminal predicates, child accessors, the usual Boolean
//! operations, variable creation, reordering and reference counting.
//!
//! ## Backends
//!
//! - [`Heap`]: complement-edge BDDs with per-level unique subtables,
//!   reference counts with dead-node garbage collection, a generation-cleared
//!   computed table, quantification, model and path counting, and in-place
//!   dynamic reordering (sifting, window permutation, random exchanges) that
//!   respects variable blocks.
//! - [`Lite`]: the same heap with a reduced surface; quantification,
//!   order shuffling and path counting report
//!   [`EngineError::NotImplemented`].
//!
//! ## Reference discipline
//!
//! Results come back unreferenced. Take ownership with
//! [`Engine::ref_node`] before the next call that may create nodes, and give it
//! back with [`Engine::deref_node`].
//!
//! ```rust
//! use bdd_engine::{Engine, Heap};
//!
//! let mut heap = Heap::default();
//! let x = heap.new_var().unwrap();
//! let y = heap.new_var().unwrap();
//!
//! let f = heap.and(x, y).unwrap();
//! heap.ref_node(f);
//! assert_eq!(heap.high(f), y);
//! assert_eq!(heap.low(f), heap.zero());
//! heap.deref_node(f);
//! ```

mod apply;
mod cache;
mod count;
mod engine;
mod error;
mod heap;
mod lite;
mod node;
mod node_id;
mod quantify;
mod reference;
mod reorder;
mod subtable;
mod types;
mod utils;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use heap::{Heap, HeapConfig};
pub use lite::Lite;
pub use node_id::{NodeId, VarIndex, MAX_INDEX};
pub use types::ReorderingType;
