//! # bdd-bridge: reference-disciplined access to a BDD engine
//!
//! **`bdd-bridge`** lets a host that only speaks in opaque numeric handles
//! drive a binary-decision-diagram engine. The engine (crate `bdd-engine`)
//! owns the diagrams; this crate owns everything around them:
//!
//! - **Reference discipline**: every node a caller can reach is a [`Bdd`]
//!   holding exactly one engine reference, released on drop.
//! - **Lifecycle**: a [`Manager`] attaches and detaches the engine; handles
//!   that outlive it become inert instead of dangling.
//! - **Variable domain**: growth, level mapping, reordering control and
//!   variable blocks.
//! - **Substitution tables**: [`Pairing`] maps each variable to a
//!   replacement, for vector composition and renaming.
//! - **Satisfying assignments**: [`Manager::sat_one`] extracts a single-path
//!   cube, restarting when automatic reordering interrupts it.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_bridge::{BddOp, Manager, ManagerConfig};
//!
//! let mgr = Manager::with_config(&ManagerConfig::default())?;
//! mgr.ensure_variable_count(3)?;
//!
//! let x = mgr.ith_variable(0)?.unwrap();
//! let y = mgr.ith_variable(1)?.unwrap();
//!
//! // f = x → y
//! let f = mgr.apply(&x, &y, BddOp::Imp)?;
//! assert!(!f.is_one()?);
//!
//! // The first satisfying assignment takes x = 0.
//! let s = mgr.sat_one(&f)?;
//! assert_eq!(s, x.not()?);
//! # Ok::<(), bdd_bridge::Error>(())
//! ```
//!
//! ## Host bindings
//!
//! Handles cross a binding boundary as raw 64-bit values:
//! [`Bdd::into_raw`] hands the reference over and [`Manager::from_raw`]
//! adopts it back. [`BddOp`] and [`ReorderMethod`] translate the host's
//! numeric operator and reordering codes.

pub mod config;
pub mod domain;
pub mod error;
pub mod handle;
pub mod manager;
pub mod ops;
pub mod pairing;
pub mod satone;

pub use bdd_engine::{NodeId, VarIndex};

pub use crate::config::{Backend, ManagerConfig};
pub use crate::domain::ReorderMethod;
pub use crate::error::{Error, Result};
pub use crate::handle::Bdd;
pub use crate::manager::Manager;
pub use crate::ops::BddOp;
pub use crate::pairing::{Pairing, PairingId};
pub use crate::satone::MAX_SATONE_ATTEMPTS;
