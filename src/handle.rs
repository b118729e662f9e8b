//! Owning node handles and the reference bridge.
//!
//! This is the only module that adjusts engine reference counts.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use bdd_engine::{Engine, NodeId, VarIndex};
use log::{debug, warn};
use num_bigint::BigUint;

use crate::domain::visible_level;
use crate::error::{Error, Result};
use crate::manager::{Manager, Shared};

/// A diagram node owning exactly one engine reference.
///
/// `Clone` takes another reference and `Drop` gives it back. A handle that
/// outlives its manager (or the engine it was created on) becomes inert:
/// every operation fails with [`Error::UseAfterShutdown`] and dropping it
/// does nothing.
pub struct Bdd {
    ctx: Weak<Shared>,
    id: NodeId,
    generation: u64,
}

impl Shared {
    /// Run an engine operation and take a reference on its result.
    pub(crate) fn produce(
        self: &Rc<Self>,
        op: impl FnOnce(&mut dyn Engine) -> Result<NodeId>,
    ) -> Result<Bdd> {
        let id = self.with_engine(|engine| {
            let id = op(&mut *engine)?;
            engine.ref_node(id);
            Ok::<_, Error>(id)
        })??;
        Ok(Bdd {
            ctx: Rc::downgrade(self),
            id,
            generation: self.generation.get(),
        })
    }

    /// Positive literal of an existing engine variable.
    pub(crate) fn literal(self: &Rc<Self>, var: VarIndex) -> Result<Bdd> {
        self.produce(|engine| {
            engine
                .ith_var(var)
                .ok_or_else(|| Error::Argument(format!("variable {} does not exist", var)))
        })
    }

    pub(crate) fn add_ref(&self, id: NodeId, generation: u64) {
        if !id.is_valid() || generation != self.generation.get() {
            return;
        }
        if let Ok(mut engine) = self.engine.try_borrow_mut() {
            if let Some(engine) = engine.as_deref_mut() {
                engine.ref_node(id);
            }
        } else {
            warn!("add_ref({}) while the engine is busy", id);
        }
    }

    pub(crate) fn del_ref(&self, id: NodeId, generation: u64) {
        if !id.is_valid() {
            return;
        }
        if generation != self.generation.get() {
            debug!("del_ref({}) from a previous engine ignored", id);
            return;
        }
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => match engine.as_deref_mut() {
                Some(engine) => engine.deref_node(id),
                None => debug!("del_ref({}) after shutdown ignored", id),
            },
            Err(_) => warn!("del_ref({}) while the engine is busy, reference leaked", id),
        }
    }
}

impl Manager {
    /// Adopt a reference previously released with [`Bdd::into_raw`].
    pub fn from_raw(&self, id: NodeId) -> Result<Bdd> {
        let ctx = self.context()?;
        if !id.is_valid() {
            return Err(Error::Argument("invalid node handle".to_string()));
        }
        Ok(Bdd {
            ctx: Rc::downgrade(ctx),
            id,
            generation: ctx.generation.get(),
        })
    }

    /// Take one more reference on a raw handle.
    pub fn add_ref(&self, id: NodeId) -> Result<()> {
        let ctx = self.context()?;
        ctx.add_ref(id, ctx.generation.get());
        Ok(())
    }

    /// Release one reference on a raw handle. Silent on a shut-down manager.
    pub fn del_ref(&self, id: NodeId) {
        let ctx = &self.shared;
        ctx.del_ref(id, ctx.generation.get());
    }
}

impl Bdd {
    /// The raw handle, still owned by `self`.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Give up ownership of the reference to the caller.
    pub fn into_raw(mut self) -> NodeId {
        std::mem::replace(&mut self.id, NodeId::INVALID)
    }

    pub(crate) fn context(&self) -> Result<Rc<Shared>> {
        let ctx = self.ctx.upgrade().ok_or(Error::UseAfterShutdown)?;
        if ctx.generation.get() != self.generation || !ctx.is_attached() {
            return Err(Error::UseAfterShutdown);
        }
        Ok(ctx)
    }

    /// The owning manager.
    pub fn manager(&self) -> Result<Manager> {
        Ok(Manager { shared: self.context()? })
    }

    fn inspect<R>(&self, f: impl FnOnce(&mut dyn Engine, NodeId) -> R) -> Result<R> {
        self.context()?.with_engine(|engine| f(engine, self.id))
    }

    /// Top variable, `None` on a terminal.
    pub fn var(&self) -> Result<Option<VarIndex>> {
        self.inspect(|engine, id| engine.node_index(id))
    }

    /// Level of the top variable, `None` on a terminal.
    pub fn level(&self) -> Result<Option<u32>> {
        let ctx = self.context()?;
        let count = ctx.var_count.get();
        ctx.with_engine(|engine| {
            let var = engine.node_index(self.id)?;
            visible_level(engine, count, var)
        })
    }

    pub fn high(&self) -> Result<Bdd> {
        let id = self.id;
        self.context()?.produce(|engine| Ok(engine.high(id)))
    }

    pub fn low(&self) -> Result<Bdd> {
        let id = self.id;
        self.context()?.produce(|engine| Ok(engine.low(id)))
    }

    pub fn not(&self) -> Result<Bdd> {
        let id = self.id;
        self.context()?.produce(|engine| Ok(engine.not(id)))
    }

    pub fn is_one(&self) -> Result<bool> {
        self.inspect(|engine, id| id == engine.one())
    }

    pub fn is_zero(&self) -> Result<bool> {
        self.inspect(|engine, id| id == engine.zero())
    }

    pub fn is_constant(&self) -> Result<bool> {
        self.inspect(|engine, id| engine.is_constant(id))
    }

    /// Decision nodes reachable from `self`.
    pub fn node_count(&self) -> Result<usize> {
        self.inspect(|engine, id| engine.dag_size(id) - 1)
    }

    /// Paths to the `1` terminal.
    pub fn path_count(&self) -> Result<BigUint> {
        Ok(self.inspect(|engine, id| engine.count_paths(id))??)
    }

    /// Satisfying assignments over all variables of the manager.
    pub fn sat_count(&self) -> Result<BigUint> {
        let ctx = self.context()?;
        let nvars = ctx.var_count.get();
        ctx.with_engine(|engine| engine.count_minterm(self.id, nvars))
    }
}

impl Clone for Bdd {
    fn clone(&self) -> Self {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.add_ref(self.id, self.generation);
        }
        Self {
            ctx: self.ctx.clone(),
            id: self.id,
            generation: self.generation,
        }
    }
}

impl Drop for Bdd {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.upgrade() {
            ctx.del_ref(self.id, self.generation);
        }
    }
}

impl PartialEq for Bdd {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation && Weak::ptr_eq(&self.ctx, &other.ctx)
    }
}

impl Eq for Bdd {}

impl Hash for Bdd {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bdd({})", self.id)
    }
}
