//! The owning context.
//!
//! A [`Manager`] owns at most one engine at a time, the permanent references
//! on the two terminals and the registry of pairing tables. Node handles and
//! pairing tables only keep a weak back-reference: once the manager is shut
//! down (explicitly, or by dropping its last clone) releasing them is a no-op.

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use bdd_engine::Engine;
use log::{debug, info};

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::handle::Bdd;
use crate::pairing::Registry;

pub(crate) struct Shared {
    pub(crate) engine: RefCell<Option<Box<dyn Engine>>>,
    /// Permanently held `(one, zero)`.
    pub(crate) terminals: RefCell<Option<(Bdd, Bdd)>>,
    pub(crate) var_count: Cell<u32>,
    pub(crate) registry: RefCell<Registry>,
    /// Bumped on every initialization; handles from older generations are inert.
    pub(crate) generation: Cell<u64>,
}

impl Shared {
    fn new() -> Self {
        Self {
            engine: RefCell::new(None),
            terminals: RefCell::new(None),
            var_count: Cell::new(0),
            registry: RefCell::new(Registry::default()),
            generation: Cell::new(0),
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.engine.borrow().is_some()
    }

    /// Run `f` against the attached engine.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut dyn Engine) -> R) -> Result<R> {
        let mut engine = self.engine.borrow_mut();
        match engine.as_deref_mut() {
            Some(engine) => Ok(f(engine)),
            None => Err(Error::UseAfterShutdown),
        }
    }

    fn teardown(&self) {
        // Slot references go first, while the engine is still attached.
        let tables = self.registry.borrow_mut().take_all();
        drop(tables);
        let terminals = self.terminals.borrow_mut().take();
        drop(terminals);

        // Detach before destroying, so nothing can reach a half-destroyed engine.
        let engine = self.engine.borrow_mut().take();
        self.var_count.set(0);
        if let Some(engine) = engine {
            info!(
                "shutdown: {} backend, {} live nodes, peak {}, {} reorderings, {} collections",
                engine.name(),
                engine.node_count(),
                engine.peak_node_count(),
                engine.reorderings(),
                engine.garbage_collections()
            );
            drop(engine);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if self.engine.get_mut().is_some() {
            self.teardown();
        }
    }
}

/// Explicit, cheaply clonable BDD context.
#[derive(Clone)]
pub struct Manager {
    pub(crate) shared: Rc<Shared>,
}

impl Manager {
    /// A manager with no engine attached yet.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared::new()),
        }
    }

    /// Create and initialize a manager.
    pub fn with_config(config: &ManagerConfig) -> Result<Self> {
        let manager = Self::new();
        manager.initialize(config)?;
        Ok(manager)
    }

    /// Attach a fresh engine and return new handles on `(one, zero)`.
    pub fn initialize(&self, config: &ManagerConfig) -> Result<(Bdd, Bdd)> {
        if self.is_initialized() {
            return Err(Error::Configuration("manager is already initialized".to_string()));
        }
        let engine = config.create_engine()?;
        info!(
            "initialize: {} backend, {} unique slots, {} cache slots",
            engine.name(),
            config.unique_slots,
            engine.cache_slots()
        );

        let shared = &self.shared;
        *shared.engine.borrow_mut() = Some(engine);
        shared.generation.set(shared.generation.get() + 1);
        shared.var_count.set(0);

        let one = shared.produce(|engine| Ok(engine.one()))?;
        let zero = shared.produce(|engine| Ok(engine.zero()))?;
        let result = (one.clone(), zero.clone());
        *shared.terminals.borrow_mut() = Some((one, zero));
        Ok(result)
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.is_attached()
    }

    /// Release every pairing table and the terminal references, then destroy the engine.
    pub fn shutdown(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::UseAfterShutdown);
        }
        self.shared.teardown();
        Ok(())
    }

    pub(crate) fn context(&self) -> Result<&Rc<Shared>> {
        if self.is_initialized() {
            Ok(&self.shared)
        } else {
            Err(Error::UseAfterShutdown)
        }
    }

    pub fn one(&self) -> Result<Bdd> {
        self.terminal(|(one, _)| one.clone())
    }

    pub fn zero(&self) -> Result<Bdd> {
        self.terminal(|(_, zero)| zero.clone())
    }

    fn terminal(&self, pick: impl FnOnce(&(Bdd, Bdd)) -> Bdd) -> Result<Bdd> {
        self.context()?;
        self.shared.terminals.borrow().as_ref().map(pick).ok_or(Error::UseAfterShutdown)
    }

    // ---- statistics ----

    /// Engine nodes not reclaimed yet. Children of released nodes stay counted
    /// until the next [`Manager::collect_garbage`].
    pub fn node_count(&self) -> Result<usize> {
        self.shared.with_engine(|engine| engine.node_count())
    }

    /// Reclaim every unreferenced engine node now.
    pub fn collect_garbage(&self) -> Result<()> {
        debug!("collect_garbage");
        self.context()?.with_engine(|engine| engine.collect_garbage())
    }

    pub fn peak_node_count(&self) -> Result<usize> {
        self.shared.with_engine(|engine| engine.peak_node_count())
    }

    pub fn cache_slots(&self) -> Result<usize> {
        self.shared.with_engine(|engine| engine.cache_slots())
    }

    pub fn reorderings(&self) -> Result<usize> {
        self.shared.with_engine(|engine| engine.reorderings())
    }

    pub fn garbage_collections(&self) -> Result<usize> {
        self.shared.with_engine(|engine| engine.garbage_collections())
    }

    /// Name of the attached backend.
    pub fn backend_name(&self) -> Result<&'static str> {
        self.shared.with_engine(|engine| engine.name())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Manager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("initialized", &self.is_initialized())
            .field("generation", &self.shared.generation.get())
            .field("variables", &self.shared.var_count.get())
            .field("pairings", &self.shared.registry.borrow().len())
            .finish()
    }
}
