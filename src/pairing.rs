//! Substitution pairing tables.
//!
//! A table maps every variable of its manager to a replacement node,
//! initially the variable's own literal. Tables live in a registry owned by
//! the manager so that growing the variable domain can extend all of them.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::rc::{Rc, Weak};

use bdd_engine::{NodeId, VarIndex};
use log::debug;

use crate::error::{Error, Result};
use crate::handle::Bdd;
use crate::manager::{Manager, Shared};

/// Opaque nonzero handle of a pairing table, for host bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairingId(NonZeroU64);

impl PairingId {
    pub fn raw(self) -> u64 {
        self.0.get()
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }
}

impl fmt::Display for PairingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pairing#{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct Registry {
    tables: BTreeMap<PairingId, Vec<Bdd>>,
    next_id: NonZeroU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            tables: BTreeMap::new(),
            next_id: NonZeroU64::MIN,
        }
    }
}

impl Registry {
    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }

    fn insert(&mut self, slots: Vec<Bdd>) -> PairingId {
        let id = PairingId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.tables.insert(id, slots);
        id
    }

    /// Append a copy of `literals` to every table.
    pub(crate) fn extend_all(&mut self, literals: &[Bdd]) {
        for slots in self.tables.values_mut() {
            slots.extend(literals.iter().cloned());
        }
    }

    /// Unlink every table, handing the slots to the caller for release.
    pub(crate) fn take_all(&mut self) -> Vec<Vec<Bdd>> {
        std::mem::take(&mut self.tables).into_values().collect()
    }
}

/// A substitution table owned by a [`Manager`].
///
/// Dropping the handle frees the table.
pub struct Pairing {
    ctx: Weak<Shared>,
    id: PairingId,
    generation: u64,
}

impl Manager {
    /// A new table mapping every current variable to itself.
    pub fn allocate_pairing(&self) -> Result<Pairing> {
        let ctx = self.context()?;
        let slots = (0..ctx.var_count.get())
            .map(|var| ctx.literal(var))
            .collect::<Result<Vec<_>>>()?;
        let id = ctx.registry.borrow_mut().insert(slots);
        debug!("allocate_pairing: {} with {} slots", id, ctx.var_count.get());
        Ok(Pairing {
            ctx: Rc::downgrade(ctx),
            id,
            generation: ctx.generation.get(),
        })
    }

    /// Registered tables.
    pub fn pairing_count(&self) -> Result<usize> {
        Ok(self.context()?.registry.borrow().len())
    }
}

impl Pairing {
    pub fn id(&self) -> PairingId {
        self.id
    }

    fn context(&self) -> Result<Rc<Shared>> {
        let ctx = self.ctx.upgrade().ok_or(Error::UseAfterShutdown)?;
        if ctx.generation.get() != self.generation || !ctx.is_attached() {
            return Err(Error::UseAfterShutdown);
        }
        Ok(ctx)
    }

    fn check_var(ctx: &Shared, var: VarIndex) -> Result<()> {
        let count = ctx.var_count.get();
        if var < count {
            Ok(())
        } else {
            Err(Error::Argument(format!("variable {} out of range (have {})", var, count)))
        }
    }

    /// Replace the given slots. Replaced nodes are released once the registry is no longer borrowed.
    fn install(&self, ctx: &Shared, entries: Vec<(VarIndex, Bdd)>) -> Result<()> {
        let old = {
            let mut registry = ctx.registry.borrow_mut();
            let slots = registry.tables.get_mut(&self.id).ok_or(Error::UseAfterShutdown)?;
            entries
                .into_iter()
                .map(|(var, node)| std::mem::replace(&mut slots[var as usize], node))
                .collect::<Vec<_>>()
        };
        drop(old);
        Ok(())
    }

    /// Map `var` to the literal of `replacement`.
    pub fn set_variable(&self, var: VarIndex, replacement: VarIndex) -> Result<()> {
        self.set_variables(&[var], &[replacement])
    }

    /// Map `var` to `node`.
    pub fn set_node(&self, var: VarIndex, node: &Bdd) -> Result<()> {
        self.set_nodes(&[var], std::slice::from_ref(node))
    }

    pub fn set_variables(&self, vars: &[VarIndex], replacements: &[VarIndex]) -> Result<()> {
        let ctx = self.context()?;
        if vars.len() != replacements.len() {
            return Err(Error::Argument(format!(
                "{} variables but {} replacements",
                vars.len(),
                replacements.len()
            )));
        }
        for (&var, &replacement) in vars.iter().zip(replacements) {
            Self::check_var(&ctx, var)?;
            Self::check_var(&ctx, replacement)?;
        }
        let entries = vars
            .iter()
            .zip(replacements)
            .map(|(&var, &replacement)| Ok((var, ctx.literal(replacement)?)))
            .collect::<Result<Vec<_>>>()?;
        self.install(&ctx, entries)
    }

    pub fn set_nodes(&self, vars: &[VarIndex], nodes: &[Bdd]) -> Result<()> {
        let ctx = self.context()?;
        if vars.len() != nodes.len() {
            return Err(Error::Argument(format!(
                "{} variables but {} nodes",
                vars.len(),
                nodes.len()
            )));
        }
        for (&var, node) in vars.iter().zip(nodes) {
            Self::check_var(&ctx, var)?;
            if !Rc::ptr_eq(&ctx, &node.context()?) {
                return Err(Error::Argument("replacement belongs to a different manager".to_string()));
            }
        }
        let entries = vars.iter().copied().zip(nodes.iter().cloned()).collect();
        self.install(&ctx, entries)
    }

    /// Restore every slot to its identity literal.
    pub fn reset(&self) -> Result<()> {
        let ctx = self.context()?;
        let entries = (0..self.len()? as VarIndex)
            .map(|var| Ok((var, ctx.literal(var)?)))
            .collect::<Result<Vec<_>>>()?;
        self.install(&ctx, entries)
    }

    /// Current replacement of `var`.
    pub fn slot(&self, var: VarIndex) -> Result<Bdd> {
        let ctx = self.context()?;
        Self::check_var(&ctx, var)?;
        let registry = ctx.registry.borrow();
        let slots = registry.tables.get(&self.id).ok_or(Error::UseAfterShutdown)?;
        Ok(slots[var as usize].clone())
    }

    pub fn len(&self) -> Result<usize> {
        let ctx = self.context()?;
        let registry = ctx.registry.borrow();
        registry
            .tables
            .get(&self.id)
            .map(Vec::len)
            .ok_or(Error::UseAfterShutdown)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Raw slot handles, still owned by the table.
    pub(crate) fn raw_slots(&self, ctx: &Rc<Shared>) -> Result<Vec<NodeId>> {
        match self.context() {
            Ok(ours) if Rc::ptr_eq(&ours, ctx) => {}
            Ok(_) => return Err(Error::Argument("pairing belongs to a different manager".to_string())),
            Err(e) => return Err(e),
        }
        let registry = ctx.registry.borrow();
        let slots = registry.tables.get(&self.id).ok_or(Error::UseAfterShutdown)?;
        Ok(slots.iter().map(Bdd::id).collect())
    }

    /// Release every slot and unlink the table.
    pub fn free(self) {
        drop(self)
    }
}

impl Drop for Pairing {
    fn drop(&mut self) {
        let Ok(ctx) = self.context() else {
            return;
        };
        let slots = ctx.registry.borrow_mut().tables.remove(&self.id);
        if slots.is_some() {
            debug!("free_pairing: {}", self.id);
        }
        drop(slots);
    }
}

impl fmt::Debug for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pairing").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use test_log::test;

    fn setup(n: u32) -> Manager {
        let mgr = Manager::with_config(&ManagerConfig::default()).unwrap();
        mgr.ensure_variable_count(n).unwrap();
        mgr
    }

    fn literal(mgr: &Manager, var: VarIndex) -> Bdd {
        mgr.ith_variable(var).unwrap().unwrap()
    }

    #[test]
    fn test_allocate_is_identity() {
        let mgr = setup(3);
        let p = mgr.allocate_pairing().unwrap();
        assert_eq!(p.len().unwrap(), 3);
        for var in 0..3 {
            assert_eq!(p.slot(var).unwrap(), literal(&mgr, var));
        }
        assert_eq!(mgr.pairing_count().unwrap(), 1);
    }

    #[test]
    fn test_set_and_reset() {
        let mgr = setup(3);
        let p = mgr.allocate_pairing().unwrap();

        p.set_variable(2, 0).unwrap();
        assert_eq!(p.slot(2).unwrap(), literal(&mgr, 0));

        let f = mgr.and(&literal(&mgr, 0), &literal(&mgr, 1)).unwrap();
        p.set_node(1, &f).unwrap();
        assert_eq!(p.slot(1).unwrap(), f);

        p.reset().unwrap();
        let fresh = mgr.allocate_pairing().unwrap();
        for var in 0..3 {
            assert_eq!(p.slot(var).unwrap(), fresh.slot(var).unwrap());
        }
    }

    #[test]
    fn test_batch_length_mismatch_changes_nothing() {
        let mgr = setup(3);
        let p = mgr.allocate_pairing().unwrap();
        assert!(matches!(p.set_variables(&[0, 1], &[2]), Err(Error::Argument(_))));
        assert!(matches!(p.set_variables(&[0, 5], &[1, 1]), Err(Error::Argument(_))));
        let node = literal(&mgr, 2);
        assert!(matches!(p.set_nodes(&[0, 1], &[node]), Err(Error::Argument(_))));
        for var in 0..3 {
            assert_eq!(p.slot(var).unwrap(), literal(&mgr, var));
        }
        assert!(matches!(p.slot(3), Err(Error::Argument(_))));
    }

    #[test]
    fn test_growth_extends_tables() {
        let mgr = setup(2);
        let p = mgr.allocate_pairing().unwrap();
        p.set_variable(0, 1).unwrap();

        mgr.ensure_variable_count(4).unwrap();
        assert_eq!(p.len().unwrap(), 4);
        assert_eq!(p.slot(0).unwrap(), literal(&mgr, 1));
        assert_eq!(p.slot(2).unwrap(), literal(&mgr, 2));
        assert_eq!(p.slot(3).unwrap(), literal(&mgr, 3));
    }

    #[test]
    fn test_free_releases_slots() {
        let mgr = setup(2);
        let base = mgr.node_count().unwrap();
        let p = mgr.allocate_pairing().unwrap();
        let f = mgr.or(&literal(&mgr, 0), &literal(&mgr, 1)).unwrap();
        p.set_node(0, &f).unwrap();
        drop(f);
        assert_eq!(mgr.node_count().unwrap(), base + 1);

        p.free();
        assert_eq!(mgr.pairing_count().unwrap(), 0);
        assert_eq!(mgr.node_count().unwrap(), base);
    }

    #[test]
    fn test_shutdown_releases_tables() {
        let mgr = setup(2);
        let p = mgr.allocate_pairing().unwrap();
        mgr.shutdown().unwrap();
        assert!(matches!(p.len(), Err(Error::UseAfterShutdown)));
        assert!(matches!(p.set_variable(0, 1), Err(Error::UseAfterShutdown)));
        drop(p);
    }

    #[test]
    fn test_pairing_id() {
        let mgr = setup(1);
        let p = mgr.allocate_pairing().unwrap();
        let q = mgr.allocate_pairing().unwrap();
        assert_ne!(p.id(), q.id());
        assert_eq!(PairingId::from_raw(p.id().raw()), Some(p.id()));
        assert_eq!(PairingId::from_raw(0), None);
    }
}
