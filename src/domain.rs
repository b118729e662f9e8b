//! Variable domain: growth, level mapping and reordering control.

use std::fmt;

use bdd_engine::{Engine, ReorderingType, VarIndex, MAX_INDEX};
use log::debug;

use crate::error::{Error, Result};
use crate::handle::Bdd;
use crate::manager::Manager;

/// Reordering strategy, as numbered by host bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReorderMethod {
    None,
    Window2,
    Window2Conv,
    Sift,
    SiftConverge,
    Window3,
    Window3Conv,
    Random,
}

/// Host code, method and engine type, one row per method.
const TABLE: [(u32, ReorderMethod, ReorderingType); 8] = [
    (0, ReorderMethod::None, ReorderingType::None),
    (1, ReorderMethod::Window2, ReorderingType::Window2),
    (2, ReorderMethod::Window2Conv, ReorderingType::Window2Conv),
    (3, ReorderMethod::Sift, ReorderingType::Sift),
    (4, ReorderMethod::SiftConverge, ReorderingType::SiftConverge),
    (5, ReorderMethod::Window3, ReorderingType::Window3),
    (6, ReorderMethod::Window3Conv, ReorderingType::Window3Conv),
    (7, ReorderMethod::Random, ReorderingType::Random),
];

impl ReorderMethod {
    pub const ALL: [ReorderMethod; 8] = [
        ReorderMethod::None,
        ReorderMethod::Window2,
        ReorderMethod::Window2Conv,
        ReorderMethod::Sift,
        ReorderMethod::SiftConverge,
        ReorderMethod::Window3,
        ReorderMethod::Window3Conv,
        ReorderMethod::Random,
    ];

    fn row(self) -> (u32, ReorderMethod, ReorderingType) {
        // Every method has exactly one row.
        TABLE[self as usize]
    }

    pub fn from_code(code: u32) -> Result<Self> {
        TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|&(_, m, _)| m)
            .ok_or_else(|| Error::Configuration(format!("unknown reorder method code {}", code)))
    }

    pub fn code(self) -> u32 {
        self.row().0
    }

    pub fn to_engine(self) -> ReorderingType {
        self.row().2
    }

    pub fn from_engine(t: ReorderingType) -> Result<Self> {
        TABLE
            .iter()
            .find(|(_, _, e)| *e == t)
            .map(|&(_, m, _)| m)
            .ok_or_else(|| Error::Configuration(format!("engine reorder method {} has no host code", t)))
    }

    /// Translate a numeric engine code.
    pub fn from_engine_code(code: u32) -> Result<Self> {
        let t = ReorderingType::from_code(code)
            .ok_or_else(|| Error::Configuration(format!("unknown engine reorder code {}", code)))?;
        Self::from_engine(t)
    }
}

impl fmt::Display for ReorderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReorderMethod::None => "NONE",
            ReorderMethod::Window2 => "WIN2",
            ReorderMethod::Window2Conv => "WIN2ITE",
            ReorderMethod::Sift => "SIFT",
            ReorderMethod::SiftConverge => "SIFTITE",
            ReorderMethod::Window3 => "WIN3",
            ReorderMethod::Window3Conv => "WIN3ITE",
            ReorderMethod::Random => "RANDOM",
        };
        write!(f, "{}", name)
    }
}

impl Manager {
    pub fn variable_count(&self) -> Result<u32> {
        Ok(self.context()?.var_count.get())
    }

    /// Grow the domain to `n` variables and return the previous count.
    ///
    /// Every registered pairing table gains identity entries for the new
    /// variables before the new count is published. Shrinking is an error.
    pub fn ensure_variable_count(&self, n: u32) -> Result<u32> {
        let ctx = self.context()?;
        let old = ctx.var_count.get();
        if n < old {
            return Err(Error::Argument(format!(
                "cannot shrink the variable count from {} to {}",
                old, n
            )));
        }
        if n >= MAX_INDEX {
            return Err(Error::Argument(format!(
                "variable count {} exceeds the engine limit {}",
                n, MAX_INDEX
            )));
        }
        if n == old {
            return Ok(old);
        }
        debug!("ensure_variable_count: {} -> {}", old, n);

        // A previous failed attempt may have left engine variables behind; reuse them.
        ctx.with_engine(|engine| -> Result<()> {
            while engine.var_count() < n {
                engine.new_var()?;
            }
            Ok(())
        })??;

        let literals = (old..n).map(|i| ctx.literal(i)).collect::<Result<Vec<Bdd>>>()?;
        ctx.registry.borrow_mut().extend_all(&literals);
        ctx.var_count.set(n);
        Ok(old)
    }

    /// Literal of variable `i`.
    ///
    /// `Ok(None)` when `i` is beyond anything the engine can represent,
    /// [`Error::Argument`] when the variable is representable but not created yet.
    pub fn ith_variable(&self, i: u32) -> Result<Option<Bdd>> {
        let ctx = self.context()?;
        if i >= MAX_INDEX - 1 {
            return Ok(None);
        }
        self.check_variable(i)?;
        Ok(Some(ctx.literal(i)?))
    }

    /// Negative literal of variable `i`.
    pub fn nith_variable(&self, i: u32) -> Result<Option<Bdd>> {
        self.ith_variable(i)?.map(|lit| lit.not()).transpose()
    }

    /// Variable at `level` of the visible order.
    pub fn level_to_variable(&self, level: u32) -> Result<VarIndex> {
        let ctx = self.context()?;
        let count = ctx.var_count.get();
        if level >= count {
            return Err(Error::Argument(format!("level {} out of range", level)));
        }
        ctx.with_engine(|engine| visible_order(engine, count).get(level as usize).copied())?
            .ok_or_else(|| Error::Argument(format!("level {} out of range", level)))
    }

    /// Level of `var` in the visible order.
    pub fn variable_to_level(&self, var: VarIndex) -> Result<u32> {
        let ctx = self.context()?;
        self.check_variable(var)?;
        let count = ctx.var_count.get();
        ctx.with_engine(|engine| visible_level(engine, count, var))?
            .ok_or_else(|| Error::Argument(format!("variable {} out of range", var)))
    }

    /// Reorder now with `method`.
    pub fn reorder(&self, method: ReorderMethod) -> Result<()> {
        debug!("reorder({})", method);
        self.context()?
            .with_engine(|engine| engine.reduce_heap(method.to_engine()))??;
        Ok(())
    }

    /// `NONE` disables automatic reordering, any other method enables it.
    pub fn set_auto_reorder(&self, method: ReorderMethod) -> Result<()> {
        debug!("set_auto_reorder({})", method);
        self.context()?.with_engine(|engine| match method {
            ReorderMethod::None => engine.autodyn_disable(),
            m => engine.autodyn_enable(m.to_engine()),
        })
    }

    pub fn auto_reorder_method(&self) -> Result<ReorderMethod> {
        match self.context()?.with_engine(|engine| engine.autodyn_status())? {
            None => Ok(ReorderMethod::None),
            Some(t) => ReorderMethod::from_engine(t),
        }
    }

    /// Adopt the order where `order[level]` is the variable at `level`.
    pub fn set_variable_order(&self, order: &[VarIndex]) -> Result<()> {
        let ctx = self.context()?;
        let n = ctx.var_count.get() as usize;
        if order.len() != n {
            return Err(Error::Argument(format!(
                "variable order has {} entries, expected {}",
                order.len(),
                n
            )));
        }
        let mut seen = vec![false; n];
        for &v in order {
            match seen.get_mut(v as usize) {
                Some(s) if !*s => *s = true,
                _ => return Err(Error::Argument(format!("variable order is not a permutation (at {})", v))),
            }
        }
        ctx.with_engine(|engine| {
            // Leftovers of a failed growth keep their relative order below the visible ones.
            let mut full = order.to_vec();
            full.extend(engine_order(engine).filter(|&v| v as usize >= n));
            engine.shuffle_heap(&full)
        })??;
        Ok(())
    }

    /// Keep variables `first` through `last` of the current order on adjacent
    /// levels during reordering. A `fixed` block keeps its levels and its
    /// internal order.
    ///
    /// `first` must not sit below `last`. Blocks may nest but must not
    /// partially overlap.
    pub fn add_variable_block(&self, first: VarIndex, last: VarIndex, fixed: bool) -> Result<()> {
        let ctx = self.context()?;
        self.check_variable(first)?;
        self.check_variable(last)?;
        let count = ctx.var_count.get();
        ctx.with_engine(|engine| -> Result<()> {
            let (top, bottom) = (visible_level(engine, count, first), visible_level(engine, count, last));
            if top > bottom {
                return Err(Error::Argument(format!(
                    "bad indexes in variable block: {} is below {}",
                    first, last
                )));
            }
            Ok(engine.add_var_block(first, last, fixed)?)
        })?
    }

    /// Drop every variable block.
    pub fn clear_variable_blocks(&self) -> Result<()> {
        debug!("clear_variable_blocks");
        self.context()?.with_engine(|engine| engine.clear_var_blocks())
    }

    pub(crate) fn check_variable(&self, var: VarIndex) -> Result<()> {
        let count = self.variable_count()?;
        if var < count {
            Ok(())
        } else {
            Err(Error::Argument(format!("variable {} out of range (have {})", var, count)))
        }
    }
}

/// Engine variables from the top level down.
fn engine_order(engine: &dyn Engine) -> impl Iterator<Item = VarIndex> + '_ {
    (0..engine.var_count()).filter_map(move |level| engine.inv_perm(level))
}

/// The first `count` variables from the top level down. Engine variables left
/// over from a failed growth are skipped wherever reordering put them.
fn visible_order(engine: &dyn Engine, count: u32) -> Vec<VarIndex> {
    engine_order(engine).filter(|&v| v < count).collect()
}

/// Level of `var` once the hidden engine variables are skipped.
pub(crate) fn visible_level(engine: &dyn Engine, count: u32, var: VarIndex) -> Option<u32> {
    let level = engine.perm(var)?;
    if engine.var_count() == count {
        return Some(level);
    }
    Some(engine_order(engine).take(level as usize).filter(|&v| v < count).count() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use bdd_engine::Heap;
    use test_log::test;

    #[test]
    fn test_code_round_trip() {
        for code in 0..8 {
            let method = ReorderMethod::from_code(code).unwrap();
            assert_eq!(method.code(), code);
            assert_eq!(ReorderMethod::from_engine(method.to_engine()).unwrap(), method);
        }
    }

    #[test]
    fn test_host_numbering() {
        assert_eq!(ReorderMethod::from_code(0).unwrap(), ReorderMethod::None);
        assert_eq!(ReorderMethod::from_code(3).unwrap(), ReorderMethod::Sift);
        assert_eq!(ReorderMethod::from_code(7).unwrap(), ReorderMethod::Random);
        assert_eq!(ReorderMethod::Window3Conv.to_string(), "WIN3ITE");
    }

    #[test]
    fn test_unknown_codes() {
        assert!(matches!(ReorderMethod::from_code(8), Err(Error::Configuration(_))));
        assert!(matches!(ReorderMethod::from_code(u32::MAX), Err(Error::Configuration(_))));
        assert!(matches!(
            ReorderMethod::from_engine(ReorderingType::RandomPivot),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(ReorderMethod::from_engine_code(6), Err(Error::Configuration(_))));
        assert_eq!(ReorderMethod::from_engine_code(4).unwrap(), ReorderMethod::Sift);
    }

    #[test]
    fn test_table_rows_match_discriminants() {
        for method in ReorderMethod::ALL {
            assert_eq!(method.row().1, method);
        }
    }

    #[test]
    fn test_growth() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        assert_eq!(mgr.ensure_variable_count(4).unwrap(), 0);
        assert_eq!(mgr.variable_count().unwrap(), 4);
        assert_eq!(mgr.ensure_variable_count(4).unwrap(), 4);

        assert!(matches!(mgr.ensure_variable_count(2), Err(Error::Argument(_))));
        assert_eq!(mgr.variable_count().unwrap(), 4);
        assert!(matches!(mgr.ensure_variable_count(MAX_INDEX), Err(Error::Argument(_))));
        assert_eq!(mgr.variable_count().unwrap(), 4);
    }

    #[test]
    fn test_ith_variable_bounds() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        mgr.ensure_variable_count(2).unwrap();

        let v1 = mgr.ith_variable(1).unwrap().unwrap();
        assert_eq!(v1.var().unwrap(), Some(1));
        assert!(matches!(mgr.ith_variable(2), Err(Error::Argument(_))));
        assert!(mgr.ith_variable(MAX_INDEX).unwrap().is_none());

        let n1 = mgr.nith_variable(1).unwrap().unwrap();
        assert_eq!(n1, v1.not().unwrap());
    }

    #[test]
    fn test_level_mapping() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        mgr.ensure_variable_count(3).unwrap();
        for i in 0..3 {
            assert_eq!(mgr.variable_to_level(i).unwrap(), i);
            assert_eq!(mgr.level_to_variable(i).unwrap(), i);
        }
        assert!(matches!(mgr.variable_to_level(3), Err(Error::Argument(_))));
        assert!(matches!(mgr.level_to_variable(3), Err(Error::Argument(_))));
    }

    #[test]
    fn test_set_variable_order() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        mgr.ensure_variable_count(3).unwrap();

        mgr.set_variable_order(&[2, 0, 1]).unwrap();
        assert_eq!(mgr.level_to_variable(0).unwrap(), 2);
        assert_eq!(mgr.variable_to_level(0).unwrap(), 1);

        assert!(matches!(mgr.set_variable_order(&[0, 1]), Err(Error::Argument(_))));
        assert!(matches!(mgr.set_variable_order(&[0, 0, 1]), Err(Error::Argument(_))));
        assert!(matches!(mgr.set_variable_order(&[0, 1, 5]), Err(Error::Argument(_))));
    }

    #[test]
    fn test_order_after_failed_growth() {
        let config = ManagerConfig::builder().max_nodes(4).build();
        let mgr = Manager::with_config(&config).unwrap();
        mgr.ensure_variable_count(2).unwrap();
        assert!(mgr.ensure_variable_count(10).is_err());
        assert_eq!(mgr.variable_count().unwrap(), 2);

        mgr.set_variable_order(&[1, 0]).unwrap();
        assert_eq!(mgr.level_to_variable(0).unwrap(), 1);
        assert_eq!(mgr.level_to_variable(1).unwrap(), 0);
        assert_eq!(mgr.variable_to_level(0).unwrap(), 1);
        assert!(matches!(mgr.level_to_variable(2), Err(Error::Argument(_))));
        assert!(matches!(mgr.set_variable_order(&[1, 0, 2, 3]), Err(Error::Argument(_))));

        let x0 = mgr.ith_variable(0).unwrap().unwrap();
        assert_eq!(x0.level().unwrap(), Some(1));
    }

    #[test]
    fn test_visible_levels_skip_hidden_variables() {
        let mut heap = Heap::default();
        for _ in 0..4 {
            heap.new_var().unwrap();
        }
        heap.shuffle_heap(&[2, 0, 3, 1]).unwrap();

        assert_eq!(visible_order(&heap, 2), vec![0, 1]);
        assert_eq!(visible_level(&heap, 2, 0), Some(0));
        assert_eq!(visible_level(&heap, 2, 1), Some(1));
        assert_eq!(visible_level(&heap, 4, 1), Some(3));
        assert_eq!(visible_order(&heap, 4), vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_variable_blocks() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        mgr.ensure_variable_count(6).unwrap();
        let v: Vec<_> = (0..6).map(|i| mgr.ith_variable(i).unwrap().unwrap()).collect();
        let pairs: Vec<_> = (0..3).map(|i| mgr.and(&v[i], &v[i + 3]).unwrap()).collect();
        let f = mgr.or_many(&pairs).unwrap();
        let minterms = f.sat_count().unwrap();

        assert!(matches!(mgr.add_variable_block(0, 6, false), Err(Error::Argument(_))));
        assert!(matches!(mgr.add_variable_block(3, 1, false), Err(Error::Argument(_))));
        mgr.add_variable_block(0, 2, true).unwrap();
        mgr.add_variable_block(3, 4, false).unwrap();
        assert!(matches!(mgr.add_variable_block(2, 3, false), Err(Error::Argument(_))));

        mgr.reorder(ReorderMethod::Sift).unwrap();
        for i in 0..3 {
            assert_eq!(mgr.variable_to_level(i).unwrap(), i);
        }
        let (l3, l4) = (mgr.variable_to_level(3).unwrap(), mgr.variable_to_level(4).unwrap());
        assert_eq!(l3.abs_diff(l4), 1);
        assert_eq!(f.sat_count().unwrap(), minterms);

        // A fixed block also pins the explicit order.
        assert!(matches!(mgr.set_variable_order(&[1, 0, 2, 3, 4, 5]), Err(Error::Argument(_))));
        mgr.clear_variable_blocks().unwrap();
        mgr.set_variable_order(&[1, 0, 2, 3, 4, 5]).unwrap();
        assert_eq!(mgr.level_to_variable(0).unwrap(), 1);
    }

    #[test]
    fn test_auto_reorder_round_trip() {
        let mgr = Manager::with_config(&Default::default()).unwrap();
        assert_eq!(mgr.auto_reorder_method().unwrap(), ReorderMethod::None);
        mgr.set_auto_reorder(ReorderMethod::SiftConverge).unwrap();
        assert_eq!(mgr.auto_reorder_method().unwrap(), ReorderMethod::SiftConverge);
        mgr.set_auto_reorder(ReorderMethod::None).unwrap();
        assert_eq!(mgr.auto_reorder_method().unwrap(), ReorderMethod::None);
    }
}
