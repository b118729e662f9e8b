//! Boolean operation dispatch.

use std::fmt;
use std::rc::Rc;

use bdd_engine::VarIndex;
use log::debug;

use crate::error::{Error, Result};
use crate::handle::Bdd;
use crate::manager::{Manager, Shared};
use crate::pairing::Pairing;

/// Binary operator, as numbered by host bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BddOp {
    And,
    Xor,
    Or,
    Nand,
    Nor,
    /// `¬l ∨ r`
    Imp,
    /// `l ↔ r`
    Biimp,
    /// `l ∧ ¬r`
    Diff,
    /// `¬l ∧ r`
    Less,
    /// `l ∨ ¬r`
    InvImp,
}

impl BddOp {
    pub const ALL: [BddOp; 10] = [
        BddOp::And,
        BddOp::Xor,
        BddOp::Or,
        BddOp::Nand,
        BddOp::Nor,
        BddOp::Imp,
        BddOp::Biimp,
        BddOp::Diff,
        BddOp::Less,
        BddOp::InvImp,
    ];

    pub fn from_code(code: u32) -> Result<Self> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| Error::Configuration(format!("operation not supported: {}", code)))
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Truth value for constant operands.
    pub fn eval(self, l: bool, r: bool) -> bool {
        match self {
            BddOp::And => l && r,
            BddOp::Xor => l != r,
            BddOp::Or => l || r,
            BddOp::Nand => !(l && r),
            BddOp::Nor => !(l || r),
            BddOp::Imp => !l || r,
            BddOp::Biimp => l == r,
            BddOp::Diff => l && !r,
            BddOp::Less => !l && r,
            BddOp::InvImp => l || !r,
        }
    }
}

impl fmt::Display for BddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BddOp::And => "and",
            BddOp::Xor => "xor",
            BddOp::Or => "or",
            BddOp::Nand => "nand",
            BddOp::Nor => "nor",
            BddOp::Imp => "imp",
            BddOp::Biimp => "biimp",
            BddOp::Diff => "diff",
            BddOp::Less => "less",
            BddOp::InvImp => "invimp",
        };
        write!(f, "{}", name)
    }
}

impl Manager {
    /// Context shared by the manager and every operand.
    pub(crate) fn operands(&self, nodes: &[&Bdd]) -> Result<Rc<Shared>> {
        let ctx = self.context()?;
        for node in nodes {
            if !Rc::ptr_eq(ctx, &node.context()?) {
                return Err(Error::Argument("operand belongs to a different manager".to_string()));
            }
        }
        Ok(Rc::clone(ctx))
    }

    pub fn apply(&self, left: &Bdd, right: &Bdd, op: BddOp) -> Result<Bdd> {
        debug!("apply({:?}, {:?}, {})", left, right, op);
        let ctx = self.operands(&[left, right])?;
        let (l, r) = (left.id(), right.id());
        match op {
            BddOp::And => ctx.produce(|e| Ok(e.and(l, r)?)),
            BddOp::Xor => ctx.produce(|e| Ok(e.xor(l, r)?)),
            BddOp::Or => ctx.produce(|e| Ok(e.or(l, r)?)),
            BddOp::Nand => ctx.produce(|e| Ok(e.nand(l, r)?)),
            BddOp::Nor => ctx.produce(|e| Ok(e.nor(l, r)?)),
            BddOp::Biimp => ctx.produce(|e| Ok(e.xnor(l, r)?)),
            BddOp::Imp => {
                let nl = left.not()?;
                ctx.produce(|e| Ok(e.or(nl.id(), r)?))
            }
            BddOp::Diff => {
                let nr = right.not()?;
                ctx.produce(|e| Ok(e.and(l, nr.id())?))
            }
            BddOp::Less => {
                let nl = left.not()?;
                ctx.produce(|e| Ok(e.and(nl.id(), r)?))
            }
            BddOp::InvImp => {
                let nr = right.not()?;
                ctx.produce(|e| Ok(e.or(l, nr.id())?))
            }
        }
    }

    /// [`apply`][Manager::apply] with a host operator code.
    pub fn apply_code(&self, left: &Bdd, right: &Bdd, code: u32) -> Result<Bdd> {
        self.apply(left, right, BddOp::from_code(code)?)
    }

    pub fn and(&self, left: &Bdd, right: &Bdd) -> Result<Bdd> {
        self.apply(left, right, BddOp::And)
    }

    pub fn or(&self, left: &Bdd, right: &Bdd) -> Result<Bdd> {
        self.apply(left, right, BddOp::Or)
    }

    pub fn xor(&self, left: &Bdd, right: &Bdd) -> Result<Bdd> {
        self.apply(left, right, BddOp::Xor)
    }

    pub fn imp(&self, left: &Bdd, right: &Bdd) -> Result<Bdd> {
        self.apply(left, right, BddOp::Imp)
    }

    pub fn biimp(&self, left: &Bdd, right: &Bdd) -> Result<Bdd> {
        self.apply(left, right, BddOp::Biimp)
    }

    /// Conjunction of all `nodes`; `one` when empty.
    pub fn and_many<'a>(&self, nodes: impl IntoIterator<Item = &'a Bdd>) -> Result<Bdd> {
        nodes.into_iter().try_fold(self.one()?, |acc, node| self.and(&acc, node))
    }

    /// Disjunction of all `nodes`; `zero` when empty.
    pub fn or_many<'a>(&self, nodes: impl IntoIterator<Item = &'a Bdd>) -> Result<Bdd> {
        nodes.into_iter().try_fold(self.zero()?, |acc, node| self.or(&acc, node))
    }

    /// Positive cube of `vars`.
    pub fn cube(&self, vars: impl IntoIterator<Item = VarIndex>) -> Result<Bdd> {
        let mut acc = self.one()?;
        for var in vars {
            self.check_variable(var)?;
            let lit = self.context()?.literal(var)?;
            acc = self.and(&acc, &lit)?;
        }
        Ok(acc)
    }

    /// `if cond then t else e`.
    pub fn ite(&self, cond: &Bdd, t: &Bdd, e: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[cond, t, e])?;
        let (f, g, h) = (cond.id(), t.id(), e.id());
        ctx.produce(|engine| Ok(engine.ite(f, g, h)?))
    }

    /// `f` with `var` replaced by `g`.
    pub fn compose(&self, f: &Bdd, g: &Bdd, var: VarIndex) -> Result<Bdd> {
        let ctx = self.operands(&[f, g])?;
        self.check_variable(var)?;
        let (f, g) = (f.id(), g.id());
        ctx.produce(|engine| Ok(engine.compose(f, g, var)?))
    }

    /// `f` with every variable replaced by its slot in `table` at once.
    pub fn vector_compose(&self, f: &Bdd, table: &Pairing) -> Result<Bdd> {
        let ctx = self.operands(&[f])?;
        let vector = table.raw_slots(&ctx)?;
        let f = f.id();
        ctx.produce(|engine| Ok(engine.vector_compose(f, &vector)?))
    }

    /// Rename variables: each slot's top variable is the new name.
    pub fn replace(&self, f: &Bdd, table: &Pairing) -> Result<Bdd> {
        let ctx = self.operands(&[f])?;
        let slots = table.raw_slots(&ctx)?;
        let permutation = ctx.with_engine(|engine| {
            slots
                .iter()
                .enumerate()
                .map(|(var, &slot)| {
                    engine
                        .node_index(slot)
                        .ok_or_else(|| Error::Argument(format!("slot {} of {} is a constant", var, table.id())))
                })
                .collect::<Result<Vec<_>>>()
        })??;
        let f = f.id();
        ctx.produce(|engine| Ok(engine.permute(f, &permutation)?))
    }

    /// Generalized cofactor of `f` with respect to the care set `care`.
    pub fn restrict(&self, f: &Bdd, care: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f, care])?;
        let (f, c) = (f.id(), care.id());
        ctx.produce(|engine| Ok(engine.restrict(f, c)?))
    }

    /// Positive cube of the variables `f` depends on.
    pub fn support(&self, f: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f])?;
        let f = f.id();
        ctx.produce(|engine| Ok(engine.support(f)?))
    }

    /// `∃ cube. f`
    pub fn exist_abstract(&self, f: &Bdd, cube: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f, cube])?;
        let (f, c) = (f.id(), cube.id());
        ctx.produce(|engine| Ok(engine.exist_abstract(f, c)?))
    }

    /// `∀ cube. f`
    pub fn for_all_abstract(&self, f: &Bdd, cube: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f, cube])?;
        let (f, c) = (f.id(), cube.id());
        ctx.produce(|engine| Ok(engine.univ_abstract(f, c)?))
    }

    /// Relational product `∃ cube. f ∧ g`.
    pub fn and_abstract(&self, f: &Bdd, g: &Bdd, cube: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f, g, cube])?;
        let (f, g, c) = (f.id(), g.id(), cube.id());
        ctx.produce(|engine| Ok(engine.and_abstract(f, g, c)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use num_bigint::BigUint;
    use test_log::test;

    fn setup(n: u32) -> (Manager, Vec<Bdd>) {
        let mgr = Manager::with_config(&ManagerConfig::default()).unwrap();
        mgr.ensure_variable_count(n).unwrap();
        let vars = (0..n).map(|i| mgr.ith_variable(i).unwrap().unwrap()).collect();
        (mgr, vars)
    }

    #[test]
    fn test_op_codes() {
        for (code, op) in BddOp::ALL.iter().enumerate() {
            assert_eq!(BddOp::from_code(code as u32).unwrap(), *op);
            assert_eq!(op.code(), code as u32);
        }
        assert!(matches!(BddOp::from_code(10), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_constant_truth_tables() {
        let (mgr, _) = setup(0);
        let one = mgr.one().unwrap();
        let zero = mgr.zero().unwrap();
        for op in BddOp::ALL {
            for (l, lb) in [(&zero, false), (&one, true)] {
                for (r, rb) in [(&zero, false), (&one, true)] {
                    let res = mgr.apply(l, r, op).unwrap();
                    assert_eq!(res.is_one().unwrap(), op.eval(lb, rb), "{} {} {}", lb, op, rb);
                }
            }
        }
    }

    #[test]
    fn test_derived_operators() {
        let (mgr, v) = setup(2);
        let (x, y) = (&v[0], &v[1]);
        let nx = x.not().unwrap();
        let ny = y.not().unwrap();

        assert_eq!(mgr.apply(x, y, BddOp::Imp).unwrap(), mgr.or(&nx, y).unwrap());
        assert_eq!(mgr.apply(x, y, BddOp::Diff).unwrap(), mgr.and(x, &ny).unwrap());
        assert_eq!(mgr.apply(x, y, BddOp::Less).unwrap(), mgr.and(&nx, y).unwrap());
        assert_eq!(mgr.apply(x, y, BddOp::InvImp).unwrap(), mgr.or(x, &ny).unwrap());
        assert_eq!(
            mgr.apply(x, y, BddOp::Biimp).unwrap(),
            mgr.xor(x, y).unwrap().not().unwrap()
        );
        // De Morgan
        assert_eq!(
            mgr.apply(x, y, BddOp::Nand).unwrap(),
            mgr.or(&nx, &ny).unwrap()
        );
        assert_eq!(
            mgr.apply(x, y, BddOp::Nor).unwrap(),
            mgr.and(&nx, &ny).unwrap()
        );
    }

    #[test]
    fn test_apply_code_unsupported_keeps_counts() {
        let (mgr, v) = setup(2);
        let f = mgr.and(&v[0], &v[1]).unwrap();
        let before = mgr.node_count().unwrap();
        let err = mgr.apply_code(&f, &v[1], 42).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("operation not supported")));
        assert_eq!(mgr.node_count().unwrap(), before);
        drop(f);
        assert_eq!(mgr.node_count().unwrap(), before - 1);
    }

    #[test]
    fn test_ite_and_compose() {
        let (mgr, v) = setup(3);
        let f = mgr.ite(&v[0], &v[1], &v[2]).unwrap();
        let expected = mgr
            .or(&mgr.and(&v[0], &v[1]).unwrap(), &mgr.and(&v[0].not().unwrap(), &v[2]).unwrap())
            .unwrap();
        assert_eq!(f, expected);

        // x0 := x1 gives x1 ? x1 : x2 = x1 ∨ x2
        let g = mgr.compose(&f, &v[1], 0).unwrap();
        assert_eq!(g, mgr.or(&v[1], &v[2]).unwrap());
        assert!(matches!(mgr.compose(&f, &v[1], 3), Err(Error::Argument(_))));
    }

    #[test]
    fn test_vector_compose_and_replace() {
        let (mgr, v) = setup(4);
        let f = mgr.and(&v[2], &v[3]).unwrap();
        let table = mgr.allocate_pairing().unwrap();
        table.set_variable(2, 0).unwrap();
        table.set_variable(3, 1).unwrap();

        let expected = mgr.and(&v[0], &v[1]).unwrap();
        assert_eq!(mgr.vector_compose(&f, &table).unwrap(), expected);
        assert_eq!(mgr.replace(&f, &table).unwrap(), expected);

        table.set_node(0, &mgr.one().unwrap()).unwrap();
        assert!(matches!(mgr.replace(&f, &table), Err(Error::Argument(_))));
    }

    #[test]
    fn test_restrict_and_support() {
        let (mgr, v) = setup(3);
        let f = mgr.or(&mgr.and(&v[0], &v[1]).unwrap(), &v[2]).unwrap();
        assert_eq!(mgr.support(&f).unwrap(), mgr.cube([0, 1, 2]).unwrap());

        let r = mgr.restrict(&f, &v[0]).unwrap();
        assert_eq!(r, mgr.or(&v[1], &v[2]).unwrap());
        let r = mgr.restrict(&f, &v[2]).unwrap();
        assert!(r.is_one().unwrap());
    }

    #[test]
    fn test_quantifiers() {
        let (mgr, v) = setup(3);
        let f = mgr.and(&v[0], &v[1]).unwrap();
        let c = mgr.cube([0]).unwrap();

        assert_eq!(mgr.exist_abstract(&f, &c).unwrap(), v[1]);
        assert!(mgr.for_all_abstract(&f, &c).unwrap().is_zero().unwrap());

        let g = mgr.or(&v[0].not().unwrap(), &v[2]).unwrap();
        // ∃x0. x0 ∧ x1 ∧ (¬x0 ∨ x2) = x1 ∧ x2
        assert_eq!(mgr.and_abstract(&f, &g, &c).unwrap(), mgr.and(&v[1], &v[2]).unwrap());
    }

    #[test]
    fn test_many() {
        let (mgr, v) = setup(3);
        assert!(mgr.and_many([]).unwrap().is_one().unwrap());
        assert!(mgr.or_many([]).unwrap().is_zero().unwrap());
        assert_eq!(mgr.and_many(&v).unwrap(), mgr.cube([0, 1, 2]).unwrap());
        assert_eq!(mgr.or_many(&v).unwrap().sat_count().unwrap(), BigUint::from(7u32));
    }
}
