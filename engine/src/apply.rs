//! ITE and the operations built on it.
//!
//! Recursive steps keep every intermediate result referenced while the next
//! one is computed, so that a garbage collection triggered deeper down cannot
//! free it, and release those references on every exit path.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::cache::OpKey;
use crate::error::{EngineError, Result};
use crate::heap::{Heap, ONE, ZERO};
use crate::node_id::VarIndex;
use crate::reference::Ref;

impl Heap {
    pub(crate) fn ite_rec(&mut self, f: Ref, g: Ref, h: Ref) -> Result<Ref> {
        // Terminal cases
        if f == ONE {
            return Ok(g);
        }
        if f == ZERO {
            return Ok(h);
        }

        let (mut f, mut g, mut h) = (f, g, h);
        if g == f {
            g = ONE;
        } else if g == -f {
            g = ZERO;
        }
        if h == f {
            h = ZERO;
        } else if h == -f {
            h = ONE;
        }
        if g == h {
            return Ok(g);
        }
        if g == ONE && h == ZERO {
            return Ok(f);
        }
        if g == ZERO && h == ONE {
            return Ok(-f);
        }

        // Standard triples: regular condition, regular then-branch.
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let negate = g.is_negated();
        if negate {
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res.negate_if(negate));
        }

        let level = self.level(f).min(self.level(g)).min(self.level(h));
        let var = self.subtables[level as usize].variable;
        let (f0, f1) = self.cofactors(f, level);
        let (g0, g1) = self.cofactors(g, level);
        let (h0, h1) = self.cofactors(h, level);

        let t = self.ite_rec(f1, g1, h1)?;
        self.inc(t);
        let e = self.ite_rec(f0, g0, h0).inspect_err(|_| self.dec(t))?;
        self.inc(e);
        let res = self.join(var, t, e)?;

        self.cache.insert(key, res);
        Ok(res.negate_if(negate))
    }

    /// Build `var ? t : e` from two referenced operands and release them.
    pub(crate) fn join(&mut self, var: VarIndex, t: Ref, e: Ref) -> Result<Ref> {
        let res = self.mk(var, e, t);
        self.dec(t);
        self.dec(e);
        res
    }

    /// Disjunction of two referenced operands, releasing them.
    pub(crate) fn join_or(&mut self, t: Ref, e: Ref) -> Result<Ref> {
        let res = self.ite_rec(t, ONE, e);
        self.dec(t);
        self.dec(e);
        res
    }

    /// `ite(x, t, e)` over two referenced operands, releasing them.
    fn join_ite(&mut self, x: Ref, t: Ref, e: Ref) -> Result<Ref> {
        let res = self.ite_rec(x, t, e);
        self.dec(t);
        self.dec(e);
        res
    }

    pub(crate) fn and_rec(&mut self, f: Ref, g: Ref) -> Result<Ref> {
        self.ite_rec(f, g, ZERO)
    }

    pub(crate) fn or_rec(&mut self, f: Ref, g: Ref) -> Result<Ref> {
        self.ite_rec(f, ONE, g)
    }

    pub(crate) fn xor_rec(&mut self, f: Ref, g: Ref) -> Result<Ref> {
        self.ite_rec(f, -g, g)
    }
}

// Substitution.
impl Heap {
    pub(crate) fn compose_top(&mut self, f: Ref, g: Ref, var: VarIndex) -> Result<Ref> {
        debug!("compose(f = {}, g = {}, var = {})", f, g, var);
        let target = self.perm[var as usize];
        let mut memo = HashMap::new();
        let res = self.compose_rec(f, g, target, &mut memo);
        self.release_memo(memo);
        res
    }

    fn compose_rec(&mut self, f: Ref, g: Ref, target: u32, memo: &mut HashMap<Ref, Ref>) -> Result<Ref> {
        let level = self.level(f);
        if level > target {
            return Ok(f);
        }
        let neg = f.is_negated();
        let fr = f.regular();
        if let Some(&res) = memo.get(&fr) {
            return Ok(res.negate_if(neg));
        }

        let (f0, f1) = self.cofactors(fr, level);
        let res = if level == target {
            self.ite_rec(g, f1, f0)?
        } else {
            let x = self.vars[self.node(fr).var as usize];
            let t = self.compose_rec(f1, g, target, memo)?;
            self.inc(t);
            let e = self.compose_rec(f0, g, target, memo).inspect_err(|_| self.dec(t))?;
            self.inc(e);
            self.join_ite(x, t, e)?
        };

        self.inc(res);
        memo.insert(fr, res);
        Ok(res.negate_if(neg))
    }

    /// Simultaneous substitution; `vector[v]` replaces variable `v`.
    pub(crate) fn vector_compose_top(&mut self, f: Ref, vector: &[Ref]) -> Result<Ref> {
        // Nothing below the deepest substituted level changes.
        let deepest = vector
            .iter()
            .enumerate()
            .filter(|&(v, &r)| self.vars.get(v) != Some(&r))
            .map(|(v, _)| self.perm[v])
            .max();
        let Some(deepest) = deepest else {
            return Ok(f);
        };

        let mut memo = HashMap::new();
        let res = self.vector_compose_rec(f, vector, deepest, &mut memo);
        self.release_memo(memo);
        res
    }

    fn vector_compose_rec(
        &mut self,
        f: Ref,
        vector: &[Ref],
        deepest: u32,
        memo: &mut HashMap<Ref, Ref>,
    ) -> Result<Ref> {
        let level = self.level(f);
        if level > deepest {
            return Ok(f);
        }
        let neg = f.is_negated();
        let fr = f.regular();
        if let Some(&res) = memo.get(&fr) {
            return Ok(res.negate_if(neg));
        }

        let node = *self.node(fr);
        let t = self.vector_compose_rec(node.high, vector, deepest, memo)?;
        self.inc(t);
        let e = self
            .vector_compose_rec(node.low, vector, deepest, memo)
            .inspect_err(|_| self.dec(t))?;
        self.inc(e);
        let x = vector
            .get(node.var as usize)
            .copied()
            .unwrap_or(self.vars[node.var as usize]);
        let res = self.join_ite(x, t, e)?;

        self.inc(res);
        memo.insert(fr, res);
        Ok(res.negate_if(neg))
    }

    fn release_memo(&mut self, memo: HashMap<Ref, Ref>) {
        for res in memo.into_values() {
            self.dec(res);
        }
    }

    pub(crate) fn permutation_vector(&self, permutation: &[VarIndex]) -> Result<Vec<Ref>> {
        permutation
            .iter()
            .map(|&target| {
                self.check_var(target)?;
                Ok(self.vars[target as usize])
            })
            .collect()
    }
}

// Generalized cofactor and support.
impl Heap {
    pub(crate) fn restrict_rec(&mut self, f: Ref, c: Ref) -> Result<Ref> {
        if c == ONE || self.is_const(f) {
            return Ok(f);
        }
        if c == ZERO {
            return Ok(ZERO);
        }
        if f == c {
            return Ok(ONE);
        }
        if f == -c {
            return Ok(ZERO);
        }

        let neg = f.is_negated();
        let f = f.regular();
        let key = OpKey::Restrict(f, c);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res.negate_if(neg));
        }

        let top_f = self.level(f);
        let top_c = self.level(c);
        let res = if top_c < top_f {
            // `f` does not depend on the top variable of `c`: quantify it away.
            let (c0, c1) = self.cofactors(c, top_c);
            let c = self.or_rec(c1, c0)?;
            self.inc(c);
            let res = self.restrict_rec(f, c);
            self.dec(c);
            res?
        } else {
            let (f0, f1) = self.cofactors(f, top_f);
            let (c0, c1) = self.cofactors(c, top_f);
            if c1 == ZERO {
                self.restrict_rec(f0, c0)?
            } else if c0 == ZERO {
                self.restrict_rec(f1, c1)?
            } else {
                let var = self.node(f).var;
                let t = self.restrict_rec(f1, c1)?;
                self.inc(t);
                let e = self.restrict_rec(f0, c0).inspect_err(|_| self.dec(t))?;
                self.inc(e);
                self.join(var, t, e)?
            }
        };

        self.cache.insert(key, res);
        Ok(res.negate_if(neg))
    }

    /// Variables on some path of `f`, sorted by level, top first.
    pub(crate) fn support_vars(&self, f: Ref) -> Vec<VarIndex> {
        let mut seen = HashSet::new();
        let mut vars = HashSet::new();
        let mut stack = vec![f.regular()];
        while let Some(r) = stack.pop() {
            if self.is_const(r) || !seen.insert(r.index()) {
                continue;
            }
            let node = self.node(r);
            vars.insert(node.var);
            stack.push(node.low.regular());
            stack.push(node.high.regular());
        }
        let mut vars: Vec<VarIndex> = vars.into_iter().collect();
        vars.sort_by_key(|&v| self.perm[v as usize]);
        vars
    }

    /// Positive cube over `vars`, which must be sorted top first.
    pub(crate) fn cube_rec(&mut self, vars: &[VarIndex]) -> Result<Ref> {
        let mut cube = ONE;
        for &var in vars.iter().rev() {
            let next = self.mk(var, ZERO, cube).inspect_err(|_| self.dec(cube))?;
            self.inc(next);
            self.dec(cube);
            cube = next;
        }
        self.dec(cube);
        Ok(cube)
    }

    /// Whether `cube` is a conjunction of positive literals.
    pub(crate) fn is_positive_cube(&self, cube: Ref) -> bool {
        let mut r = cube;
        while !self.is_const(r) {
            let node = self.node(r);
            if r.is_negated() || node.low != ZERO {
                return false;
            }
            r = node.high;
        }
        r == ONE
    }

    pub(crate) fn check_cube(&self, cube: Ref) -> Result<()> {
        if self.is_positive_cube(cube) {
            Ok(())
        } else {
            Err(EngineError::InvalidArgument(format!("{} is not a positive cube", cube)))
        }
    }
}
