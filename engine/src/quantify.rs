//! Existential and universal abstraction, and the fused relational product.
//!
//! Cubes are positive conjunctions of the variables to abstract; callers check
//! them with [`Heap::check_cube`] before recursing.

use crate::cache::OpKey;
use crate::error::Result;
use crate::heap::{Heap, ONE, ZERO};
use crate::reference::Ref;

impl Heap {
    /// Drop the cube variables above `level`.
    fn skip_cube(&self, mut cube: Ref, level: u32) -> Ref {
        while !self.is_const(cube) && self.level(cube) < level {
            cube = self.node(cube).high;
        }
        cube
    }

    pub(crate) fn exist_rec(&mut self, f: Ref, cube: Ref) -> Result<Ref> {
        if self.is_const(f) || cube == ONE {
            return Ok(f);
        }
        let top = self.level(f);
        let cube = self.skip_cube(cube, top);
        if cube == ONE {
            return Ok(f);
        }

        let key = OpKey::Exist(f, cube);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f, top);
        let res = if self.level(cube) == top {
            let rest = self.node(cube).high;
            let t = self.exist_rec(f1, rest)?;
            if t == ONE {
                ONE
            } else {
                self.inc(t);
                let e = self.exist_rec(f0, rest).inspect_err(|_| self.dec(t))?;
                self.inc(e);
                self.join_or(t, e)?
            }
        } else {
            let var = self.node(f).var;
            let t = self.exist_rec(f1, cube)?;
            self.inc(t);
            let e = self.exist_rec(f0, cube).inspect_err(|_| self.dec(t))?;
            self.inc(e);
            self.join(var, t, e)?
        };

        self.cache.insert(key, res);
        Ok(res)
    }

    pub(crate) fn univ_rec(&mut self, f: Ref, cube: Ref) -> Result<Ref> {
        Ok(-self.exist_rec(-f, cube)?)
    }

    pub(crate) fn and_abstract_rec(&mut self, f: Ref, g: Ref, cube: Ref) -> Result<Ref> {
        if f == ZERO || g == ZERO || f == -g {
            return Ok(ZERO);
        }
        if f == ONE && g == ONE {
            return Ok(ONE);
        }
        if cube == ONE {
            return self.and_rec(f, g);
        }
        if f == ONE || f == g {
            return self.exist_rec(g, cube);
        }
        if g == ONE {
            return self.exist_rec(f, cube);
        }

        // Conjunction commutes.
        let (f, g) = if f.raw() > g.raw() { (g, f) } else { (f, g) };

        let top = self.level(f).min(self.level(g));
        let cube = self.skip_cube(cube, top);
        if cube == ONE {
            return self.and_rec(f, g);
        }

        let key = OpKey::AndAbstract(f, g, cube);
        if let Some(res) = self.cache.get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f, top);
        let (g0, g1) = self.cofactors(g, top);
        let res = if self.level(cube) == top {
            let rest = self.node(cube).high;
            let t = self.and_abstract_rec(f1, g1, rest)?;
            if t == ONE {
                ONE
            } else {
                self.inc(t);
                let e = self.and_abstract_rec(f0, g0, rest).inspect_err(|_| self.dec(t))?;
                self.inc(e);
                self.join_or(t, e)?
            }
        } else {
            let var = self.subtables[top as usize].variable;
            let t = self.and_abstract_rec(f1, g1, cube)?;
            self.inc(t);
            let e = self.and_abstract_rec(f0, g0, cube).inspect_err(|_| self.dec(t))?;
            self.inc(e);
            self.join(var, t, e)?
        };

        self.cache.insert(key, res);
        Ok(res)
    }
}
