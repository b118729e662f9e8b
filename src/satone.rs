//! Extraction of one satisfying assignment as a single-path diagram.

use std::rc::Rc;

use bdd_engine::NodeId;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::handle::Bdd;
use crate::manager::{Manager, Shared};

/// Restarts allowed when automatic reordering interrupts [`Manager::sat_one`].
pub const MAX_SATONE_ATTEMPTS: usize = 16;

impl Manager {
    /// One satisfying assignment of `f` as a cube.
    ///
    /// The result implies `f` and has exactly one path to `1`. Where `f` can
    /// be satisfied with its top variable false, that branch is taken.
    /// `sat_one(zero)` is `zero`.
    pub fn sat_one(&self, f: &Bdd) -> Result<Bdd> {
        let ctx = self.operands(&[f])?;
        for attempt in 1..=MAX_SATONE_ATTEMPTS {
            ctx.with_engine(|engine| engine.clear_reordered())?;
            match sat_one_rec(&ctx, f.id()) {
                Ok(res) => return Ok(res),
                Err(e) => {
                    if !ctx.with_engine(|engine| engine.reordered())? {
                        return Err(e);
                    }
                    warn!("sat_one: attempt {} interrupted by reordering ({}), restarting", attempt, e);
                }
            }
        }
        Err(Error::ResourceExhaustion(format!(
            "sat_one gave up after {} reorderings",
            MAX_SATONE_ATTEMPTS
        )))
    }
}

fn sat_one_rec(ctx: &Rc<Shared>, f: NodeId) -> Result<Bdd> {
    let node = ctx.with_engine(|engine| {
        engine
            .node_index(f)
            .map(|var| (var, engine.high(f), engine.low(f), engine.low(f) == engine.zero()))
    })?;
    let Some((var, high, low, low_is_zero)) = node else {
        return ctx.produce(|_| Ok(f));
    };

    if low_is_zero {
        let res = sat_one_rec(ctx, high)?;
        ctx.produce(|engine| {
            let r = res.id();
            if engine.is_complement(r) {
                let (t, e) = (engine.not(r), engine.one());
                let n = engine.unique_inter(var, t, e)?;
                Ok(engine.not(n))
            } else {
                let e = engine.zero();
                Ok(engine.unique_inter(var, r, e)?)
            }
        })
    } else {
        let res = sat_one_rec(ctx, low)?;
        debug!("sat_one: var {} takes the low branch", var);
        ctx.produce(|engine| {
            let (t, e) = (engine.one(), engine.not(res.id()));
            let n = engine.unique_inter(var, t, e)?;
            Ok(engine.not(n))
        })
    }
}
