//! The two dimensional grid problem for a pair of convex sets.
//!
//! Finds `u ∈ (1/√2^k) Z[ω]` with `u ∈ A`, `u• ∈ B` and least denominator exponent exactly
//! `k`. The sets are first brought into upright position by a grid operator `G`, candidates
//! `u' = G⁻¹u` are enumerated column by column: the x coordinate from a one dimensional
//! problem on the bounding boxes, then the y coordinate from the exact line intersection.

use super::odgp::OdgpSolutions;
use super::region::{ConvexRegion, Interval};
use super::upright::UprightPair;
use crate::precision::Context;
use crate::ring::{DOmega, DRootTwo, ZOmega, ZRootTwo};
use num::{BigInt, Integer};

/// Interval padding as a fraction of the width, `2^-PAD_SHIFT`.
const PAD_SHIFT: i64 = 10;

fn padded(ctx: &Context, i: &Interval) -> Interval {
    let pad = &i.width().abs().mul_pow2(-PAD_SHIFT) + &ctx.tolerance();
    i.fatten(&pad)
}

#[derive(Debug)]
struct Column {
    origin: DOmega,
    ys: OdgpSolutions,
}

/// Lazy iterator over the solutions of a two dimensional grid problem at one denominator exponent.
#[derive(Debug)]
pub struct GridPoints<'a, A: ConvexRegion, B: ConvexRegion> {
    ctx: Context,
    region_a: &'a A,
    region_b: &'a B,
    k: u32,
    /// `G(1)` and `G(i)`.
    u0: DOmega,
    u1: DOmega,
    /// `None` when the reduction found the regions degenerate.
    xs: Option<OdgpSolutions>,
    column: Option<Column>,
}

impl<'a, A: ConvexRegion, B: ConvexRegion> GridPoints<'a, A, B> {
    /// Candidates with denominator exponent `k` for the pair reduced to `upright`.
    ///
    /// A missing reduction yields no candidates at all.
    pub fn new(
        ctx: &Context,
        region_a: &'a A,
        region_b: &'a B,
        upright: Option<&UprightPair>,
        k: u32,
    ) -> Self {
        let i = DOmega::from_zomega(ZOmega::i());
        let (u0, u1, xs) = match upright {
            Some(upright) => {
                let x_a = padded(ctx, &upright.bbox_a.0);
                let x_b = padded(ctx, &upright.bbox_b.0);
                (
                    upright.op.apply(&DOmega::one()),
                    upright.op.apply(&i),
                    Some(OdgpSolutions::scaled(ctx, &x_a, &x_b, k + 1)),
                )
            }
            None => (DOmega::one(), i, None),
        };
        Self {
            ctx: ctx.clone(),
            region_a,
            region_b,
            k,
            u0,
            u1,
            xs,
            column: None,
        }
    }

    /// Open the column of candidates above `x = alpha / √2^(k+1)`.
    fn open_column(&self, alpha: ZRootTwo) -> Option<Column> {
        let parity = alpha.a.mod_floor(&BigInt::from(2));
        let x = DRootTwo::new(alpha, self.k + 1);
        let origin = &DOmega::from_droottwo(&x) * &self.u0;
        let ta = self.region_a.intersect(&origin, &self.u1)?;
        let tb = self
            .region_b
            .intersect(&origin.conj_sq2(), &self.u1.conj_sq2())?;
        let ys = OdgpSolutions::scaled_with_parity(
            &self.ctx,
            &padded(&self.ctx, &ta),
            &padded(&self.ctx, &tb),
            self.k + 1,
            &parity,
        );
        Some(Column { origin, ys })
    }

    fn accept(&self, origin: &DOmega, beta: ZRootTwo) -> Option<DOmega> {
        let y = DRootTwo::new(beta, self.k + 1);
        let u = (origin + &(&DOmega::from_droottwo(&y) * &self.u1)).reduce();
        if u.k() != self.k {
            return None;
        }
        if self.region_a.inside(&u) && self.region_b.inside(&u.conj_sq2()) {
            Some(u)
        } else {
            None
        }
    }
}

impl<'a, A: ConvexRegion, B: ConvexRegion> Iterator for GridPoints<'a, A, B> {
    type Item = DOmega;

    fn next(&mut self) -> Option<DOmega> {
        loop {
            if let Some(mut column) = self.column.take() {
                while let Some(beta) = column.ys.next() {
                    if let Some(u) = self.accept(&column.origin, beta) {
                        self.column = Some(column);
                        return Some(u);
                    }
                }
            }
            let alpha = self.xs.as_mut()?.next()?;
            self.column = self.open_column(alpha);
        }
    }
}
