//! The one dimensional grid problem: all `α ∈ Z[√2]` with `α ∈ I` and `α• ∈ J`.
//!
//! Solutions are produced lazily. The problem is split on an explicit work stack until each
//! piece has a small width product, each piece is balanced by a power of `λ`, and the
//! remaining box is enumerated directly. Pieces are half open on the left so no solution is
//! produced twice.

use super::region::Interval;
use crate::precision::{Context, Real};
use crate::ring::ZRootTwo;
use num::{BigInt, One};

/// Width product above which a piece is split before enumeration.
const MAX_PIECE_AREA: f64 = 64.0;

#[derive(Clone, Debug)]
struct Piece {
    i: Interval,
    j: Interval,
    open_lo: bool,
}

/// Direct enumeration of a balanced piece.
#[derive(Clone, Debug)]
struct Leaf {
    piece: Piece,
    /// `λ^-n`, mapping the balanced solution back.
    unscale: ZRootTwo,
    scaled_i: Interval,
    scaled_j: Interval,
    b: BigInt,
    b_max: BigInt,
    a: BigInt,
    a_max: BigInt,
}

impl Leaf {
    fn new(ctx: &Context, piece: Piece) -> Self {
        let delta = piece.i.width().log2_approx();
        let big_delta = piece.j.width().log2_approx();
        // λ^n I and (λ•)^n J have comparable widths for n ≈ log_λ(Δ/δ) / 2.
        let n = if delta.is_finite() && big_delta.is_finite() {
            ((big_delta - delta) / (2.0 * (1.0 + std::f64::consts::SQRT_2).log2())).round()
                as i64
        } else {
            0
        };
        let (scale, scale_bullet) = lambda_powers(ctx, n);
        let scaled_i = piece.i.scale(&scale);
        let scaled_j = piece.j.scale(&scale_bullet);
        let two_sqrt2 = ctx.sqrt2().mul_int(&2.into());
        // One extra step on each side absorbs rounding; `accepts` filters exactly.
        let b = (&(&scaled_i.lo - &scaled_j.hi) / &two_sqrt2).ceil() - 1u32;
        let b_max = (&(&scaled_i.hi - &scaled_j.lo) / &two_sqrt2).floor() + 1u32;
        let mut leaf = Self {
            piece,
            unscale: ZRootTwo::lambda_pow(-n),
            scaled_i,
            scaled_j,
            b,
            b_max,
            a: BigInt::one(),
            a_max: BigInt::from(0),
        };
        leaf.reset_a(ctx);
        leaf
    }

    /// Set the `a` range for the current `b`.
    fn reset_a(&mut self, ctx: &Context) {
        let b_sqrt2 = ctx.sqrt2().mul_int(&self.b);
        let lo = (&self.scaled_i.lo - &b_sqrt2).max(&self.scaled_j.lo + &b_sqrt2);
        let hi = (&self.scaled_i.hi - &b_sqrt2).min(&self.scaled_j.hi + &b_sqrt2);
        self.a = lo.ceil() - 1u32;
        self.a_max = hi.floor() + 1u32;
    }

    fn accepts(&self, ctx: &Context, alpha: &ZRootTwo) -> bool {
        let x = alpha.to_real(ctx);
        let xb = alpha.conj_sq2().to_real(ctx);
        let above_lo = if self.piece.open_lo {
            x > self.piece.i.lo
        } else {
            x >= self.piece.i.lo
        };
        above_lo && x <= self.piece.i.hi && self.piece.j.contains(&xb)
    }

    fn next(&mut self, ctx: &Context) -> Option<ZRootTwo> {
        while self.b <= self.b_max {
            while self.a <= self.a_max {
                let scaled = ZRootTwo::new(self.a.clone(), self.b.clone());
                self.a += 1u32;
                let alpha = &scaled * &self.unscale;
                if self.accepts(ctx, &alpha) {
                    return Some(alpha);
                }
            }
            self.b += 1u32;
            if self.b <= self.b_max {
                self.reset_a(ctx);
            }
        }
        None
    }
}

/// `(λ^n, (λ•)^n)` as reals, where `λ• = -λ⁻¹`.
fn lambda_powers(ctx: &Context, n: i64) -> (Real, Real) {
    let (base, base_bullet) = if n >= 0 {
        (ctx.lambda().clone(), -ctx.lambda_inv())
    } else {
        (ctx.lambda_inv().clone(), -ctx.lambda())
    };
    let mut p = ctx.one();
    let mut pb = ctx.one();
    for _ in 0..n.unsigned_abs() {
        p = &p * &base;
        pb = &pb * &base_bullet;
    }
    (p, pb)
}

/// How the solutions of the underlying problem map to the requested ones.
#[derive(Clone, Debug)]
enum Lift {
    Plain,
    /// `β = p + √2γ`.
    Parity(BigInt),
}

/// Lazy iterator over the solutions of a one dimensional grid problem.
#[derive(Clone, Debug)]
pub struct OdgpSolutions {
    ctx: Context,
    stack: Vec<Piece>,
    leaf: Option<Leaf>,
    lift: Lift,
}

impl OdgpSolutions {
    /// All `α ∈ Z[√2]` with `α ∈ i` and `α• ∈ j`.
    pub fn new(ctx: &Context, i: Interval, j: Interval) -> Self {
        Self::with_lift(ctx, i, j, Lift::Plain)
    }

    fn with_lift(ctx: &Context, i: Interval, j: Interval, lift: Lift) -> Self {
        let stack = if i.is_empty() || j.is_empty() {
            vec![]
        } else {
            vec![Piece {
                i,
                j,
                open_lo: false,
            }]
        };
        Self {
            ctx: ctx.clone(),
            stack,
            leaf: None,
            lift,
        }
    }

    /// All `α` with `α/√2^m ∈ i` and `α•/(-√2)^m ∈ j`.
    pub fn scaled(ctx: &Context, i: &Interval, j: &Interval, m: u32) -> Self {
        let (s, sb) = sqrt2_powers(ctx, m);
        Self::new(ctx, i.scale(&s), j.scale(&sb))
    }

    /// As [`OdgpSolutions::scaled`], keeping only `α = a + b√2` with `a ≡ parity (mod 2)`.
    pub fn scaled_with_parity(
        ctx: &Context,
        i: &Interval,
        j: &Interval,
        m: u32,
        parity: &BigInt,
    ) -> Self {
        let (s, sb) = sqrt2_powers(ctx, m);
        let p = ctx.bigint(parity);
        let inv = ctx.inv_sqrt2();
        // β = p + √2γ: γ ∈ (√2^m I - p)/√2 and γ• ∈ (p - (-√2)^m J)/√2.
        let gi = i.scale(&s).shift(&-&p).scale(inv);
        let gj = j.scale(&sb).scale(&-ctx.one()).shift(&p).scale(inv);
        Self::with_lift(ctx, gi, gj, Lift::Parity(parity.clone()))
    }

    fn lift(&self, gamma: ZRootTwo) -> ZRootTwo {
        match &self.lift {
            Lift::Plain => gamma,
            Lift::Parity(p) => &ZRootTwo::from_int(p.clone()) + &gamma.mul_sqrt2(),
        }
    }
}

/// `(√2^m, (-√2)^m)` as reals.
fn sqrt2_powers(ctx: &Context, m: u32) -> (Real, Real) {
    let mut s = ctx.one().mul_pow2(i64::from(m / 2));
    if m % 2 == 1 {
        s = &s * ctx.sqrt2();
    }
    let sb = if m % 2 == 1 { -&s } else { s.clone() };
    (s, sb)
}

impl Iterator for OdgpSolutions {
    type Item = ZRootTwo;

    fn next(&mut self) -> Option<ZRootTwo> {
        loop {
            if let Some(leaf) = self.leaf.as_mut() {
                if let Some(alpha) = leaf.next(&self.ctx) {
                    return Some(self.lift(alpha));
                }
                self.leaf = None;
            }
            let piece = self.stack.pop()?;
            if piece.i.is_empty() || piece.j.is_empty() {
                continue;
            }
            let area = (&piece.i.width() * &piece.j.width()).to_f64();
            if area > MAX_PIECE_AREA {
                let (left, right) = piece.i.bisect();
                // Right first so the left half is enumerated first.
                self.stack.push(Piece {
                    i: right,
                    j: piece.j.clone(),
                    open_lo: true,
                });
                self.stack.push(Piece {
                    i: left,
                    j: piece.j,
                    open_lo: piece.open_lo,
                });
                continue;
            }
            self.leaf = Some(Leaf::new(&self.ctx, piece));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(ctx: &Context, i: &Interval, j: &Interval) -> Vec<ZRootTwo> {
        let mut out = vec![];
        for a in -200i64..=200 {
            for b in -150i64..=150 {
                let x = ZRootTwo::new(a, b);
                if i.contains(&x.to_real(ctx)) && j.contains(&x.conj_sq2().to_real(ctx)) {
                    out.push(x);
                }
            }
        }
        out
    }

    fn sorted(mut v: Vec<ZRootTwo>) -> Vec<(BigInt, BigInt)> {
        let mut out: Vec<_> = v.drain(..).map(|x| (x.a, x.b)).collect();
        out.sort();
        out
    }

    #[test]
    fn test_matches_brute_force() {
        let ctx = Context::with_digits(30);
        let cases = [
            ("-3.5", "4.25", "-2", "7.5"),
            ("10", "10.3", "-20", "20"),
            ("0", "100", "-0.5", "0.5"),
            ("-1.1", "-1.0", "-1", "1"),
        ];
        for (a, b, c, d) in cases {
            let i = Interval::new(ctx.parse(a).unwrap(), ctx.parse(b).unwrap());
            let j = Interval::new(ctx.parse(c).unwrap(), ctx.parse(d).unwrap());
            let found: Vec<_> = OdgpSolutions::new(&ctx, i.clone(), j.clone()).collect();
            assert_eq!(sorted(found), sorted(brute_force(&ctx, &i, &j)), "{:?}", (a, b, c, d));
        }
    }

    #[test]
    fn test_no_duplicates_after_splitting() {
        let ctx = Context::with_digits(30);
        let i = Interval::new(ctx.int(-50), ctx.int(50));
        let j = Interval::new(ctx.int(-30), ctx.int(30));
        let found = sorted(OdgpSolutions::new(&ctx, i, j).collect());
        let mut dedup = found.clone();
        dedup.dedup();
        assert_eq!(found.len(), dedup.len());
        assert!(!found.is_empty());
    }

    #[test]
    fn test_empty_intervals() {
        let ctx = Context::with_digits(30);
        let i = Interval::new(ctx.int(1), ctx.int(0));
        let j = Interval::new(ctx.int(-1), ctx.int(1));
        assert_eq!(OdgpSolutions::new(&ctx, i, j).count(), 0);
    }

    #[test]
    fn test_scaled_and_parity() {
        let ctx = Context::with_digits(30);
        let i = Interval::new(ctx.parse("0.2").unwrap(), ctx.parse("0.9").unwrap());
        let j = Interval::new(ctx.parse("-0.7").unwrap(), ctx.parse("0.4").unwrap());
        let m = 3;
        let s = 8f64.sqrt();
        let all: Vec<_> = OdgpSolutions::scaled(&ctx, &i, &j, m).collect();
        assert!(!all.is_empty());
        for x in &all {
            let v = x.to_real(&ctx).to_f64() / s;
            let vb = x.conj_sq2().to_real(&ctx).to_f64() / -s;
            assert!((0.2..=0.9).contains(&v));
            assert!((-0.7..=0.4).contains(&vb));
        }
        for parity in [0i64, 1] {
            let p = BigInt::from(parity);
            let some: Vec<_> =
                OdgpSolutions::scaled_with_parity(&ctx, &i, &j, m, &p).collect();
            let expected: Vec<_> = all
                .iter()
                .filter(|x| (&x.a - &p) % 2u32 == BigInt::from(0))
                .cloned()
                .collect();
            assert_eq!(sorted(some), sorted(expected));
        }
    }
}
