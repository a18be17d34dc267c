//! Intervals, ellipses and the two convex sets searched by the grid solver.

use crate::precision::{Context, Real};
use crate::ring::{DOmega, DRootTwo};
use std::cmp::Ordering;

/// A closed real interval `[lo, hi]`; empty when `hi < lo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    /// Lower end.
    pub lo: Real,
    /// Upper end.
    pub hi: Real,
}

impl Interval {
    /// The interval `[lo, hi]`.
    pub fn new(lo: Real, hi: Real) -> Self {
        Self { lo, hi }
    }

    /// True when `hi < lo`.
    pub fn is_empty(&self) -> bool {
        self.hi < self.lo
    }

    /// `hi - lo`.
    pub fn width(&self) -> Real {
        &self.hi - &self.lo
    }

    /// `(lo + hi) / 2`.
    pub fn midpoint(&self) -> Real {
        (&self.lo + &self.hi).half()
    }

    /// Closed membership.
    pub fn contains(&self, x: &Real) -> bool {
        &self.lo <= x && x <= &self.hi
    }

    /// Widen both ends by `amount`.
    pub fn fatten(&self, amount: &Real) -> Self {
        Self::new(&self.lo - amount, &self.hi + amount)
    }

    /// The image under `x ↦ factor · x`, flipping the ends for a negative factor.
    pub fn scale(&self, factor: &Real) -> Self {
        let a = &self.lo * factor;
        let b = &self.hi * factor;
        if factor.is_negative() {
            Self::new(b, a)
        } else {
            Self::new(a, b)
        }
    }

    /// The image under `x ↦ x + offset`.
    pub fn shift(&self, offset: &Real) -> Self {
        Self::new(&self.lo + offset, &self.hi + offset)
    }

    /// Split at the midpoint.
    pub fn bisect(&self) -> (Self, Self) {
        let mid = self.midpoint();
        (
            Self::new(self.lo.clone(), mid.clone()),
            Self::new(mid, self.hi.clone()),
        )
    }
}

/// The positive definite quadratic form `(p - c)ᵀ M (p - c) <= 1` with `M = [[a, b], [b, d]]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ellipse {
    /// `M[0][0]`.
    pub a: Real,
    /// `M[0][1] = M[1][0]`.
    pub b: Real,
    /// `M[1][1]`.
    pub d: Real,
    /// The center `c`.
    pub center: (Real, Real),
}

impl Ellipse {
    /// Build from the form's entries and center.
    pub fn new(a: Real, b: Real, d: Real, center: (Real, Real)) -> Self {
        Self { a, b, d, center }
    }

    /// `det M`.
    pub fn det(&self) -> Real {
        &self.a * &self.d - self.b.square()
    }

    /// Positive definite with a positive determinant.
    pub fn is_degenerate(&self) -> bool {
        !self.a.is_positive() || !self.d.is_positive() || !self.det().is_positive()
    }

    /// The same shape rescaled to determinant one.
    pub fn normalized(&self) -> Self {
        let s = self.det().sqrt();
        Self::new(&self.a / &s, &self.b / &s, &self.d / &s, self.center.clone())
    }

    /// Axis aligned bounding box as `(x, y)` intervals.
    pub fn bbox(&self) -> (Interval, Interval) {
        let det = self.det();
        let dx = (&self.d / &det).sqrt();
        let dy = (&self.a / &det).sqrt();
        let (cx, cy) = &self.center;
        (
            Interval::new(cx - &dx, cx + &dx),
            Interval::new(cy - &dy, cy + &dy),
        )
    }

    /// Ratio of the ellipse area to its bounding box area, `π√det / (4√(ad))`.
    pub fn uprightness(&self, ctx: &Context) -> Real {
        let num = ctx.pi() * &self.det().sqrt();
        let den = (&self.a * &self.d).sqrt().mul_int(&4.into());
        &num / &den
    }

    /// The preimage `G⁻¹(E)` for a linear map with matrix `g` and inverse `g_inv`.
    pub fn pull_back(&self, g: &[[Real; 2]; 2], g_inv: &[[Real; 2]; 2]) -> Self {
        // Gᵀ M G
        let (a, b, d) = (&self.a, &self.b, &self.d);
        let m00 = a * &g[0][0] + b * &g[1][0];
        let m01 = a * &g[0][1] + b * &g[1][1];
        let m10 = b * &g[0][0] + d * &g[1][0];
        let m11 = b * &g[0][1] + d * &g[1][1];
        let na = &g[0][0] * &m00 + &g[1][0] * &m10;
        let nb = &g[0][0] * &m01 + &g[1][0] * &m11;
        let nd = &g[0][1] * &m01 + &g[1][1] * &m11;
        let (cx, cy) = &self.center;
        let center = (
            &g_inv[0][0] * cx + &g_inv[0][1] * cy,
            &g_inv[1][0] * cx + &g_inv[1][1] * cy,
        );
        Self::new(na, nb, nd, center)
    }
}

/// A bounded convex subset of the plane known to the grid solver.
pub trait ConvexRegion {
    /// An ellipse enclosing the region.
    fn ellipse(&self) -> &Ellipse;
    /// Membership test for a dyadic point. Exact for the unit disk, decided at the working
    /// precision for regions bounded by irrational data.
    fn inside(&self, u: &DOmega) -> bool;
    /// The parameter interval `{t : origin + t·direction ∈ region}`, if nonempty.
    fn intersect(&self, origin: &DOmega, direction: &DOmega) -> Option<Interval>;
}

/// Roots of `a t² + b t + c` in increasing order for `a > 0`, computed without cancellation.
pub fn solve_quadratic(ctx: &Context, a: &Real, b: &Real, c: &Real) -> Option<(Real, Real)> {
    if !a.is_positive() {
        return None;
    }
    let disc = b.square() - (a * c).mul_int(&4.into());
    if disc.is_negative() {
        return None;
    }
    let s = disc.sqrt();
    let q = if b.is_negative() {
        (&s - b).half()
    } else {
        -(b + &s).half()
    };
    if q.is_zero() {
        return Some((ctx.zero(), ctx.zero()));
    }
    let r1 = &q / a;
    let r2 = c / &q;
    if r1 <= r2 {
        Some((r1, r2))
    } else {
        Some((r2, r1))
    }
}

/// Coefficients of `|p + t v|² - 1` as a quadratic in `t`.
fn disk_quadratic(ctx: &Context, origin: &DOmega, direction: &DOmega) -> (Real, Real, Real) {
    let a = direction.norm_sq().to_real(ctx);
    let b = (&direction.conj() * origin).real().to_real(ctx).mul_int(&2.into());
    let c = (origin.norm_sq() - DRootTwo::one()).to_real(ctx);
    (a, b, c)
}

fn inside_unit_disk(u: &DOmega) -> bool {
    u.norm_sq().cmp(&DRootTwo::one()) != Ordering::Greater
}

/// The closed unit disk.
#[derive(Clone, Debug)]
pub struct UnitDisk {
    ctx: Context,
    ellipse: Ellipse,
}

impl UnitDisk {
    /// The disk at the precision of `ctx`.
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            ellipse: Ellipse::new(ctx.one(), ctx.zero(), ctx.one(), (ctx.zero(), ctx.zero())),
        }
    }
}

impl ConvexRegion for UnitDisk {
    fn ellipse(&self) -> &Ellipse {
        &self.ellipse
    }

    fn inside(&self, u: &DOmega) -> bool {
        inside_unit_disk(u)
    }

    fn intersect(&self, origin: &DOmega, direction: &DOmega) -> Option<Interval> {
        let (a, b, c) = disk_quadratic(&self.ctx, origin, direction);
        let (t0, t1) = solve_quadratic(&self.ctx, &a, &b, &c)?;
        Some(Interval::new(t0, t1))
    }
}

/// The ε-region: the part of the unit disk whose points `u` satisfy `Re(u z̄) >= 1 - ε²/2`
/// for the target `z = e^{-iθ/2}`.
#[derive(Clone, Debug)]
pub struct EpsilonRegion {
    ctx: Context,
    target: (Real, Real),
    chord: Real,
    ellipse: Ellipse,
}

impl EpsilonRegion {
    /// The region for `Rz(theta)` at tolerance `epsilon`.
    pub fn new(ctx: &Context, theta: &Real, epsilon: &Real) -> Self {
        let (sin, cos) = ctx.sin_cos(&(-theta).half());
        let h = epsilon.square().half();
        let chord = ctx.one() - &h;
        let w2 = ctx.one() - chord.square();
        // Axis along the target direction has half-width h, the orthogonal one √(1 - d²).
        let inv_h2 = &ctx.one() / &h.square();
        let inv_w2 = &ctx.one() / &w2;
        let a = &cos.square() * &inv_h2 + &sin.square() * &inv_w2;
        let b = &(&cos * &sin) * &(&inv_h2 - &inv_w2);
        let d = &sin.square() * &inv_h2 + &cos.square() * &inv_w2;
        let center = (&chord * &cos, &chord * &sin);
        Self {
            ctx: ctx.clone(),
            target: (cos, sin),
            chord,
            ellipse: Ellipse::new(a, b, d, center),
        }
    }

    /// `(Re z, Im z)` of the target.
    pub fn target(&self) -> &(Real, Real) {
        &self.target
    }

    /// The threshold `1 - ε²/2` on `Re(u z̄)`.
    pub fn chord(&self) -> &Real {
        &self.chord
    }

    fn projection(&self, x: &Real, y: &Real) -> Real {
        x * &self.target.0 + y * &self.target.1
    }
}

impl ConvexRegion for EpsilonRegion {
    fn ellipse(&self) -> &Ellipse {
        &self.ellipse
    }

    fn inside(&self, u: &DOmega) -> bool {
        if !inside_unit_disk(u) {
            return false;
        }
        let (x, y) = u.to_complex(&self.ctx);
        self.projection(&x, &y) >= self.chord
    }

    fn intersect(&self, origin: &DOmega, direction: &DOmega) -> Option<Interval> {
        let (a, b, c) = disk_quadratic(&self.ctx, origin, direction);
        let (mut lo, mut hi) = solve_quadratic(&self.ctx, &a, &b, &c)?;
        let (px, py) = origin.to_complex(&self.ctx);
        let (vx, vy) = direction.to_complex(&self.ctx);
        let p_dot = self.projection(&px, &py);
        let v_dot = self.projection(&vx, &vy);
        let gap = &self.chord - &p_dot;
        if v_dot.is_zero() {
            if gap.is_positive() {
                return None;
            }
        } else {
            let t = &gap / &v_dot;
            if v_dot.is_positive() {
                lo = lo.max(t);
            } else {
                hi = hi.min(t);
            }
        }
        let out = Interval::new(lo, hi);
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::ZOmega;

    fn f(x: &Real) -> f64 {
        x.to_f64()
    }

    #[test]
    fn test_quadratic() {
        let ctx = Context::with_digits(30);
        let (r0, r1) =
            solve_quadratic(&ctx, &ctx.int(1), &ctx.int(-3), &ctx.int(2)).unwrap();
        assert!((f(&r0) - 1.0).abs() < 1e-20);
        assert!((f(&r1) - 2.0).abs() < 1e-20);
        assert!(solve_quadratic(&ctx, &ctx.int(1), &ctx.zero(), &ctx.int(1)).is_none());
        let (z0, z1) = solve_quadratic(&ctx, &ctx.int(1), &ctx.zero(), &ctx.zero()).unwrap();
        assert!(z0.is_zero() && z1.is_zero());
    }

    #[test]
    fn test_interval_ops() {
        let ctx = Context::with_digits(20);
        let i = Interval::new(ctx.int(-1), ctx.int(3));
        let s = i.scale(&ctx.int(-2));
        assert_eq!(s, Interval::new(ctx.int(-6), ctx.int(2)));
        assert!(!s.is_empty());
        assert!(Interval::new(ctx.int(1), ctx.zero()).is_empty());
        let (l, r) = i.bisect();
        assert_eq!(l.hi, ctx.int(1));
        assert_eq!(r.lo, ctx.int(1));
        assert!(i.fatten(&ctx.one()).contains(&ctx.int(4)));
    }

    #[test]
    fn test_unit_disk() {
        let ctx = Context::with_digits(30);
        let disk = UnitDisk::new(&ctx);
        assert!(disk.inside(&DOmega::one()));
        assert!(disk.inside(&DOmega::from_zomega(ZOmega::omega())));
        assert!(!disk.inside(&DOmega::from_int(2)));
        // The horizontal line through the origin meets the disk in [-1, 1].
        let t = disk.intersect(&DOmega::zero(), &DOmega::one()).unwrap();
        assert!((f(&t.lo) + 1.0).abs() < 1e-20);
        assert!((f(&t.hi) - 1.0).abs() < 1e-20);
        let (bx, by) = disk.ellipse().bbox();
        assert!((f(&bx.lo) + 1.0).abs() < 1e-20 && (f(&by.hi) - 1.0).abs() < 1e-20);
        assert!(disk
            .intersect(&DOmega::from_int(2), &DOmega::from_zomega(ZOmega::i()))
            .is_none());
    }

    #[test]
    fn test_epsilon_region_contains_target_neighbourhood() {
        let ctx = Context::with_digits(30);
        let eps = ctx.parse("0.1").unwrap();
        let region = EpsilonRegion::new(&ctx, &ctx.zero(), &eps);
        // θ = 0 targets z = 1.
        assert!(region.inside(&DOmega::one()));
        assert!(!region.inside(&DOmega::from_zomega(ZOmega::omega())));
        let e = region.ellipse();
        assert!(!e.is_degenerate());
        let (bx, by) = e.bbox();
        assert!(bx.fatten(&ctx.tolerance()).contains(&ctx.one()));
        assert!(f(&by.width()) > 0.0);
        // The real axis meets the region in [1 - ε²/2, 1].
        let t = region.intersect(&DOmega::zero(), &DOmega::one()).unwrap();
        assert!((f(&t.lo) - 0.995).abs() < 1e-20);
        assert!((f(&t.hi) - 1.0).abs() < 1e-20);
    }

    #[test]
    fn test_ellipse_contains_region_points() {
        let ctx = Context::with_digits(30);
        let theta = ctx.parse("0.7").unwrap();
        let eps = ctx.parse("0.2").unwrap();
        let region = EpsilonRegion::new(&ctx, &theta, &eps);
        let e = region.ellipse();
        let (cx, cy) = &e.center;
        // The chord point and the target lie in the ellipse.
        let (zx, zy) = region.target();
        for (x, y) in [(cx.clone(), cy.clone()), (zx.clone(), zy.clone())] {
            let dx = &x - cx;
            let dy = &y - cy;
            let q = &(&e.a * &dx.square() + (&e.b * &(&dx * &dy)).mul_int(&2.into()))
                + &(&e.d * &dy.square());
            assert!(f(&q) <= 1.0 + 1e-20);
        }
    }
}
