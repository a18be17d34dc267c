//! Reduction of a pair of ellipses to an upright pair by a grid operator.
//!
//! The pair `(A, B)` is acted on by `G` on the first plane and by `G•` on the conjugate plane.
//! Each round picks one special grid operator from the skew and bias of the current pair,
//! stopping once the skew is small; the final operator makes both ellipses close to
//! axis aligned so their bounding boxes are tight.

use super::grid_op::GridOp;
use super::region::{Ellipse, Interval};
use crate::errors::{SynthResult, SynthesisError};
use crate::precision::{Context, Real};
use log::{debug, trace};
use num::{BigInt, FromPrimitive, One};

/// Skew at or below which a pair counts as upright.
pub const SKEW_THRESHOLD: f64 = 15.0;
/// Rounds after which the reduction is considered to have diverged.
pub const MAX_STEPS: usize = 10_000;

/// The result of reducing a pair of ellipses.
#[derive(Clone, Debug)]
pub struct UprightPair {
    /// The operator `G` with `G⁻¹(A)` and `G•⁻¹(B)` upright.
    pub op: GridOp,
    /// Bounding box of `G⁻¹(A)`.
    pub bbox_a: (Interval, Interval),
    /// Bounding box of `G•⁻¹(B)`.
    pub bbox_b: (Interval, Interval),
    /// Rounds taken.
    pub steps: usize,
}

/// Parameters of a determinant one ellipse `[[e λ^-z, b], [b, e λ^z]]` that drive the step choice.
struct Shape {
    b: f64,
    z: f64,
    b_negative: bool,
    b_positive: bool,
}

impl Shape {
    fn of(e: &Ellipse) -> Self {
        let log2_lambda = (1.0 + std::f64::consts::SQRT_2).log2();
        Self {
            b: e.b.to_f64(),
            z: (e.d.log2_approx() - e.a.log2_approx()) / (2.0 * log2_lambda),
            b_negative: e.b.is_negative(),
            b_positive: e.b.is_positive(),
        }
    }
}

fn within(x: f64, lo: f64, hi: f64) -> bool {
    lo <= x && x <= hi
}

fn lambda_f64(x: f64) -> f64 {
    (1.0 + std::f64::consts::SQRT_2).powf(x)
}

fn floor_to_bigint(x: f64) -> SynthResult<BigInt> {
    BigInt::from_f64(x.floor())
        .ok_or_else(|| SynthesisError::invariant(format!("step parameter {} overflowed", x)))
}

/// One special operator reducing the skew of `(a, b)`, or `None` when already upright.
fn step_lemma(a: &Ellipse, b: &Ellipse) -> SynthResult<Option<GridOp>> {
    let sa = Shape::of(a);
    let sb = Shape::of(b);
    let skew = sa.b * sa.b + sb.b * sb.b;
    if skew <= SKEW_THRESHOLD {
        return Ok(None);
    }

    // Shift so that the bias ζ - z is in (-1, 1]. Shifting by k moves z by -k and ζ by +k
    // and flips the sign of β for odd k. A zero β stays zero.
    let bias = sb.z - sa.z;
    let k = if bias.abs() > 1.0 {
        ((1.0 - bias) / 2.0).floor() as i64
    } else {
        0
    };
    let z = sa.z - k as f64;
    let zeta = sb.z + k as f64;
    let beta_negative = if k.rem_euclid(2) == 1 {
        sb.b_positive
    } else {
        sb.b_negative
    };
    trace!(
        "skew {:.3e} z {:.3} zeta {:.3} shift {}",
        skew,
        z,
        zeta,
        k
    );

    let op = if beta_negative {
        GridOp::z()
    } else if z + zeta < 0.0 {
        GridOp::x()
    } else if !sa.b_negative {
        if within(z, -0.8, 0.8) && within(zeta, -0.8, 0.8) {
            GridOp::r()
        } else if z <= 0.3 && zeta >= 0.8 {
            GridOp::k()
        } else if z >= 0.3 && zeta >= 0.3 {
            let n = floor_to_bigint(lambda_f64(z.min(zeta)) / 2.0)?.max(BigInt::one());
            GridOp::a_pow(&n)
        } else if z >= 0.8 && zeta <= 0.3 {
            GridOp::k_bullet()
        } else {
            return Err(SynthesisError::invariant(format!(
                "no reduction step for z = {}, zeta = {}",
                z, zeta
            )));
        }
    } else if within(z, -0.8, 0.8) && within(zeta, -0.8, 0.8) {
        GridOp::r()
    } else if z >= -0.2 && zeta >= -0.2 {
        let n = floor_to_bigint(lambda_f64(z.min(zeta)) / std::f64::consts::SQRT_2)?
            .max(BigInt::one());
        GridOp::b_pow(&n)
    } else {
        return Err(SynthesisError::invariant(format!(
            "no reduction step for z = {}, zeta = {}, b < 0",
            z, zeta
        )));
    };
    Ok(Some(op.shifted(k)))
}

/// Find a grid operator making the pair `(a, b)` upright, with the bounding boxes of the
/// transformed ellipses.
///
/// A degenerate ellipse encloses no area, so there is nothing to reduce and `None` is returned.
pub fn to_upright_pair(
    ctx: &Context,
    a: &Ellipse,
    b: &Ellipse,
) -> SynthResult<Option<UprightPair>> {
    if a.is_degenerate() || b.is_degenerate() {
        debug!("degenerate ellipse, no grid points to enumerate");
        return Ok(None);
    }
    let na = a.normalized();
    let nb = b.normalized();
    let mut op = GridOp::identity();
    let mut steps = 0;
    loop {
        let (ea, eb) = transformed(ctx, &na, &nb, &op)?;
        match step_lemma(&ea, &eb)? {
            None => break,
            Some(g) => op = &op * &g,
        }
        steps += 1;
        if steps > MAX_STEPS {
            return Err(SynthesisError::invariant(format!(
                "ellipse reduction did not converge after {} steps",
                MAX_STEPS
            )));
        }
    }
    let (ea, eb) = transformed(ctx, a, b, &op)?;
    debug!(
        "upright after {} steps, uprightness {} and {}",
        steps,
        ea.uprightness(ctx),
        eb.uprightness(ctx)
    );
    Ok(Some(UprightPair {
        op,
        bbox_a: ea.bbox(),
        bbox_b: eb.bbox(),
        steps,
    }))
}

fn transformed(
    ctx: &Context,
    a: &Ellipse,
    b: &Ellipse,
    op: &GridOp,
) -> SynthResult<(Ellipse, Ellipse)> {
    let g: [[Real; 2]; 2] = op.to_real(ctx);
    let g_inv = op.inverse()?.to_real(ctx);
    let bullet = op.bullet();
    let gb = bullet.to_real(ctx);
    let gb_inv = bullet.inverse()?.to_real(ctx);
    Ok((a.pull_back(&g, &g_inv), b.pull_back(&gb, &gb_inv)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::region::{ConvexRegion, EpsilonRegion, UnitDisk};

    fn skew(e: &Ellipse) -> f64 {
        let n = e.normalized();
        n.b.to_f64().powi(2)
    }

    #[test]
    fn test_already_upright() {
        let ctx = Context::with_digits(30);
        let disk = UnitDisk::new(&ctx);
        let pair = to_upright_pair(&ctx, disk.ellipse(), disk.ellipse())
            .unwrap()
            .unwrap();
        assert_eq!(pair.steps, 0);
        assert_eq!(pair.op, GridOp::identity());
    }

    #[test]
    fn test_epsilon_region_becomes_upright() {
        for (theta, eps) in [
            ("0.5", "1e-3"),
            ("0.5", "1e-10"),
            ("-2.1", "1e-6"),
            ("pi/3", "1e-10"),
        ] {
            let ctx = Context::with_digits(60);
            let theta = ctx.parse(theta).unwrap();
            let eps = ctx.parse(eps).unwrap();
            let region = EpsilonRegion::new(&ctx, &theta, &eps);
            let disk = UnitDisk::new(&ctx);
            let pair = to_upright_pair(&ctx, region.ellipse(), disk.ellipse())
                .unwrap()
                .unwrap();
            assert!(pair.op.preserves_lattice());
            let (ea, eb) =
                transformed(&ctx, region.ellipse(), disk.ellipse(), &pair.op).unwrap();
            assert!(skew(&ea) + skew(&eb) <= SKEW_THRESHOLD + 1e-9);
            // Bounding boxes of upright ellipses are bounded multiples of their area.
            assert!(ea.uprightness(&ctx).to_f64() > 0.05);
            assert!(eb.uprightness(&ctx).to_f64() > 0.05);
        }
    }

    #[test]
    fn test_step_lemma_reduces_skew() {
        let ctx = Context::with_digits(40);
        let theta = ctx.parse("1.0").unwrap();
        let region = EpsilonRegion::new(&ctx, &theta, &ctx.parse("1e-4").unwrap());
        let a = region.ellipse().normalized();
        let b = UnitDisk::new(&ctx).ellipse().clone();
        assert!(skew(&a) + skew(&b) > SKEW_THRESHOLD);
        assert!(step_lemma(&a, &b).unwrap().is_some());
        let pair = to_upright_pair(&ctx, &a, &b).unwrap().unwrap();
        assert!(pair.steps > 0);
        assert_ne!(pair.op, GridOp::identity());
    }

    #[test]
    fn test_zero_beta_never_takes_z() {
        // The disk has β = 0, which stays zero under every shift.
        let ctx = Context::with_digits(60);
        let theta = ctx.parse("0.5").unwrap();
        let disk = UnitDisk::new(&ctx);
        for eps in ["1e-3", "1e-10"] {
            let region = EpsilonRegion::new(&ctx, &theta, &ctx.parse(eps).unwrap());
            let a = region.ellipse().normalized();
            let step = step_lemma(&a, disk.ellipse()).unwrap().unwrap();
            assert_ne!(step, GridOp::z(), "eps = {}", eps);
            let pair = to_upright_pair(&ctx, region.ellipse(), disk.ellipse())
                .unwrap()
                .unwrap();
            assert!(pair.steps < 100, "{} steps", pair.steps);
        }
    }

    #[test]
    fn test_degenerate_ellipse_has_no_reduction() {
        let ctx = Context::with_digits(30);
        let flat = Ellipse::new(ctx.zero(), ctx.zero(), ctx.one(), (ctx.zero(), ctx.zero()));
        let disk = UnitDisk::new(&ctx);
        assert!(to_upright_pair(&ctx, &flat, disk.ellipse()).unwrap().is_none());
        assert!(to_upright_pair(&ctx, disk.ellipse(), &flat).unwrap().is_none());
    }
}
