use crate::errors::{SynthResult, SynthesisError};
use crate::precision::{Context, Real};
use crate::ring::{DOmega, DRootTwo, ZRootTwo};
use num::BigInt;
use std::fmt;
use std::ops::Mul;

/// A linear map of the plane with entries in `D[√2]` which maps `Z[ω]` onto itself.
///
/// Acting on a point `x + iy` as the matrix `[[m00, m01], [m10, m11]]` acting on `(x, y)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridOp {
    m: [[DRootTwo; 2]; 2],
}

fn d(a: i64, b: i64, k: u32) -> DRootTwo {
    DRootTwo::new(ZRootTwo::new(a, b), k)
}

impl GridOp {
    /// Build from matrix entries.
    pub fn new(m00: DRootTwo, m01: DRootTwo, m10: DRootTwo, m11: DRootTwo) -> Self {
        Self {
            m: [[m00, m01], [m10, m11]],
        }
    }

    /// The identity.
    pub fn identity() -> Self {
        Self::new(d(1, 0, 0), d(0, 0, 0), d(0, 0, 0), d(1, 0, 0))
    }

    /// Rotation by `π/4`: `(1/√2)[[1, -1], [1, 1]]`.
    pub fn r() -> Self {
        Self::new(d(1, 0, 1), d(-1, 0, 1), d(1, 0, 1), d(1, 0, 1))
    }

    /// `(1/√2)[[-λ⁻¹, -1], [λ, 1]]`.
    pub fn k() -> Self {
        Self::new(d(1, -1, 1), d(-1, 0, 1), d(1, 1, 1), d(1, 0, 1))
    }

    /// `(1/√2)[[-λ, 1], [λ⁻¹, -1]]`, the conjugate of [`GridOp::k`].
    pub fn k_bullet() -> Self {
        Self::k().bullet()
    }

    /// `A^n = [[1, -2n], [0, 1]]`.
    pub fn a_pow(n: &BigInt) -> Self {
        let off = DRootTwo::from_zroottwo(ZRootTwo::new(n * -2, 0));
        Self::new(d(1, 0, 0), off, d(0, 0, 0), d(1, 0, 0))
    }

    /// `B^n = [[1, n√2], [0, 1]]`.
    pub fn b_pow(n: &BigInt) -> Self {
        let off = DRootTwo::from_zroottwo(ZRootTwo::new(0, n.clone()));
        Self::new(d(1, 0, 0), off, d(0, 0, 0), d(1, 0, 0))
    }

    /// The reflection swapping the axes.
    pub fn x() -> Self {
        Self::new(d(0, 0, 0), d(1, 0, 0), d(1, 0, 0), d(0, 0, 0))
    }

    /// The reflection `y ↦ -y`.
    pub fn z() -> Self {
        Self::new(d(1, 0, 0), d(0, 0, 0), d(0, 0, 0), d(-1, 0, 0))
    }

    /// Matrix entries.
    pub fn entries(&self) -> &[[DRootTwo; 2]; 2] {
        &self.m
    }

    /// The conjugate operator `G•`, acting on the conjugated plane.
    pub fn bullet(&self) -> Self {
        let m = &self.m;
        Self::new(
            m[0][0].conj_sq2(),
            m[0][1].conj_sq2(),
            m[1][0].conj_sq2(),
            m[1][1].conj_sq2(),
        )
    }

    /// `σ^k G σ^-k` where `σ^k` scales the axes by `λ^(k/2)` and `λ^(-k/2)`.
    pub fn shifted(&self, k: i64) -> Self {
        let m = &self.m;
        Self::new(
            m[0][0].clone(),
            m[0][1].mul_zroottwo(&ZRootTwo::lambda_pow(k)),
            m[1][0].mul_zroottwo(&ZRootTwo::lambda_pow(-k)),
            m[1][1].clone(),
        )
    }

    /// Exact determinant.
    pub fn det(&self) -> DRootTwo {
        let m = &self.m;
        (&m[0][0] * &m[1][1] - &m[0][1] * &m[1][0]).reduce()
    }

    /// The inverse, which exists in the same form only for determinant `±1`.
    pub fn inverse(&self) -> SynthResult<Self> {
        let det = self.det();
        let m = &self.m;
        if det == DRootTwo::one() {
            Ok(Self::new(m[1][1].clone(), -&m[0][1], -&m[1][0], m[0][0].clone()))
        } else if det == -DRootTwo::one() {
            Ok(Self::new(-&m[1][1], m[0][1].clone(), m[1][0].clone(), -&m[0][0]))
        } else {
            Err(SynthesisError::invariant(format!(
                "grid operator with determinant {} has no inverse",
                det
            )))
        }
    }

    /// Apply to a point of the plane, exactly.
    pub fn apply(&self, p: &DOmega) -> DOmega {
        let x = p.real();
        let y = p.imag();
        let m = &self.m;
        let nx = (&m[0][0] * &x + &m[0][1] * &y).reduce();
        let ny = (&m[1][0] * &x + &m[1][1] * &y).reduce();
        DOmega::from_parts(&nx, &ny).reduce()
    }

    /// Does this map `Z[ω]` into itself: checks the images of `1`, `i` and `ω`.
    pub fn preserves_lattice(&self) -> bool {
        let omega = DOmega::from_zomega(crate::ring::ZOmega::omega());
        let i = DOmega::from_zomega(crate::ring::ZOmega::i());
        [DOmega::one(), i, omega]
            .iter()
            .all(|p| self.apply(p).reduce().k() == 0)
    }

    /// Numeric matrix.
    pub fn to_real(&self, ctx: &Context) -> [[Real; 2]; 2] {
        let m = &self.m;
        [
            [m[0][0].to_real(ctx), m[0][1].to_real(ctx)],
            [m[1][0].to_real(ctx), m[1][1].to_real(ctx)],
        ]
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        let (a, b) = (&self.m, &rhs.m);
        let e = |i: usize, j: usize| (&a[i][0] * &b[0][j] + &a[i][1] * &b[1][j]).reduce();
        Self::new(e(0, 0), e(0, 1), e(1, 0), e(1, 1))
    }
}

impl<'a, 'b> Mul<&'b GridOp> for &'a GridOp {
    type Output = GridOp;
    fn mul(self, rhs: &'b GridOp) -> GridOp {
        self.mul_ref(rhs)
    }
}

impl Mul<GridOp> for GridOp {
    type Output = GridOp;
    fn mul(self, rhs: GridOp) -> GridOp {
        self.mul_ref(&rhs)
    }
}

impl fmt::Display for GridOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.m;
        write!(
            f,
            "[[{}, {}], [{}, {}]]",
            m[0][0], m[0][1], m[1][0], m[1][1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::One;

    fn special_ops() -> Vec<GridOp> {
        let two = BigInt::from(2);
        vec![
            GridOp::r(),
            GridOp::k(),
            GridOp::k_bullet(),
            GridOp::a_pow(&BigInt::one()),
            GridOp::a_pow(&two),
            GridOp::b_pow(&BigInt::one()),
            GridOp::b_pow(&-two),
            GridOp::x(),
            GridOp::z(),
        ]
    }

    #[test]
    fn test_special_ops_are_grid_ops() {
        for op in special_ops() {
            assert!(op.preserves_lattice(), "{}", op);
            assert!(op.bullet().preserves_lattice(), "{}", op);
            let inv = op.inverse().unwrap();
            assert_eq!(&op * &inv, GridOp::identity(), "{}", op);
        }
    }

    #[test]
    fn test_shift_preserves_grid_ops() {
        for op in special_ops() {
            for k in [-3i64, -1, 2, 5] {
                let s = op.shifted(k);
                assert!(s.preserves_lattice(), "{} shifted {}", op, k);
                assert_eq!(s.det(), op.det());
            }
        }
    }

    #[test]
    fn test_k_matches_definition() {
        let k = GridOp::k();
        let m = k.entries();
        let lambda_inv = DRootTwo::from_zroottwo(ZRootTwo::lambda_inv());
        assert_eq!(m[0][0], -lambda_inv.scale_sqrt2(-1));
        assert_eq!(
            GridOp::k_bullet().entries()[0][0],
            -DRootTwo::from_zroottwo(ZRootTwo::lambda()).scale_sqrt2(-1)
        );
    }

    #[test]
    fn test_apply_and_compose() {
        let r = GridOp::r();
        // R maps 1 to ω.
        let image = r.apply(&DOmega::one());
        assert_eq!(image, DOmega::from_zomega(crate::ring::ZOmega::omega()));
        let rr = &r * &r;
        assert_eq!(
            rr.apply(&DOmega::one()),
            DOmega::from_zomega(crate::ring::ZOmega::i())
        );
        let ctx = Context::with_digits(20);
        let m = GridOp::b_pow(&BigInt::one()).to_real(&ctx);
        assert!((m[0][1].to_f64() - 2f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let op = GridOp::new(
            DRootTwo::one(),
            DRootTwo::one(),
            DRootTwo::one(),
            DRootTwo::one(),
        );
        assert!(op.inverse().is_err());
    }
}
