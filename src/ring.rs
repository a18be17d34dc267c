//! Exact arithmetic in `Z[√2]`, `Z[ω]` and their dyadic extensions `D[√2]`, `D[ω]`.
//!
//! * [`ZRootTwo`] is `a + b√2`.
//! * [`ZOmega`] is `aω³ + bω² + cω + d` with `ω = e^{iπ/4}`, so `ω⁴ = -1`.
//! * [`DRootTwo`] and [`DOmega`] are the above divided by `√2^k`.
//!
//! Two automorphisms appear throughout: complex conjugation (`conj`) and the `√2 ↦ -√2`
//! conjugation written `x•` (`conj_sq2`).

use crate::precision::{Context, Real};
use num::{BigInt, Integer, One, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// `round(a / n)` for a nonzero `n`, halves rounded up.
pub(crate) fn round_div(a: &BigInt, n: &BigInt) -> BigInt {
    let (a, n) = if n.is_negative() {
        (-a, -n)
    } else {
        (a.clone(), n.clone())
    };
    (a * 2u32 + &n).div_floor(&(n * 2u32))
}

macro_rules! ring_binops {
    ($t:ty, $add:ident, $sub:ident, $mul:ident) => {
        ring_binops!(@one $t, Add, add, $add);
        ring_binops!(@one $t, Sub, sub, $sub);
        ring_binops!(@one $t, Mul, mul, $mul);
    };
    (@one $t:ty, $imp:ident, $method:ident, $inner:ident) => {
        impl<'a, 'b> $imp<&'b $t> for &'a $t {
            type Output = $t;
            fn $method(self, rhs: &'b $t) -> $t {
                self.$inner(rhs)
            }
        }

        impl<'a> $imp<&'a $t> for $t {
            type Output = $t;
            fn $method(self, rhs: &'a $t) -> $t {
                (&self).$inner(rhs)
            }
        }

        impl<'a> $imp<$t> for &'a $t {
            type Output = $t;
            fn $method(self, rhs: $t) -> $t {
                self.$inner(&rhs)
            }
        }

        impl $imp<$t> for $t {
            type Output = $t;
            fn $method(self, rhs: $t) -> $t {
                (&self).$inner(&rhs)
            }
        }
    };
}

/// `a + b√2`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ZRootTwo {
    /// Integer part.
    pub a: BigInt,
    /// Coefficient of `√2`.
    pub b: BigInt,
}

impl ZRootTwo {
    /// `a + b√2`.
    pub fn new<A: Into<BigInt>, B: Into<BigInt>>(a: A, b: B) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// An integer.
    pub fn from_int<A: Into<BigInt>>(a: A) -> Self {
        Self::new(a, 0)
    }

    /// Zero.
    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    /// One.
    pub fn one() -> Self {
        Self::new(1, 0)
    }

    /// `√2`.
    pub fn sqrt2() -> Self {
        Self::new(0, 1)
    }

    /// `λ = 1 + √2`.
    pub fn lambda() -> Self {
        Self::new(1, 1)
    }

    /// `λ^-1 = -1 + √2`.
    pub fn lambda_inv() -> Self {
        Self::new(-1, 1)
    }

    /// `λ^n` for any integer `n`.
    pub fn lambda_pow(n: i64) -> Self {
        if n >= 0 {
            Self::lambda().pow(n as u64)
        } else {
            Self::lambda_inv().pow(n.unsigned_abs())
        }
    }

    /// `self^e`.
    pub fn pow(&self, mut e: u64) -> Self {
        let mut base = self.clone();
        let mut acc = Self::one();
        while e > 0 {
            if e & 1 == 1 {
                acc = &acc * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        acc
    }

    /// Is this zero.
    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }

    /// `a - b√2`.
    pub fn conj_sq2(&self) -> Self {
        Self {
            a: self.a.clone(),
            b: -&self.b,
        }
    }

    /// `x · x• = a² - 2b²`.
    pub fn norm(&self) -> BigInt {
        &self.a * &self.a - (&self.b * &self.b) * 2u32
    }

    /// Exact sign of `a + b√2`.
    pub fn signum(&self) -> Ordering {
        let sa = self.a.sign();
        let sb = self.b.sign();
        use num::bigint::Sign::*;
        match (sa, sb) {
            (NoSign, NoSign) => Ordering::Equal,
            (Plus, Plus) | (Plus, NoSign) | (NoSign, Plus) => Ordering::Greater,
            (Minus, Minus) | (Minus, NoSign) | (NoSign, Minus) => Ordering::Less,
            // Opposite signs: compare a² against 2b².
            (Plus, Minus) => (&self.a * &self.a).cmp(&(&self.b * &self.b * 2u32)),
            (Minus, Plus) => (&self.b * &self.b * 2u32).cmp(&(&self.a * &self.a)),
        }
    }

    /// `x >= 0` and `x• >= 0`.
    pub fn is_doubly_nonnegative(&self) -> bool {
        self.signum() != Ordering::Less && self.conj_sq2().signum() != Ordering::Less
    }

    /// Multiply by an integer.
    pub fn mul_int(&self, k: &BigInt) -> Self {
        Self {
            a: &self.a * k,
            b: &self.b * k,
        }
    }

    /// `x · √2`.
    pub fn mul_sqrt2(&self) -> Self {
        Self {
            a: &self.b * 2u32,
            b: self.a.clone(),
        }
    }

    /// Can this be divided by `√2` within the ring.
    pub fn is_divisible_by_sqrt2(&self) -> bool {
        self.a.is_even()
    }

    /// `x / √2`, valid when [`Self::is_divisible_by_sqrt2`].
    pub fn div_sqrt2(&self) -> Self {
        debug_assert!(self.is_divisible_by_sqrt2());
        Self {
            a: self.b.clone(),
            b: &self.a / 2u32,
        }
    }

    /// Euclidean division with a remainder of smaller absolute norm, `None` for a zero divisor.
    pub fn euclid_div(&self, rhs: &Self) -> Option<(Self, Self)> {
        let n = rhs.norm();
        if n.is_zero() {
            return None;
        }
        let num = self * &rhs.conj_sq2();
        let q = Self {
            a: round_div(&num.a, &n),
            b: round_div(&num.b, &n),
        };
        let r = self - &(&q * rhs);
        Some((q, r))
    }

    /// `self / rhs` if it lies in the ring.
    pub fn exact_div(&self, rhs: &Self) -> Option<Self> {
        let (q, r) = self.euclid_div(rhs)?;
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    /// Does `rhs` divide `self`.
    pub fn is_divisible_by(&self, rhs: &Self) -> bool {
        self.exact_div(rhs).is_some()
    }

    /// A greatest common divisor, defined up to a unit.
    pub fn gcd(&self, rhs: &Self) -> Self {
        let mut x = self.clone();
        let mut y = rhs.clone();
        while !y.is_zero() {
            let r = match x.euclid_div(&y) {
                Some((_, r)) => r,
                None => break,
            };
            x = y;
            y = r;
        }
        x
    }

    /// Numeric value.
    pub fn to_real(&self, ctx: &Context) -> Real {
        ctx.bigint(&self.a) + ctx.sqrt2().mul_int(&self.b)
    }

    fn add_ref(&self, rhs: &Self) -> Self {
        Self {
            a: &self.a + &rhs.a,
            b: &self.b + &rhs.b,
        }
    }

    fn sub_ref(&self, rhs: &Self) -> Self {
        Self {
            a: &self.a - &rhs.a,
            b: &self.b - &rhs.b,
        }
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        Self {
            a: &self.a * &rhs.a + (&self.b * &rhs.b) * 2u32,
            b: &self.a * &rhs.b + &self.b * &rhs.a,
        }
    }
}

ring_binops!(ZRootTwo, add_ref, sub_ref, mul_ref);

impl Neg for ZRootTwo {
    type Output = ZRootTwo;
    fn neg(self) -> ZRootTwo {
        ZRootTwo {
            a: -self.a,
            b: -self.b,
        }
    }
}

impl<'a> Neg for &'a ZRootTwo {
    type Output = ZRootTwo;
    fn neg(self) -> ZRootTwo {
        ZRootTwo {
            a: -&self.a,
            b: -&self.b,
        }
    }
}

impl fmt::Display for ZRootTwo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:+}√2", self.a, self.b)
    }
}

/// `aω³ + bω² + cω + d`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ZOmega {
    /// Coefficient of `ω³`.
    pub a: BigInt,
    /// Coefficient of `ω² = i`.
    pub b: BigInt,
    /// Coefficient of `ω`.
    pub c: BigInt,
    /// Integer part.
    pub d: BigInt,
}

impl ZOmega {
    /// `aω³ + bω² + cω + d`.
    pub fn new<A, B, C, D>(a: A, b: B, c: C, d: D) -> Self
    where
        A: Into<BigInt>,
        B: Into<BigInt>,
        C: Into<BigInt>,
        D: Into<BigInt>,
    {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
            d: d.into(),
        }
    }

    /// An integer.
    pub fn from_int<D: Into<BigInt>>(d: D) -> Self {
        Self::new(0, 0, 0, d)
    }

    /// Zero.
    pub fn zero() -> Self {
        Self::from_int(0)
    }

    /// One.
    pub fn one() -> Self {
        Self::from_int(1)
    }

    /// `ω`.
    pub fn omega() -> Self {
        Self::new(0, 0, 1, 0)
    }

    /// `i = ω²`.
    pub fn i() -> Self {
        Self::new(0, 1, 0, 0)
    }

    /// `√2 = ω - ω³`.
    pub fn sqrt2() -> Self {
        Self::new(-1, 0, 1, 0)
    }

    /// `a + b√2` embedded as `-bω³ + bω + a`.
    pub fn from_zroottwo(x: &ZRootTwo) -> Self {
        Self {
            a: -&x.b,
            b: BigInt::zero(),
            c: x.b.clone(),
            d: x.a.clone(),
        }
    }

    /// The real element `d + c√2`, if this is real.
    pub fn to_zroottwo(&self) -> Option<ZRootTwo> {
        if self.b.is_zero() && self.c == -&self.a {
            Some(ZRootTwo {
                a: self.d.clone(),
                b: self.c.clone(),
            })
        } else {
            None
        }
    }

    /// Is this zero.
    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero() && self.c.is_zero() && self.d.is_zero()
    }

    /// Complex conjugate.
    pub fn conj(&self) -> Self {
        Self {
            a: -&self.c,
            b: -&self.b,
            c: -&self.a,
            d: self.d.clone(),
        }
    }

    /// The `√2 ↦ -√2` conjugate, which sends `ω` to `-ω`.
    pub fn conj_sq2(&self) -> Self {
        Self {
            a: -&self.a,
            b: self.b.clone(),
            c: -&self.c,
            d: self.d.clone(),
        }
    }

    /// `x · ω`.
    pub fn mul_omega(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.c.clone(),
            c: self.d.clone(),
            d: -&self.a,
        }
    }

    /// `x · ω^k` for any integer `k`.
    pub fn mul_omega_pow(&self, k: i64) -> Self {
        let mut out = self.clone();
        for _ in 0..k.rem_euclid(8) {
            out = out.mul_omega();
        }
        out
    }

    /// `x · √2`.
    pub fn mul_sqrt2(&self) -> Self {
        Self {
            a: &self.b - &self.d,
            b: &self.c + &self.a,
            c: &self.d + &self.b,
            d: &self.c - &self.a,
        }
    }

    /// Can this be divided by `√2` within the ring.
    pub fn is_divisible_by_sqrt2(&self) -> bool {
        (&self.a - &self.c).is_even() && (&self.b - &self.d).is_even()
    }

    /// `x / √2`, valid when [`Self::is_divisible_by_sqrt2`].
    pub fn div_sqrt2(&self) -> Self {
        debug_assert!(self.is_divisible_by_sqrt2());
        Self {
            a: (&self.b - &self.d) / 2u32,
            b: (&self.c + &self.a) / 2u32,
            c: (&self.d + &self.b) / 2u32,
            d: (&self.c - &self.a) / 2u32,
        }
    }

    /// Multiply by an integer.
    pub fn mul_int(&self, k: &BigInt) -> Self {
        Self {
            a: &self.a * k,
            b: &self.b * k,
            c: &self.c * k,
            d: &self.d * k,
        }
    }

    /// `|x|² = x · x*` as an element of `Z[√2]`.
    pub fn norm_sq(&self) -> ZRootTwo {
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        ZRootTwo {
            a: a * a + b * b + c * c + d * d,
            b: c * d - a * d + b * c + a * b,
        }
    }

    /// The integer norm, the product of all four conjugates.
    pub fn norm(&self) -> BigInt {
        self.norm_sq().norm()
    }

    /// Euclidean division with a remainder of smaller norm, `None` for a zero divisor.
    pub fn euclid_div(&self, rhs: &Self) -> Option<(Self, Self)> {
        let n = rhs.norm();
        if n.is_zero() {
            return None;
        }
        let bullet = rhs.conj_sq2();
        let cofactor = &(&rhs.conj() * &bullet) * &bullet.conj();
        let num = self * &cofactor;
        let q = Self {
            a: round_div(&num.a, &n),
            b: round_div(&num.b, &n),
            c: round_div(&num.c, &n),
            d: round_div(&num.d, &n),
        };
        let r = self - &(&q * rhs);
        Some((q, r))
    }

    /// `self / rhs` if it lies in the ring.
    pub fn exact_div(&self, rhs: &Self) -> Option<Self> {
        let (q, r) = self.euclid_div(rhs)?;
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    /// A greatest common divisor, defined up to a unit.
    pub fn gcd(&self, rhs: &Self) -> Self {
        let mut x = self.clone();
        let mut y = rhs.clone();
        while !y.is_zero() {
            let r = match x.euclid_div(&y) {
                Some((_, r)) => r,
                None => break,
            };
            // Rounding ties can fail to shrink the norm; stop rather than cycle.
            if r.norm() >= y.norm() {
                break;
            }
            x = y;
            y = r;
        }
        x
    }

    /// Numeric real and imaginary parts.
    pub fn to_complex(&self, ctx: &Context) -> (Real, Real) {
        let s = ctx.inv_sqrt2();
        let re = ctx.bigint(&self.d) + s.mul_int(&(&self.c - &self.a));
        let im = ctx.bigint(&self.b) + s.mul_int(&(&self.c + &self.a));
        (re, im)
    }

    fn add_ref(&self, rhs: &Self) -> Self {
        Self {
            a: &self.a + &rhs.a,
            b: &self.b + &rhs.b,
            c: &self.c + &rhs.c,
            d: &self.d + &rhs.d,
        }
    }

    fn sub_ref(&self, rhs: &Self) -> Self {
        Self {
            a: &self.a - &rhs.a,
            b: &self.b - &rhs.b,
            c: &self.c - &rhs.c,
            d: &self.d - &rhs.d,
        }
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        // Polynomial product in ω reduced with ω⁴ = -1.
        let (x0, x1, x2, x3) = (&self.d, &self.c, &self.b, &self.a);
        let (y0, y1, y2, y3) = (&rhs.d, &rhs.c, &rhs.b, &rhs.a);
        let r0 = x0 * y0 - (x1 * y3 + x2 * y2 + x3 * y1);
        let r1 = x0 * y1 + x1 * y0 - (x2 * y3 + x3 * y2);
        let r2 = x0 * y2 + x1 * y1 + x2 * y0 - x3 * y3;
        let r3 = x0 * y3 + x1 * y2 + x2 * y1 + x3 * y0;
        Self {
            a: r3,
            b: r2,
            c: r1,
            d: r0,
        }
    }
}

ring_binops!(ZOmega, add_ref, sub_ref, mul_ref);

impl Neg for ZOmega {
    type Output = ZOmega;
    fn neg(self) -> ZOmega {
        ZOmega {
            a: -self.a,
            b: -self.b,
            c: -self.c,
            d: -self.d,
        }
    }
}

impl<'a> Neg for &'a ZOmega {
    type Output = ZOmega;
    fn neg(self) -> ZOmega {
        -self.clone()
    }
}

impl fmt::Display for ZOmega {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ω³{:+}ω²{:+}ω{:+}", self.a, self.b, self.c, self.d)
    }
}

/// `α / √2^k` with `α ∈ Z[√2]`.
#[derive(Clone, Debug, Default)]
pub struct DRootTwo {
    alpha: ZRootTwo,
    k: u32,
}

impl DRootTwo {
    /// `alpha / √2^k`.
    pub fn new(alpha: ZRootTwo, k: u32) -> Self {
        Self { alpha, k }
    }

    /// An element of `Z[√2]`.
    pub fn from_zroottwo(alpha: ZRootTwo) -> Self {
        Self::new(alpha, 0)
    }

    /// An integer.
    pub fn from_int<A: Into<BigInt>>(a: A) -> Self {
        Self::from_zroottwo(ZRootTwo::from_int(a))
    }

    /// Zero.
    pub fn zero() -> Self {
        Self::from_int(0)
    }

    /// One.
    pub fn one() -> Self {
        Self::from_int(1)
    }

    /// `1/√2`.
    pub fn inv_sqrt2() -> Self {
        Self::new(ZRootTwo::one(), 1)
    }

    /// Numerator.
    pub fn alpha(&self) -> &ZRootTwo {
        &self.alpha
    }

    /// Denominator exponent.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Is this zero.
    pub fn is_zero(&self) -> bool {
        self.alpha.is_zero()
    }

    /// The representation with the smallest denominator exponent.
    pub fn reduce(&self) -> Self {
        if self.alpha.is_zero() {
            return Self::zero();
        }
        let mut alpha = self.alpha.clone();
        let mut k = self.k;
        while k > 0 && alpha.is_divisible_by_sqrt2() {
            alpha = alpha.div_sqrt2();
            k -= 1;
        }
        Self { alpha, k }
    }

    /// The same value written over `√2^k`, for `k >= self.k()`.
    pub fn renew(&self, k: u32) -> Self {
        debug_assert!(k >= self.k);
        let mut alpha = self.alpha.clone();
        for _ in self.k..k {
            alpha = alpha.mul_sqrt2();
        }
        Self { alpha, k }
    }

    /// The element of `Z[√2]` this equals, if any.
    pub fn to_zroottwo(&self) -> Option<ZRootTwo> {
        let r = self.reduce();
        if r.k == 0 {
            Some(r.alpha)
        } else {
            None
        }
    }

    /// `x • `, noting `(√2)• = -√2`.
    pub fn conj_sq2(&self) -> Self {
        let alpha = self.alpha.conj_sq2();
        Self {
            alpha: if self.k % 2 == 1 { -alpha } else { alpha },
            k: self.k,
        }
    }

    /// Exact sign.
    pub fn signum(&self) -> Ordering {
        self.alpha.signum()
    }

    /// Multiply by `√2^e`.
    pub fn scale_sqrt2(&self, e: i64) -> Self {
        if e >= 0 {
            let mut alpha = self.alpha.clone();
            for _ in 0..e {
                alpha = alpha.mul_sqrt2();
            }
            Self { alpha, k: self.k }.reduce()
        } else {
            Self {
                alpha: self.alpha.clone(),
                k: self.k + e.unsigned_abs() as u32,
            }
        }
    }

    /// Multiply by an element of `Z[√2]`.
    pub fn mul_zroottwo(&self, rhs: &ZRootTwo) -> Self {
        Self {
            alpha: &self.alpha * rhs,
            k: self.k,
        }
    }

    /// Numeric value.
    pub fn to_real(&self, ctx: &Context) -> Real {
        let v = self.alpha.to_real(ctx).mul_pow2(-i64::from(self.k / 2));
        if self.k % 2 == 1 {
            &v * ctx.inv_sqrt2()
        } else {
            v
        }
    }

    fn add_ref(&self, rhs: &Self) -> Self {
        let k = self.k.max(rhs.k);
        Self {
            alpha: &self.renew(k).alpha + &rhs.renew(k).alpha,
            k,
        }
    }

    fn sub_ref(&self, rhs: &Self) -> Self {
        let k = self.k.max(rhs.k);
        Self {
            alpha: &self.renew(k).alpha - &rhs.renew(k).alpha,
            k,
        }
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        Self {
            alpha: &self.alpha * &rhs.alpha,
            k: self.k + rhs.k,
        }
    }
}

ring_binops!(DRootTwo, add_ref, sub_ref, mul_ref);

impl Neg for DRootTwo {
    type Output = DRootTwo;
    fn neg(self) -> DRootTwo {
        DRootTwo {
            alpha: -self.alpha,
            k: self.k,
        }
    }
}

impl<'a> Neg for &'a DRootTwo {
    type Output = DRootTwo;
    fn neg(self) -> DRootTwo {
        -self.clone()
    }
}

impl PartialEq for DRootTwo {
    fn eq(&self, other: &Self) -> bool {
        (self - other).is_zero()
    }
}

impl Eq for DRootTwo {}

impl PartialOrd for DRootTwo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DRootTwo {
    fn cmp(&self, other: &Self) -> Ordering {
        (self - other).signum()
    }
}

impl fmt::Display for DRootTwo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})/√2^{}", self.alpha, self.k)
    }
}

/// `u / √2^k` with `u ∈ Z[ω]`.
#[derive(Clone, Debug, Default)]
pub struct DOmega {
    u: ZOmega,
    k: u32,
}

impl DOmega {
    /// `u / √2^k`.
    pub fn new(u: ZOmega, k: u32) -> Self {
        Self { u, k }
    }

    /// An element of `Z[ω]`.
    pub fn from_zomega(u: ZOmega) -> Self {
        Self::new(u, 0)
    }

    /// Embed a real dyadic.
    pub fn from_droottwo(x: &DRootTwo) -> Self {
        Self::new(ZOmega::from_zroottwo(x.alpha()), x.k())
    }

    /// `x + iy`.
    pub fn from_parts(x: &DRootTwo, y: &DRootTwo) -> Self {
        let re = Self::from_droottwo(x);
        let im = Self::from_droottwo(y);
        &re + &im.mul_omega_pow(2)
    }

    /// An integer.
    pub fn from_int<A: Into<BigInt>>(a: A) -> Self {
        Self::from_zomega(ZOmega::from_int(a))
    }

    /// Zero.
    pub fn zero() -> Self {
        Self::from_int(0)
    }

    /// One.
    pub fn one() -> Self {
        Self::from_int(1)
    }

    /// Numerator.
    pub fn u(&self) -> &ZOmega {
        &self.u
    }

    /// Denominator exponent.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Is this zero.
    pub fn is_zero(&self) -> bool {
        self.u.is_zero()
    }

    /// The representation with the smallest denominator exponent.
    pub fn reduce(&self) -> Self {
        if self.u.is_zero() {
            return Self::zero();
        }
        let mut u = self.u.clone();
        let mut k = self.k;
        while k > 0 && u.is_divisible_by_sqrt2() {
            u = u.div_sqrt2();
            k -= 1;
        }
        Self { u, k }
    }

    /// The same value written over `√2^k`, for `k >= self.k()`.
    pub fn renew(&self, k: u32) -> Self {
        debug_assert!(k >= self.k);
        let mut u = self.u.clone();
        for _ in self.k..k {
            u = u.mul_sqrt2();
        }
        Self { u, k }
    }

    /// Complex conjugate.
    pub fn conj(&self) -> Self {
        Self {
            u: self.u.conj(),
            k: self.k,
        }
    }

    /// The `√2 ↦ -√2` conjugate.
    pub fn conj_sq2(&self) -> Self {
        let u = self.u.conj_sq2();
        Self {
            u: if self.k % 2 == 1 { -u } else { u },
            k: self.k,
        }
    }

    /// `x · ω^j`.
    pub fn mul_omega_pow(&self, j: i64) -> Self {
        Self {
            u: self.u.mul_omega_pow(j),
            k: self.k,
        }
    }

    /// `x / √2`.
    pub fn div_sqrt2(&self) -> Self {
        Self {
            u: self.u.clone(),
            k: self.k + 1,
        }
    }

    /// Real part.
    pub fn real(&self) -> DRootTwo {
        let u = &self.u;
        DRootTwo::new(ZRootTwo::new(&u.c - &u.a, u.d.clone()), self.k + 1)
    }

    /// Imaginary part.
    pub fn imag(&self) -> DRootTwo {
        let u = &self.u;
        DRootTwo::new(ZRootTwo::new(&u.c + &u.a, u.b.clone()), self.k + 1)
    }

    /// `|x|²`.
    pub fn norm_sq(&self) -> DRootTwo {
        DRootTwo::new(self.u.norm_sq(), 2 * self.k)
    }

    /// Numeric real and imaginary parts.
    pub fn to_complex(&self, ctx: &Context) -> (Real, Real) {
        (self.real().to_real(ctx), self.imag().to_real(ctx))
    }

    fn add_ref(&self, rhs: &Self) -> Self {
        let k = self.k.max(rhs.k);
        Self {
            u: &self.renew(k).u + &rhs.renew(k).u,
            k,
        }
    }

    fn sub_ref(&self, rhs: &Self) -> Self {
        let k = self.k.max(rhs.k);
        Self {
            u: &self.renew(k).u - &rhs.renew(k).u,
            k,
        }
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        Self {
            u: &self.u * &rhs.u,
            k: self.k + rhs.k,
        }
    }
}

ring_binops!(DOmega, add_ref, sub_ref, mul_ref);

impl Neg for DOmega {
    type Output = DOmega;
    fn neg(self) -> DOmega {
        DOmega {
            u: -self.u,
            k: self.k,
        }
    }
}

impl<'a> Neg for &'a DOmega {
    type Output = DOmega;
    fn neg(self) -> DOmega {
        -self.clone()
    }
}

impl PartialEq for DOmega {
    fn eq(&self, other: &Self) -> bool {
        (self - other).is_zero()
    }
}

impl Eq for DOmega {}

impl fmt::Display for DOmega {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})/√2^{}", self.u, self.k)
    }
}

#[cfg(test)]
mod ring_tests {
    use super::*;

    fn approx(ctx: &Context, x: &Real, y: f64) -> bool {
        let _ = ctx;
        (x.to_f64() - y).abs() < 1e-12
    }

    #[test]
    fn test_zroottwo_arith() {
        let x = ZRootTwo::new(3, -2);
        let y = ZRootTwo::new(-1, 5);
        assert_eq!(&x * &y, ZRootTwo::new(-3 - 20, 15 + 2));
        assert_eq!((&x * &y).norm(), x.norm() * y.norm());
        assert_eq!(ZRootTwo::lambda() * ZRootTwo::lambda_inv(), ZRootTwo::one());
        assert_eq!(ZRootTwo::lambda_pow(-3) * ZRootTwo::lambda_pow(3), ZRootTwo::one());
    }

    #[test]
    fn test_zroottwo_signum() {
        assert_eq!(ZRootTwo::new(3, -2).signum(), Ordering::Greater);
        assert_eq!(ZRootTwo::new(2, -2).signum(), Ordering::Less);
        assert_eq!(ZRootTwo::new(-1, 1).signum(), Ordering::Greater);
        assert_eq!(ZRootTwo::new(-2, 1).signum(), Ordering::Less);
        assert_eq!(ZRootTwo::zero().signum(), Ordering::Equal);
        assert!(ZRootTwo::lambda_inv().conj_sq2().signum() == Ordering::Less);
        assert!(ZRootTwo::new(3, 1).is_doubly_nonnegative());
        assert!(!ZRootTwo::lambda().is_doubly_nonnegative());
    }

    #[test]
    fn test_round_div() {
        let r = |a: i64, n: i64| round_div(&BigInt::from(a), &BigInt::from(n));
        assert_eq!(r(7, 2), BigInt::from(4));
        assert_eq!(r(-7, 2), BigInt::from(-3));
        assert_eq!(r(5, -3), BigInt::from(-2));
        assert_eq!(r(1, 3), BigInt::zero());
        // a² against 2b² with opposite signs, beyond machine integers.
        let big = BigInt::from(1u64 << 62) * BigInt::from(1u64 << 62);
        let x = ZRootTwo::new(&big * 3u32, -(&big * 2u32));
        assert_eq!(x.signum(), Ordering::Greater);
        assert_eq!(x.norm(), &big * &big);
    }

    #[test]
    fn test_zroottwo_euclid() {
        let x = ZRootTwo::new(57, 13);
        let y = ZRootTwo::new(5, 2);
        let (q, r) = x.euclid_div(&y).unwrap();
        assert_eq!(&(&q * &y) + &r, x);
        assert!(r.norm().abs() < y.norm().abs());
        let z = ZRootTwo::new(7, 3);
        let g = (&x * &z).gcd(&(&y * &z));
        assert!(g.is_divisible_by(&z));
        assert!(x.euclid_div(&ZRootTwo::zero()).is_none());
    }

    #[test]
    fn test_zomega_mul_and_norm() {
        let w = ZOmega::omega();
        let mut p = ZOmega::one();
        for _ in 0..8 {
            p = &p * &w;
        }
        assert_eq!(p, ZOmega::one());
        assert_eq!(&w * &w, ZOmega::i());
        assert_eq!(&ZOmega::sqrt2() * &ZOmega::sqrt2(), ZOmega::from_int(2));
        let x = ZOmega::new(1, -2, 3, 4);
        let y = ZOmega::new(-3, 0, 1, 2);
        assert_eq!((&x * &y).norm(), x.norm() * y.norm());
        assert_eq!(
            (&x * &x.conj()).to_zroottwo().unwrap(),
            x.norm_sq()
        );
    }

    #[test]
    fn test_zomega_conjugations() {
        let x = ZOmega::new(2, -1, 5, 7);
        assert_eq!(x.conj().conj(), x);
        assert_eq!(x.conj_sq2().conj_sq2(), x);
        let y = ZOmega::new(1, 3, -2, 1);
        assert_eq!((&x * &y).conj_sq2(), &x.conj_sq2() * &y.conj_sq2());
        assert_eq!((&x * &y).conj(), &x.conj() * &y.conj());
        let r = ZRootTwo::new(3, 4);
        assert_eq!(ZOmega::from_zroottwo(&r).conj_sq2(), ZOmega::from_zroottwo(&r.conj_sq2()));
    }

    #[test]
    fn test_zomega_sqrt2() {
        let x = ZOmega::new(2, -1, 5, 7);
        let y = x.mul_sqrt2();
        assert_eq!(y, &x * &ZOmega::sqrt2());
        assert!(y.is_divisible_by_sqrt2());
        assert_eq!(y.div_sqrt2(), x);
        assert!(!ZOmega::one().is_divisible_by_sqrt2());
    }

    #[test]
    fn test_zomega_euclid() {
        let x = ZOmega::new(4, -7, 11, 3);
        let y = ZOmega::new(1, 2, 0, -1);
        let (q, r) = x.euclid_div(&y).unwrap();
        assert_eq!(&(&q * &y) + &r, x);
        assert!(r.norm() < y.norm());
        let z = ZOmega::new(0, 1, 1, 2);
        assert!((&y * &z).exact_div(&z).is_some());
    }

    #[test]
    fn test_dyadic_reduce_and_compare() {
        let half = DRootTwo::new(ZRootTwo::from_int(2), 4);
        assert_eq!(half.reduce().k(), 2);
        assert_eq!(half, DRootTwo::new(ZRootTwo::one(), 2));
        assert!(DRootTwo::inv_sqrt2() > half);
        assert!(DRootTwo::inv_sqrt2() < DRootTwo::one());
        let ctx = Context::with_digits(30);
        assert!(approx(&ctx, &DRootTwo::inv_sqrt2().to_real(&ctx), 0.5f64.sqrt()));
        let x = DRootTwo::new(ZRootTwo::new(1, 1), 3);
        assert!(approx(&ctx, &x.conj_sq2().to_real(&ctx), (1.0 - 2f64.sqrt()) / -(8f64.sqrt())));
    }

    #[test]
    fn test_domega_parts() {
        let ctx = Context::with_digits(30);
        let z = DOmega::new(ZOmega::new(1, 2, -3, 5), 3);
        let (re, im) = z.u().to_complex(&ctx);
        let s = 8f64.sqrt();
        assert!(approx(&ctx, &z.real().to_real(&ctx), re.to_f64() / s));
        assert!(approx(&ctx, &z.imag().to_real(&ctx), im.to_f64() / s));
        let rebuilt = DOmega::from_parts(&z.real(), &z.imag());
        assert_eq!(rebuilt, z);
        let n = z.norm_sq().to_real(&ctx).to_f64();
        let expected = (re.to_f64().powi(2) + im.to_f64().powi(2)) / 8.0;
        assert!((n - expected).abs() < 1e-12);
        assert_eq!(z.conj_sq2().conj_sq2(), z);
    }
}
