//! Arbitrary precision real arithmetic.
//!
//! A [`Real`] is a binary floating point number with a fixed significand length, backed by
//! `dashu_float::FBig` with round half to even. Every value is created through a [`Context`],
//! an immutable description of the working precision which is passed explicitly to every
//! numeric operation that creates new values. Values produced under different contexts must
//! never be mixed.
//!
//! Each primitive operation (add, mul, div, sqrt) rounds by at most half a unit in the last
//! place, and a context carries `GUARD_BITS` bits beyond the requested decimal digits, so any
//! computation of fewer than `2^GUARD_BITS` primitive steps keeps `digits` correct digits
//! relative to the magnitudes involved.

use crate::errors::{SynthResult, SynthesisError};
use dashu_base::SquareRoot;
use dashu_float::round::mode::HalfEven;
use dashu_float::FBig;
use dashu_int::{IBig, UBig};
use num::bigint::Sign;
use num::{BigInt, One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::sync::Arc;

/// Extra binary digits carried beyond the requested decimal precision.
pub const GUARD_BITS: u32 = 32;
/// Smallest decimal precision a context will be built with.
pub const MIN_DIGITS: u32 = 16;

type Float = FBig<HalfEven>;

fn to_ibig(x: &BigInt) -> IBig {
    let (sign, bytes) = x.to_bytes_le();
    let magnitude = IBig::from(UBig::from_le_bytes(&bytes));
    if sign == Sign::Minus {
        -magnitude
    } else {
        magnitude
    }
}

fn to_bigint(x: &IBig) -> BigInt {
    let negative = *x < IBig::ZERO;
    let magnitude = if negative { -x.clone() } else { x.clone() };
    // Nonnegative by construction, so the conversion cannot fail.
    let bytes = UBig::try_from(magnitude)
        .map(|m| m.to_le_bytes().to_vec())
        .unwrap_or_default();
    BigInt::from_bytes_le(
        if negative { Sign::Minus } else { Sign::Plus },
        &bytes,
    )
}

#[derive(Debug)]
struct Constants {
    sqrt2: Real,
    inv_sqrt2: Real,
    lambda: Real,
    lambda_inv: Real,
    pi: Real,
}

/// An immutable working precision together with the constants derived from it.
#[derive(Clone, Debug)]
pub struct Context {
    digits: u32,
    bits: u32,
    consts: Arc<Constants>,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Context {}

impl Context {
    /// Make a context carrying at least `digits` correct decimal digits.
    pub fn with_digits(digits: u32) -> Self {
        let digits = digits.max(MIN_DIGITS);
        let bits = (f64::from(digits) * std::f64::consts::LOG2_10).ceil() as u32 + GUARD_BITS;
        let one = Real::rounded(Float::from(IBig::ONE), bits);
        let two = Real::rounded(Float::from(IBig::from(2u8)), bits);
        let sqrt2 = two.sqrt();
        let inv_sqrt2 = sqrt2.half();
        let lambda = &one + &sqrt2;
        let lambda_inv = &sqrt2 - &one;
        let pi = Real::rounded(
            Float::from_parts(to_ibig(&machin_pi(bits)), -(bits as isize)),
            bits,
        );
        Self {
            digits,
            bits,
            consts: Arc::new(Constants {
                sqrt2,
                inv_sqrt2,
                lambda,
                lambda_inv,
                pi,
            }),
        }
    }

    /// Derive the working precision for a tolerance of `10^-eps_digits`.
    pub fn for_epsilon_digits(eps_digits: u32) -> Self {
        Self::with_digits(20 + 4 * eps_digits)
    }

    /// A context with `extra` more decimal digits than this one.
    pub fn widened(&self, extra: u32) -> Self {
        if extra == 0 {
            self.clone()
        } else {
            Self::with_digits(self.digits + extra)
        }
    }

    /// A context with twice the decimal digits of this one.
    pub fn raised(&self) -> Self {
        Self::with_digits(self.digits * 2)
    }

    /// Requested decimal digits.
    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Significand bits of every value made by this context.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    fn real(&self, x: Float) -> Real {
        Real::rounded(x, self.bits)
    }

    /// The value zero.
    pub fn zero(&self) -> Real {
        self.real(Float::from(IBig::ZERO))
    }

    /// The value one.
    pub fn one(&self) -> Real {
        self.real(Float::from(IBig::ONE))
    }

    /// An integer.
    pub fn int<I: Into<BigInt>>(&self, i: I) -> Real {
        self.bigint(&i.into())
    }

    /// An integer given by reference, rounded if it is longer than the significand.
    pub fn bigint(&self, i: &BigInt) -> Real {
        self.real(Float::from(to_ibig(i)))
    }

    /// The ratio `num / den`, correctly rounded.
    pub fn ratio(&self, num: &BigInt, den: &BigInt) -> Real {
        &self.bigint(num) / &self.bigint(den)
    }

    /// The exact binary value of a finite `f64`.
    pub fn from_f64(&self, x: f64) -> SynthResult<Real> {
        let value = Float::try_from(x)
            .map_err(|_| SynthesisError::domain(format!("{} is not finite", x)))?;
        Ok(self.real(value))
    }

    /// `2^e`, exactly.
    pub fn pow2(&self, e: i64) -> Real {
        self.real(Float::from_parts(IBig::ONE, e as isize))
    }

    /// `√2`.
    pub fn sqrt2(&self) -> &Real {
        &self.consts.sqrt2
    }

    /// `1/√2`.
    pub fn inv_sqrt2(&self) -> &Real {
        &self.consts.inv_sqrt2
    }

    /// The fundamental unit `λ = 1 + √2`.
    pub fn lambda(&self) -> &Real {
        &self.consts.lambda
    }

    /// `λ^-1 = √2 - 1`.
    pub fn lambda_inv(&self) -> &Real {
        &self.consts.lambda_inv
    }

    /// `π`.
    pub fn pi(&self) -> &Real {
        &self.consts.pi
    }

    /// The error bound guaranteed for short computations on values of magnitude at most one,
    /// `2^-(bits - GUARD_BITS)`.
    pub fn tolerance(&self) -> Real {
        self.pow2(-i64::from(self.bits - GUARD_BITS))
    }

    /// Compare two values, refusing to decide when they are within the error bound of each
    /// other. The bound grows with the magnitude of the operands.
    pub fn try_cmp(&self, lhs: &Real, rhs: &Real, what: &str) -> SynthResult<Ordering> {
        let diff = lhs - rhs;
        let scale = self.one().max(lhs.abs()).max(rhs.abs());
        if diff.abs() <= &self.tolerance() * &scale {
            Err(SynthesisError::Precision {
                digits: self.digits,
                message: what.to_string(),
            })
        } else {
            Ok(diff.signum())
        }
    }

    /// `sin(x)` and `cos(x)`.
    ///
    /// The argument is reduced into `[-π, π]` first, which loses about `log2 |x|` bits, so
    /// large arguments need a context widened accordingly.
    pub fn sin_cos(&self, x: &Real) -> (Real, Real) {
        let two_pi = self.pi().mul_int(&BigInt::from(2));
        let turns = (x / &two_pi).round();
        let r = x - &two_pi.mul_int(&turns);
        let r2 = &r * &r;
        let negligible = self.pow2(-i64::from(self.bits) - 8);

        let mut sin = r.clone();
        let mut cos = self.one();
        let mut sin_term = r;
        let mut cos_term = self.one();
        let mut n: u64 = 1;
        loop {
            // sin_term_{n} = -sin_term_{n-1} r^2 / ((2n)(2n+1)), cos_term likewise with (2n-1)(2n).
            cos_term = -(&cos_term * &r2).div_int(&BigInt::from((2 * n - 1) * (2 * n)));
            sin_term = -(&sin_term * &r2).div_int(&BigInt::from((2 * n) * (2 * n + 1)));
            if cos_term.abs() < negligible && sin_term.abs() < negligible {
                break;
            }
            cos += &cos_term;
            sin += &sin_term;
            n += 1;
        }
        (sin, cos)
    }

    /// Parse a real literal at this precision.
    pub fn parse(&self, s: &str) -> SynthResult<Real> {
        Ok(Literal::parse(s)?.to_real(self))
    }
}

/// A parsed real input: `num/den`, optionally multiplied by `π`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    num: BigInt,
    den: BigInt,
    times_pi: bool,
}

const MAX_LITERAL_EXPONENT: i64 = 100_000;

impl Literal {
    /// Parse decimal literals (`0.5`, `-1.25e-3`, `.5`) and multiples of pi
    /// (`pi`, `pi/8`, `3*pi/4`, `-pi/16`).
    pub fn parse(s: &str) -> SynthResult<Self> {
        let s = s.trim();
        let bad = || SynthesisError::domain(format!("cannot parse real literal {:?}", s));
        if s.is_empty() {
            return Err(bad());
        }
        let (numer, denom) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), Some(d.trim())),
            None => (s, None),
        };
        let (negative, numer) = match numer.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, numer.strip_prefix('+').unwrap_or(numer).trim()),
        };

        let mut times_pi = false;
        let (mut num, mut den) = if numer.eq_ignore_ascii_case("pi") {
            times_pi = true;
            (BigInt::one(), BigInt::one())
        } else if let Some(coeff) = numer
            .strip_suffix("*pi")
            .or_else(|| numer.strip_prefix("pi*"))
        {
            times_pi = true;
            parse_decimal(coeff.trim()).ok_or_else(bad)?
        } else {
            parse_decimal(numer).ok_or_else(bad)?
        };
        if let Some(denom) = denom {
            let (dn, dd) = parse_decimal(denom).ok_or_else(bad)?;
            if dn.is_zero() {
                return Err(SynthesisError::domain(format!("division by zero in {:?}", s)));
            }
            num *= dd;
            den *= dn;
        }
        if den.is_negative() {
            num = -num;
            den = -den;
        }
        if negative {
            num = -num;
        }
        Ok(Self { num, den, times_pi })
    }

    /// The exact value of a finite `f64`.
    pub fn from_f64(x: f64) -> SynthResult<Self> {
        let (mant, exp) = decode_f64(x)?;
        let (num, den) = if exp >= 0 {
            (mant << (exp as u64), BigInt::one())
        } else {
            (mant, BigInt::one() << ((-exp) as u64))
        };
        Ok(Self {
            num,
            den,
            times_pi: false,
        })
    }

    /// True when the value is strictly between 0 and 1. Multiples of pi are never.
    pub fn is_open_unit(&self) -> bool {
        !self.times_pi && self.num.is_positive() && self.num < self.den
    }

    /// Approximate `log10(1/|x|)`, zero or negative for `|x| >= 1`.
    pub fn neg_log10(&self) -> f64 {
        if self.num.is_zero() {
            return f64::INFINITY;
        }
        let log2 = log2_bigint(&self.den) - log2_bigint(&self.num.abs());
        log2 / std::f64::consts::LOG2_10
    }

    /// Decimal digits before the point of `|x|`, counting one more for multiples of pi.
    ///
    /// Reducing an angle of this size modulo `2π` cancels about this many leading digits.
    pub fn magnitude_digits(&self) -> u32 {
        let log10 = -self.neg_log10() - 1e-9;
        if log10 > 0.0 {
            log10.ceil() as u32 + u32::from(self.times_pi)
        } else {
            u32::from(self.times_pi)
        }
    }

    /// Evaluate at the precision of `ctx`.
    pub fn to_real(&self, ctx: &Context) -> Real {
        let value = ctx.ratio(&self.num, &self.den);
        if self.times_pi {
            &value * ctx.pi()
        } else {
            value
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.num)?;
        if self.times_pi {
            write!(f, "*pi")?;
        }
        if !self.den.is_one() {
            write!(f, "/{}", self.den)?;
        }
        Ok(())
    }
}

fn parse_decimal(s: &str) -> Option<(BigInt, BigInt)> {
    if s.is_empty() {
        return None;
    }
    let (body, exp) = match s.split_once(|c| c == 'e' || c == 'E') {
        Some((b, e)) => (b, e.parse::<i64>().ok()?),
        None => (s, 0),
    };
    if exp.abs() > MAX_LITERAL_EXPONENT {
        return None;
    }
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part
        .chars()
        .chain(frac_part.chars())
        .all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let digits: BigInt = format!("{}{}", int_part, frac_part).parse().ok()?;
    let scale = exp - frac_part.len() as i64;
    let ten = BigInt::from(10);
    if scale >= 0 {
        Some((digits * ten.pow(scale as u32), BigInt::one()))
    } else {
        Some((digits, ten.pow((-scale) as u32)))
    }
}

fn decode_f64(x: f64) -> SynthResult<(BigInt, i64)> {
    if !x.is_finite() {
        return Err(SynthesisError::domain(format!("{} is not finite", x)));
    }
    let bits = x.to_bits();
    let negative = bits >> 63 == 1;
    let exponent = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mant, exp) = if exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent - 1075)
    };
    let mant = BigInt::from(mant);
    Ok((if negative { -mant } else { mant }, exp))
}

/// `floor(x / 2^n)`.
fn shr_floor(x: BigInt, n: u64) -> BigInt {
    if x.is_negative() {
        -((-x - 1u32) >> n) - 1u32
    } else {
        x >> n
    }
}

fn log2_bigint(x: &BigInt) -> f64 {
    let len = x.bits();
    if len <= 60 {
        x.to_f64().map(f64::log2).unwrap_or(f64::NEG_INFINITY)
    } else {
        let top = x >> (len - 60);
        top.to_f64().map(f64::log2).unwrap_or(f64::NEG_INFINITY) + (len - 60) as f64
    }
}

/// `x * 2^e` without overflowing intermediate powers.
fn ldexp(mut x: f64, mut e: i64) -> f64 {
    while e > 1000 {
        x *= 2f64.powi(1000);
        e -= 1000;
    }
    while e < -1000 {
        x *= 2f64.powi(-1000);
        e += 1000;
    }
    x * 2f64.powi(e as i32)
}

/// `arctan(1/x) * 2^bits`.
fn arctan_inv(x: u32, bits: u32) -> BigInt {
    let x = BigInt::from(x);
    let x2 = &x * &x;
    let mut power = (BigInt::one() << bits) / &x;
    let mut sum = power.clone();
    let mut n: u32 = 1;
    loop {
        power = &power / &x2;
        if power.is_zero() {
            break;
        }
        let term = &power / BigInt::from(2 * n + 1);
        if n % 2 == 1 {
            sum -= term;
        } else {
            sum += term;
        }
        n += 1;
    }
    sum
}

fn machin_pi(bits: u32) -> BigInt {
    let work = bits + 16;
    let pi = arctan_inv(5, work) * 16 - arctan_inv(239, work) * 4;
    pi >> 16u32
}

/// A floating point real number at the precision of the context that made it.
#[derive(Clone)]
pub struct Real {
    value: Float,
}

impl Real {
    fn rounded(value: Float, bits: u32) -> Self {
        Self {
            value: value.with_precision(bits as usize).value(),
        }
    }

    fn same_precision(&self, other: &Self) {
        debug_assert_eq!(
            self.value.precision(),
            other.value.precision(),
            "values from different precision contexts were mixed"
        );
    }

    /// `(significand, exponent)` with `self = significand * 2^exponent`, exactly.
    fn parts(&self) -> (BigInt, i64) {
        let repr = self.value.repr();
        (to_bigint(repr.significand()), repr.exponent() as i64)
    }

    fn with_value(&self, value: Float) -> Self {
        Self::rounded(value, self.precision_bits())
    }

    /// Significand bits of this value.
    pub fn precision_bits(&self) -> u32 {
        self.value.precision() as u32
    }

    /// `Less`, `Equal` or `Greater` as this value is negative, zero or positive.
    pub fn signum(&self) -> Ordering {
        self.value.repr().significand().cmp(&IBig::ZERO)
    }

    /// Is this exactly zero.
    pub fn is_zero(&self) -> bool {
        self.signum() == Ordering::Equal
    }

    /// Is this strictly negative.
    pub fn is_negative(&self) -> bool {
        self.signum() == Ordering::Less
    }

    /// Is this strictly positive.
    pub fn is_positive(&self) -> bool {
        self.signum() == Ordering::Greater
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    /// Largest integer not above this value.
    pub fn floor(&self) -> BigInt {
        let (sig, exp) = self.parts();
        if exp >= 0 {
            sig << (exp as u64)
        } else {
            shr_floor(sig, (-exp) as u64)
        }
    }

    /// Smallest integer not below this value.
    pub fn ceil(&self) -> BigInt {
        -(-self).floor()
    }

    /// Nearest integer, halves rounded up.
    pub fn round(&self) -> BigInt {
        let (sig, exp) = self.parts();
        if exp >= 0 {
            sig << (exp as u64)
        } else {
            let shift = (-exp) as u64;
            shr_floor(sig + (BigInt::one() << (shift - 1)), shift)
        }
    }

    /// Multiply by an integer.
    pub fn mul_int(&self, k: &BigInt) -> Self {
        self.with_value(&self.value * &Float::from(to_ibig(k)))
    }

    /// Divide by a nonzero integer.
    pub fn div_int(&self, k: &BigInt) -> Self {
        self.with_value(&self.value / &Float::from(to_ibig(k)))
    }

    /// Half of this value, exactly.
    pub fn half(&self) -> Self {
        self.mul_pow2(-1)
    }

    /// Multiply by `2^e`, exactly.
    pub fn mul_pow2(&self, e: i64) -> Self {
        self.with_value(&self.value * &Float::from_parts(IBig::ONE, e as isize))
    }

    /// `self * self`.
    pub fn square(&self) -> Self {
        self * self
    }

    /// Square root, or `None` for negative values.
    pub fn checked_sqrt(&self) -> Option<Self> {
        if self.is_negative() {
            None
        } else {
            Some(self.with_value(self.value.sqrt()))
        }
    }

    /// Square root. Negative values (which only arise from rounding) are clamped to zero.
    pub fn sqrt(&self) -> Self {
        self.checked_sqrt()
            .unwrap_or_else(|| self.with_value(Float::from(IBig::ZERO)))
    }

    /// The larger of the two.
    pub fn max(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }

    /// The smaller of the two.
    pub fn min(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    /// Nearest `f64`; saturates to infinities, underflows to zero.
    pub fn to_f64(&self) -> f64 {
        let (sig, exp) = self.parts();
        let magnitude = sig.abs();
        let len = magnitude.bits();
        let (top, shift) = if len > 60 {
            (&magnitude >> (len - 60), (len - 60) as i64)
        } else {
            (magnitude, 0)
        };
        let value = ldexp(top.to_f64().unwrap_or(f64::INFINITY), shift + exp);
        if sig.is_negative() {
            -value
        } else {
            value
        }
    }

    /// Approximate base two logarithm of a positive value, `-inf` for zero.
    pub fn log2_approx(&self) -> f64 {
        if !self.is_positive() {
            return f64::NEG_INFINITY;
        }
        let (sig, exp) = self.parts();
        log2_bigint(&sig) + exp as f64
    }

    fn add_ref(&self, rhs: &Self) -> Self {
        self.same_precision(rhs);
        self.with_value(&self.value + &rhs.value)
    }

    fn sub_ref(&self, rhs: &Self) -> Self {
        self.same_precision(rhs);
        self.with_value(&self.value - &rhs.value)
    }

    fn mul_ref(&self, rhs: &Self) -> Self {
        self.same_precision(rhs);
        self.with_value(&self.value * &rhs.value)
    }

    fn div_ref(&self, rhs: &Self) -> Self {
        self.same_precision(rhs);
        self.with_value(&self.value / &rhs.value)
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.same_precision(other);
        self.value.cmp(&other.value)
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Real({:e} @ {} bits)",
            self.to_f64(),
            self.precision_bits()
        )
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}

macro_rules! forward_binop {
    ($imp:ident, $method:ident, $inner:ident) => {
        impl<'a, 'b> $imp<&'b Real> for &'a Real {
            type Output = Real;
            fn $method(self, rhs: &'b Real) -> Real {
                self.$inner(rhs)
            }
        }

        impl<'a> $imp<&'a Real> for Real {
            type Output = Real;
            fn $method(self, rhs: &'a Real) -> Real {
                (&self).$inner(rhs)
            }
        }

        impl<'a> $imp<Real> for &'a Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                self.$inner(&rhs)
            }
        }

        impl $imp<Real> for Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                (&self).$inner(&rhs)
            }
        }
    };
}

forward_binop!(Add, add, add_ref);
forward_binop!(Sub, sub, sub_ref);
forward_binop!(Mul, mul, mul_ref);
forward_binop!(Div, div, div_ref);

impl<'a> AddAssign<&'a Real> for Real {
    fn add_assign(&mut self, rhs: &'a Real) {
        *self = self.add_ref(rhs);
    }
}

impl<'a> SubAssign<&'a Real> for Real {
    fn sub_assign(&mut self, rhs: &'a Real) {
        *self = self.sub_ref(rhs);
    }
}

impl Neg for Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real { value: -self.value }
    }
}

impl<'a> Neg for &'a Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real {
            value: -self.value.clone(),
        }
    }
}
