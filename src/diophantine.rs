//! Solving `t† t = ξ` for `t` in `Z[ω]` or `D[ω]`.
//!
//! The integer norm of `ξ` is factored, each rational prime is lifted to a prime of `Z[√2]`
//! and then, where it splits further, to a prime of `Z[ω]`. Primes `p ≡ 7 (mod 8)` do not
//! split in `Z[ω]`, so they must divide `ξ` to even powers. The remaining unit is a power
//! of `λ²` whose square root is absorbed into `t`.

use crate::errors::{SynthResult, SynthesisError};
use crate::number_theory::{factor, residue_mod8, sqrt_mod};
use crate::ring::{DOmega, DRootTwo, ZOmega, ZRootTwo};
use log::trace;
use num::{BigInt, Signed};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;

fn not_representable(xi: &ZRootTwo) -> SynthesisError {
    SynthesisError::NotRepresentable(xi.to_string())
}

fn zomega_pow(x: &ZOmega, e: u32) -> ZOmega {
    let mut acc = ZOmega::one();
    for _ in 0..e {
        acc = &acc * x;
    }
    acc
}

/// A gcd whose norm is checked against `expected`, trying both argument orders.
fn checked_gcd(a: &ZOmega, b: &ZOmega, expected: &BigInt) -> SynthResult<ZOmega> {
    for g in [a.gcd(b), b.gcd(a)] {
        if &g.norm() == expected {
            return Ok(g);
        }
    }
    Err(SynthesisError::invariant(format!(
        "no prime of norm {} found dividing {} and {}",
        expected, a, b
    )))
}

/// A prime `η` of `Z[√2]` above `p ≡ ±1 (mod 8)`, with `|N(η)| = p`.
fn prime_above(p: &BigInt) -> SynthResult<ZRootTwo> {
    let r = sqrt_mod(&BigInt::from(2), p)
        .ok_or_else(|| SynthesisError::invariant(format!("2 is not a square modulo {}", p)))?;
    let eta = ZRootTwo::from_int(p.clone()).gcd(&ZRootTwo::new(r, 1));
    if &eta.norm().abs() != p {
        return Err(SynthesisError::invariant(format!("failed to split {}", p)));
    }
    Ok(eta)
}

/// A prime `π` of `Z[ω]` with `π†π = p` up to a unit, for an inert `p ≡ ±3 (mod 8)`.
fn prime_above_inert(p: &BigInt) -> SynthResult<ZOmega> {
    let pz = ZOmega::from_int(p.clone());
    let witness = if residue_mod8(p) == 5 {
        // u² ≡ -1, so p divides (u + i)(u - i).
        let u = sqrt_mod(&BigInt::from(-1), p)
            .ok_or_else(|| SynthesisError::invariant(format!("-1 is not a square mod {}", p)))?;
        &ZOmega::from_int(u) + &ZOmega::i()
    } else {
        // u² ≡ -2, so p divides (u + i√2)(u - i√2), where i√2 = ω + ω³.
        let u = sqrt_mod(&BigInt::from(-2), p)
            .ok_or_else(|| SynthesisError::invariant(format!("-2 is not a square mod {}", p)))?;
        &ZOmega::from_int(u) + &ZOmega::new(1, 0, 1, 0)
    };
    checked_gcd(&pz, &witness, &(p * p))
}

/// A prime `π` of `Z[ω]` with `π†π = η` up to a unit, for `η` above `p ≡ 1 (mod 8)`.
fn prime_above_split(eta: &ZRootTwo, p: &BigInt) -> SynthResult<ZOmega> {
    let u = sqrt_mod(&BigInt::from(-1), p)
        .ok_or_else(|| SynthesisError::invariant(format!("-1 is not a square mod {}", p)))?;
    let witness = &ZOmega::from_int(u) + &ZOmega::i();
    checked_gcd(&ZOmega::from_zroottwo(eta), &witness, p)
}

/// How many times `d` divides `x`, at most `limit`.
fn valuation(x: &ZRootTwo, d: &ZRootTwo, limit: u32) -> u32 {
    let mut x = x.clone();
    let mut v = 0;
    while v < limit {
        match x.exact_div(d) {
            Some(q) => {
                x = q;
                v += 1;
            }
            None => break,
        }
    }
    v
}

/// `m` with `unit = λ^(2m)`, or `None` if the unit has another form.
fn half_lambda_log(unit: &ZRootTwo) -> Option<i64> {
    if unit.norm() != BigInt::from(1) || !unit.is_doubly_nonnegative() {
        return None;
    }
    let one = ZRootTwo::one();
    let up = ZRootTwo::lambda_pow(2);
    let down = ZRootTwo::lambda_pow(-2);
    let mut v = unit.clone();
    let mut m = 0i64;
    loop {
        match (&v - &one).signum() {
            Ordering::Equal => return Some(m),
            Ordering::Greater => {
                v = &v * &down;
                m += 1;
                if (&v - &one).signum() == Ordering::Less {
                    return None;
                }
            }
            Ordering::Less => {
                v = &v * &up;
                m -= 1;
                if (&v - &one).signum() == Ordering::Greater {
                    return None;
                }
            }
        }
    }
}

/// Find `t ∈ Z[ω]` with `t† t = xi`.
///
/// Fails with [`SynthesisError::NotRepresentable`] when no such `t` exists and with
/// [`SynthesisError::FactorizationTimeout`] when the norm of `xi` could not be factored
/// within `effort` iterations per cofactor.
pub fn solve_zroottwo(xi: &ZRootTwo, effort: u64, rng: &mut StdRng) -> SynthResult<ZOmega> {
    if xi.is_zero() {
        return Ok(ZOmega::zero());
    }
    if !xi.is_doubly_nonnegative() {
        return Err(not_representable(xi));
    }
    let n = xi.norm().abs();
    let factors = factor(&n, effort, rng)?;
    trace!("norm of {} has {} prime factors", xi, factors.len());

    let mut t = ZOmega::one();
    for (p, e) in factors {
        if p == BigInt::from(2) {
            // √2 ramifies: (1 - ω)†(1 - ω) = √2 λ⁻¹.
            let delta = ZOmega::new(0, 0, -1, 1);
            t = &t * &zomega_pow(&delta, e);
            continue;
        }
        match residue_mod8(&p) {
            3 | 5 => {
                if e % 2 == 1 {
                    return Err(SynthesisError::invariant(format!(
                        "inert prime {} has odd exponent in the norm of {}",
                        p, xi
                    )));
                }
                let pi = prime_above_inert(&p)?;
                t = &t * &zomega_pow(&pi, e / 2);
            }
            _ => {
                let eta = prime_above(&p)?;
                let eta_bullet = eta.conj_sq2();
                let e1 = valuation(xi, &eta, e);
                let e2 = valuation(xi, &eta_bullet, e - e1);
                if e1 + e2 != e {
                    return Err(SynthesisError::invariant(format!(
                        "valuations {} + {} of {} at {} do not add to {}",
                        e1, e2, xi, p, e
                    )));
                }
                if residue_mod8(&p) == 7 {
                    if e1 % 2 == 1 || e2 % 2 == 1 {
                        return Err(not_representable(xi));
                    }
                    let half = &zomega_pow(&ZOmega::from_zroottwo(&eta), e1 / 2)
                        * &zomega_pow(&ZOmega::from_zroottwo(&eta_bullet), e2 / 2);
                    t = &t * &half;
                } else {
                    let pi = prime_above_split(&eta, &p)?;
                    let split = &zomega_pow(&pi, e1) * &zomega_pow(&pi.conj_sq2(), e2);
                    t = &t * &split;
                }
            }
        }
    }

    let tt = (&t.conj() * &t)
        .to_zroottwo()
        .ok_or_else(|| SynthesisError::invariant("t†t is not real"))?;
    let unit = xi
        .exact_div(&tt)
        .ok_or_else(|| SynthesisError::invariant(format!("{} does not divide {}", tt, xi)))?;
    let m = half_lambda_log(&unit).ok_or_else(|| not_representable(xi))?;
    let t = &t * &ZOmega::from_zroottwo(&ZRootTwo::lambda_pow(m));

    if &t.conj() * &t != ZOmega::from_zroottwo(xi) {
        return Err(SynthesisError::invariant(format!(
            "solution {} does not square to {}",
            t, xi
        )));
    }
    Ok(t)
}

/// Find `t ∈ D[ω]` with `t† t = xi`.
///
/// The random choices made while factoring come from `seed`, so equal inputs give equal
/// outputs.
pub fn solve_droottwo(xi: &DRootTwo, effort: u64, seed: u64) -> SynthResult<DOmega> {
    let xi = xi.reduce();
    let mut rng = StdRng::seed_from_u64(seed);
    let k = xi.k();
    if k % 2 == 0 {
        let t = solve_zroottwo(xi.alpha(), effort, &mut rng)?;
        Ok(DOmega::new(t, k / 2).reduce())
    } else {
        let t = solve_zroottwo(&xi.alpha().mul_sqrt2(), effort, &mut rng)?;
        Ok(DOmega::new(t, (k + 1) / 2).reduce())
    }
}
