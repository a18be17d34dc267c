//! Integer number theory: primality, modular square roots and factoring under a budget.

use crate::errors::{SynthResult, SynthesisError};
use log::trace;
use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use rand::rngs::StdRng;
use rand::Rng;

/// Primes below this bound are removed by trial division.
pub const TRIAL_DIVISION_BOUND: u32 = 1 << 10;

const MILLER_RABIN_BASES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
const RANDOM_WITNESSES: usize = 8;
const BRENT_BATCH: u64 = 128;

fn small_primes() -> Vec<u32> {
    let n = TRIAL_DIVISION_BOUND as usize;
    let mut sieve = vec![true; n];
    sieve[0] = false;
    sieve[1] = false;
    let mut i = 2;
    while i * i < n {
        if sieve[i] {
            let mut j = i * i;
            while j < n {
                sieve[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    sieve
        .iter()
        .enumerate()
        .filter(|(_, is_prime)| **is_prime)
        .map(|(p, _)| p as u32)
        .collect()
}

fn random_below(rng: &mut StdRng, n: &BigInt) -> BigInt {
    // Enough random words to cover n, reduced; the slight bias is irrelevant here.
    let words = (n.bits() / 64 + 2) as usize;
    let mut acc = BigInt::zero();
    for _ in 0..words {
        acc = (acc << 64u32) + BigInt::from(rng.gen::<u64>());
    }
    acc.mod_floor(n)
}

fn is_witness(n: &BigInt, d: &BigInt, s: u32, base: &BigInt) -> bool {
    let n_minus_one = n - 1u32;
    let mut x = base.modpow(d, n);
    if x.is_one() || x == n_minus_one {
        return false;
    }
    for _ in 1..s {
        x = (&x * &x).mod_floor(n);
        if x == n_minus_one {
            return false;
        }
    }
    true
}

/// Miller-Rabin with fixed small bases, plus random bases for values beyond their proven range.
pub fn is_probable_prime(n: &BigInt, rng: &mut StdRng) -> bool {
    if n < &BigInt::from(2) {
        return false;
    }
    for p in MILLER_RABIN_BASES {
        let p = BigInt::from(p);
        if n == &p {
            return true;
        }
        if n.is_multiple_of(&p) {
            return false;
        }
    }
    let n_minus_one = n - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0) as u32;
    let d = &n_minus_one >> s;
    if MILLER_RABIN_BASES
        .iter()
        .any(|b| is_witness(n, &d, s, &BigInt::from(*b)))
    {
        return false;
    }
    // The fixed bases are deterministic below 3.3e24.
    if n.bits() > 81 {
        let span = n - 3u32;
        for _ in 0..RANDOM_WITNESSES {
            let base = random_below(rng, &span) + 2u32;
            if is_witness(n, &d, s, &base) {
                return false;
            }
        }
    }
    true
}

/// Legendre symbol `(a/p)` for an odd prime `p`: 1, -1 or 0.
pub fn legendre(a: &BigInt, p: &BigInt) -> i32 {
    let a = a.mod_floor(p);
    if a.is_zero() {
        return 0;
    }
    let e = (p - 1u32) >> 1u32;
    if a.modpow(&e, p).is_one() {
        1
    } else {
        -1
    }
}

/// A square root of `a` modulo an odd prime `p`, or `None` for a non-residue.
///
/// Tonelli-Shanks, searching non-residues upward from 2 so the answer is deterministic.
pub fn sqrt_mod(a: &BigInt, p: &BigInt) -> Option<BigInt> {
    let a = a.mod_floor(p);
    if a.is_zero() {
        return Some(BigInt::zero());
    }
    if legendre(&a, p) != 1 {
        return None;
    }
    let p_minus_one = p - 1u32;
    if p.mod_floor(&BigInt::from(4)) == BigInt::from(3) {
        let e = (p + 1u32) >> 2u32;
        return Some(a.modpow(&e, p));
    }
    let s = p_minus_one.trailing_zeros().unwrap_or(0);
    let q = &p_minus_one >> s;
    let mut z = BigInt::from(2);
    while legendre(&z, p) != -1 {
        z += 1u32;
    }
    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = a.modpow(&q, p);
    let mut r = a.modpow(&((&q + 1u32) >> 1u32), p);
    while !t.is_one() {
        let mut i = 0u64;
        let mut t2 = t.clone();
        while !t2.is_one() {
            t2 = (&t2 * &t2).mod_floor(p);
            i += 1;
            if i == m {
                return None;
            }
        }
        let mut b = c.clone();
        for _ in 0..(m - i - 1) {
            b = (&b * &b).mod_floor(p);
        }
        m = i;
        c = (&b * &b).mod_floor(p);
        t = (&t * &c).mod_floor(p);
        r = (&r * &b).mod_floor(p);
    }
    Some(r)
}

/// Brent's variant of Pollard's rho. Returns a nontrivial factor, or `None` once `budget` is spent.
fn pollard_brent(n: &BigInt, budget: &mut u64, rng: &mut StdRng) -> Option<BigInt> {
    if n.is_even() {
        return Some(BigInt::from(2));
    }
    while *budget > 0 {
        let c = random_below(rng, &(n - 1u32)) + 1u32;
        let mut y = random_below(rng, n);
        let f = |x: &BigInt| (x * x + &c).mod_floor(n);
        let mut r: u64 = 1;
        let mut q = BigInt::one();
        let mut g = BigInt::one();
        let mut x = y.clone();
        let mut ys = y.clone();
        while g.is_one() {
            x = y.clone();
            for _ in 0..r {
                y = f(&y);
            }
            let mut k: u64 = 0;
            while k < r && g.is_one() {
                ys = y.clone();
                let steps = BRENT_BATCH.min(r - k);
                for _ in 0..steps {
                    y = f(&y);
                    q = (&q * (&x - &y).abs()).mod_floor(n);
                }
                g = q.gcd(n);
                k += steps;
                *budget = budget.saturating_sub(steps);
                if *budget == 0 && g.is_one() {
                    return None;
                }
            }
            r *= 2;
        }
        if &g == n {
            // The batch overshot; walk it one step at a time.
            loop {
                if *budget == 0 {
                    return None;
                }
                *budget -= 1;
                ys = f(&ys);
                g = (&x - &ys).abs().gcd(n);
                if !g.is_one() {
                    break;
                }
            }
        }
        if &g != n {
            return Some(g);
        }
    }
    None
}

/// Factor `n >= 1` into `(prime, exponent)` pairs, in increasing prime order.
///
/// Each composite cofactor gets `effort` Pollard iterations. Running out yields
/// [`SynthesisError::FactorizationTimeout`].
pub fn factor(n: &BigInt, effort: u64, rng: &mut StdRng) -> SynthResult<Vec<(BigInt, u32)>> {
    if !n.is_positive() {
        return Err(SynthesisError::invariant(format!(
            "cannot factor non-positive {}",
            n
        )));
    }
    let mut found: Vec<BigInt> = Vec::new();
    let mut rest = n.clone();
    for p in small_primes() {
        let p = BigInt::from(p);
        while rest.is_multiple_of(&p) {
            rest = &rest / &p;
            found.push(p.clone());
        }
        if rest.is_one() {
            break;
        }
    }

    let bound = BigInt::from(TRIAL_DIVISION_BOUND);
    let mut stack = vec![rest];
    while let Some(m) = stack.pop() {
        if m.is_one() {
            continue;
        }
        if &m < &(&bound * &bound) || is_probable_prime(&m, rng) {
            found.push(m);
            continue;
        }
        let root = m.sqrt();
        if &root * &root == m {
            stack.push(root.clone());
            stack.push(root);
            continue;
        }
        let mut budget = effort;
        match pollard_brent(&m, &mut budget, rng) {
            Some(d) => {
                trace!("split {} bits into {} bits", m.bits(), d.bits());
                stack.push(&m / &d);
                stack.push(d);
            }
            None => {
                return Err(SynthesisError::FactorizationTimeout {
                    value: m.to_string(),
                    effort,
                })
            }
        }
    }

    found.sort();
    let mut out: Vec<(BigInt, u32)> = Vec::new();
    for p in found {
        match out.last_mut() {
            Some((q, e)) if *q == p => *e += 1,
            _ => out.push((p, 1)),
        }
    }
    Ok(out)
}

/// `p mod 8` for a positive prime.
pub fn residue_mod8(p: &BigInt) -> u32 {
    p.mod_floor(&BigInt::from(8)).to_u32().unwrap_or(0)
}
