//! Exact decomposition of a unitary over `D[ω]` into Clifford+T gates.
//!
//! Every step multiplies by `H T^-j` on the left, which lowers the smallest denominator
//! exponent of `|z|²` by one. Above `SDE_GREEDY_FLOOR` one of `j = 0..4` always works; below
//! it a short breadth first search finds the way down to a Clifford, which is then read off
//! directly.

use crate::errors::{SynthResult, SynthesisError};
use crate::unitary::{DOmegaUnitary, Gate, GateSequence};
use log::trace;
use std::collections::VecDeque;

/// Denominator exponent from which the greedy step is guaranteed to make progress.
const SDE_GREEDY_FLOOR: u32 = 4;
/// Longest run of `T^j H` blocks the final search tries.
const MAX_SEARCH_DEPTH: usize = 6;

/// Append `T^j` written with `S` and `T`.
fn push_t_power(seq: &mut GateSequence, j: u32) {
    for _ in 0..(j / 2) {
        seq.push(Gate::S);
    }
    if j % 2 == 1 {
        seq.push(Gate::T);
    }
}

/// `H T^-j U`.
fn reduce_step(u: &DOmegaUnitary, j: u32) -> DOmegaUnitary {
    u.left_mul_t_pow(-i64::from(j)).left_mul(Gate::H)
}

fn greedy(mut u: DOmegaUnitary, seq: &mut GateSequence) -> SynthResult<DOmegaUnitary> {
    loop {
        let sde = u.sde_abs_z_sq();
        if sde < SDE_GREEDY_FLOOR {
            return Ok(u);
        }
        let (j, next) = (0..4)
            .map(|j| (j, reduce_step(&u, j)))
            .find(|(_, v)| v.sde_abs_z_sq() < sde)
            .ok_or_else(|| {
                SynthesisError::invariant(format!("no reducing step at sde {} for {}", sde, u))
            })?;
        push_t_power(seq, j);
        seq.push(Gate::H);
        u = next;
    }
}

/// Shortest list of `j`s taking `u` to denominator exponent zero.
fn search(u: &DOmegaUnitary) -> SynthResult<(Vec<u32>, DOmegaUnitary)> {
    let mut seen = vec![u.clone()];
    let mut queue = VecDeque::new();
    queue.push_back((u.clone(), vec![]));
    while let Some((v, path)) = queue.pop_front() {
        if v.sde_abs_z_sq() == 0 {
            return Ok((path, v));
        }
        if path.len() >= MAX_SEARCH_DEPTH {
            continue;
        }
        for j in 0..4 {
            let next = reduce_step(&v, j);
            if seen.contains(&next) {
                continue;
            }
            seen.push(next.clone());
            let mut p = path.clone();
            p.push(j);
            queue.push_back((next, p));
        }
    }
    Err(SynthesisError::invariant(format!(
        "{} not reduced to a Clifford within {} steps",
        u, MAX_SEARCH_DEPTH
    )))
}

/// Gates whose words reach every Clifford with entries in `Z[ω]` and even `n`.
const TAIL_GATES: [Gate; 3] = [Gate::X, Gate::S, Gate::W];

/// Emit a shortest word for a unitary with entries in `Z[ω]`.
///
/// Such a unitary is `X^b W^a T^m`. An odd `m` costs exactly one `T`, peeled off first; the
/// Clifford rest is found by a breadth first search over `X`, `S` and `W`.
fn clifford_tail(u: DOmegaUnitary, seq: &mut GateSequence) -> SynthResult<()> {
    let target = if u.n() % 2 == 1 {
        seq.push(Gate::T);
        u.left_mul_t_pow(-1)
    } else {
        u
    };
    let mut seen = vec![DOmegaUnitary::identity()];
    let mut queue = VecDeque::new();
    queue.push_back((DOmegaUnitary::identity(), Vec::new()));
    while let Some((v, word)) = queue.pop_front() {
        if v == target {
            for gate in word {
                seq.push(gate);
            }
            return Ok(());
        }
        for gate in TAIL_GATES {
            let next = v.left_mul(gate);
            if seen.contains(&next) {
                continue;
            }
            seen.push(next.clone());
            let mut w = Vec::with_capacity(word.len() + 1);
            w.push(gate);
            w.extend_from_slice(&word);
            queue.push_back((next, w));
        }
    }
    Err(SynthesisError::invariant(format!(
        "{} is not a Clifford",
        target
    )))
}

/// A gate sequence whose product is exactly `u`.
///
/// The result is checked by multiplying it back out, so an `Ok` value always reproduces `u`.
pub fn decompose(u: &DOmegaUnitary) -> SynthResult<GateSequence> {
    if !u.is_unitary() {
        return Err(SynthesisError::invariant(format!("{} is not unitary", u)));
    }
    let mut seq = GateSequence::new();
    let rest = greedy(u.clone(), &mut seq)?;
    let (path, clifford) = search(&rest)?;
    for j in path {
        push_t_power(&mut seq, j);
        seq.push(Gate::H);
    }
    clifford_tail(clifford, &mut seq)?;
    trace!("decomposed {} into {} gates", u, seq.len());

    if &DOmegaUnitary::from_gates(&seq) != u {
        return Err(SynthesisError::invariant(format!(
            "decomposition {} does not reproduce {}",
            seq, u
        )));
    }
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::DOmega;
    use rand::prelude::*;

    fn round_trip(word: &str) -> GateSequence {
        let u = DOmegaUnitary::from_gates(&word.parse().unwrap());
        let seq = decompose(&u).unwrap();
        assert_eq!(DOmegaUnitary::from_gates(&seq), u, "{} -> {}", word, seq);
        seq
    }

    #[test]
    fn test_identity() {
        assert!(round_trip("").is_empty());
        assert!(round_trip("HH").is_empty());
    }

    #[test]
    fn test_cliffords() {
        for word in ["H", "S", "X", "W", "HSH", "SX", "XW", "WWW", "HXS"] {
            let seq = round_trip(word);
            assert_eq!(seq.t_count(), 0, "{}", word);
        }
    }

    #[test]
    fn test_clifford_phases_are_short() {
        // ω^7 diag(1, i) used to come out as seven W gates and an S.
        let long: GateSequence = "WWWWWWWS".parse().unwrap();
        let seq = decompose(&DOmegaUnitary::from_gates(&long)).unwrap();
        assert!(seq.len() <= 6, "{}", seq);
        for a in 0..8 {
            for m in 0..8 {
                let mut word = "W".repeat(a);
                word.push_str(&"T".repeat(m));
                let seq = round_trip(&word);
                assert!(seq.t_count() <= 1, "{} -> {}", word, seq);
                assert!(seq.len() <= 9, "{} -> {}", word, seq);
            }
        }
    }

    #[test]
    fn test_t_count_not_increased() {
        for word in ["T", "HT", "THTHT", "HTHTHTHTHTHTHT"] {
            let seq = round_trip(word);
            let original: GateSequence = word.parse().unwrap();
            assert!(seq.t_count() <= original.t_count(), "{} -> {}", word, seq);
        }
    }

    #[test]
    fn test_random_words() {
        let mut rng = StdRng::seed_from_u64(7);
        let alphabet = ['H', 'T', 'S', 'X', 'W'];
        for _ in 0..200 {
            let len = rng.gen_range(0..60);
            let word: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            round_trip(&word);
        }
    }

    #[test]
    fn test_rejects_non_unitary() {
        let u = DOmegaUnitary::new(DOmega::from_int(2), DOmega::zero(), 0);
        assert!(matches!(
            decompose(&u),
            Err(SynthesisError::InvariantViolation(_))
        ));
    }
}
