use gridsynth::exact_synthesis::decompose;
use gridsynth::prelude::*;
use gridsynth::ring::{DOmega, ZOmega};

fn unitary(word: &str) -> DOmegaUnitary {
    DOmegaUnitary::from_gates(&word.parse().unwrap())
}

#[test]
fn test_decompose_reproduces_unitary() -> SynthResult<()> {
    for word in [
        "HTHTHTHTHTHTHTHTHTHTHTHTHTHTHTHT",
        "SHTHTXHTSHTHW",
        "THTHSHTHTHTHTHSHTXHTHTHTHTHTHTHTSHT",
        "WWXHSSH",
    ] {
        let u = unitary(word);
        let gates = decompose(&u)?;
        assert_eq!(DOmegaUnitary::from_gates(&gates), u, "{}", word);
    }
    Ok(())
}

#[test]
fn test_decompose_is_deterministic() -> SynthResult<()> {
    let u = unitary("HTHTSHTHTHTXHT");
    assert_eq!(decompose(&u)?, decompose(&u)?);
    Ok(())
}

#[test]
fn test_from_column_builds_exact_unitaries() -> SynthResult<()> {
    // z = (1 + ω)/2 and w = (1 - ω)/2 have |z|² + |w|² = 1.
    let z = DOmega::new(ZOmega::new(0, 0, 1, 1), 2);
    let w = DOmega::new(ZOmega::new(0, 0, -1, 1), 2);
    let u = DOmegaUnitary::from_column(z.clone(), w);
    assert!(u.is_unitary());
    assert_eq!(u.n(), 0);
    assert_eq!(u.z(), &z);
    let gates = decompose(&u)?;
    assert_eq!(DOmegaUnitary::from_gates(&gates), u);
    Ok(())
}

#[test]
fn test_search_results_decompose_exactly() -> SynthResult<()> {
    let config = GridSynthConfig::new("2.2", "1e-6")?;
    let result = gridsynth(&config)?;
    let u = DOmegaUnitary::from_gates(&result.gates);
    assert!(u.is_unitary());
    assert_eq!(u.n(), 0);
    assert_eq!(decompose(&u)?, result.gates);
    Ok(())
}
