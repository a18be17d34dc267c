use gridsynth::prelude::*;

/// Distance between the gates and `Rz(theta)` at twice the working precision of the search.
fn independent_distance(config: &GridSynthConfig, result: &GridSynthResult) -> (Real, Real) {
    let ctx = Context::with_digits(2 * result.digits);
    let theta = config.theta.to_real(&ctx);
    let epsilon = config.epsilon.to_real(&ctx);
    let distance = DOmegaUnitary::from_gates(&result.gates).distance_to_rz(&ctx, &theta);
    (distance, epsilon)
}

#[test]
fn test_half_radian_tight_tolerance() -> SynthResult<()> {
    let config = GridSynthConfig::new("0.5", "1e-10")?;
    let result = gridsynth(&config)?;
    assert!(!result.gates.is_empty());
    assert_eq!(result.gate_count, result.gates.len());
    assert_eq!(result.t_count, result.gates.t_count());

    let (distance, epsilon) = independent_distance(&config, &result);
    assert!(distance <= epsilon, "{} > {}", distance, epsilon);

    let again = gridsynth(&config)?;
    assert_eq!(again.gates, result.gates);
    Ok(())
}

#[test]
fn test_zero_angle_gives_identity() -> SynthResult<()> {
    let config = GridSynthConfig::new("0", "1e-6")?;
    let result = gridsynth(&config)?;
    assert_eq!(result.t_count, 0);
    assert!(result.gates.len() <= 2, "{}", result.gates);
    let (distance, epsilon) = independent_distance(&config, &result);
    assert!(distance <= epsilon);
    Ok(())
}

#[test]
fn test_invalid_epsilon() {
    for eps in ["0", "1.5", "-1e-3"] {
        let err = gridsynth_gates("0.5", eps).unwrap_err();
        assert!(matches!(err, SynthesisError::Domain(_)), "{}", err);
    }
    assert!(matches!(
        gridsynth_gates("0.5", "abc"),
        Err(SynthesisError::Domain(_))
    ));
}

#[test]
fn test_angles_in_pi_notation() -> SynthResult<()> {
    for theta in ["pi/8", "-pi/3", "3*pi/4", "pi"] {
        let config = GridSynthConfig::new(theta, "1e-5")?;
        let result = gridsynth(&config)?;
        let (distance, epsilon) = independent_distance(&config, &result);
        assert!(distance <= epsilon, "theta = {}", theta);
    }
    Ok(())
}

#[test]
fn test_exact_angles_need_no_search() -> SynthResult<()> {
    // Rz(π/2) = diag(ω⁻¹, ω) is exact over the ring.
    let config = GridSynthConfig::new("pi/2", "1e-8")?;
    let result = gridsynth(&config)?;
    assert_eq!(result.denomexp, 0);
    assert_eq!(result.t_count, 0);
    assert!(result.error.to_f64() < 1e-15);
    Ok(())
}

#[test]
fn test_t_count_grows_as_epsilon_shrinks() -> SynthResult<()> {
    let loose = gridsynth(&GridSynthConfig::new("1.3", "1e-2")?)?;
    let tight = gridsynth(&GridSynthConfig::new("1.3", "1e-8")?)?;
    assert!(tight.t_count > loose.t_count);
    assert!(tight.denomexp > loose.denomexp);
    Ok(())
}

#[test]
fn test_f64_inputs_and_explicit_digits() -> SynthResult<()> {
    let config = GridSynthConfig::from_f64(0.25, 1e-6)?.with_digits(64).with_seed(99);
    let result = gridsynth(&config)?;
    assert_eq!(result.digits, 64);
    let (distance, epsilon) = independent_distance(&config, &result);
    assert!(distance <= epsilon);
    Ok(())
}

#[test]
fn test_gate_string_round_trip() -> SynthResult<()> {
    let gates = gridsynth_gates("0.9", "1e-4")?;
    let parsed: GateSequence = gates.to_string().parse()?;
    assert_eq!(parsed, gates);
    Ok(())
}

#[test]
fn test_huge_angles_are_reduced_accurately() -> SynthResult<()> {
    for theta in ["1e40", "-3.5e65"] {
        let config = GridSynthConfig::new(theta, "1e-3")?;
        let result = gridsynth(&config)?;
        assert!(result.digits > 40, "{} digits", result.digits);
        let (distance, epsilon) = independent_distance(&config, &result);
        assert!(distance <= epsilon, "theta = {}: {} > {}", theta, distance, epsilon);
    }
    Ok(())
}

#[test]
fn test_loose_tolerance_gives_clifford() -> SynthResult<()> {
    let config = GridSynthConfig::new("0.5", "0.999")?;
    let result = gridsynth(&config)?;
    assert_eq!(result.t_count, 0);
    assert_eq!(result.denomexp, 0);
    assert!(result.gates.len() <= 8, "{}", result.gates);
    let (distance, epsilon) = independent_distance(&config, &result);
    assert!(distance <= epsilon);
    Ok(())
}

#[test]
fn test_tolerances_below_and_above_grid_spacing() -> SynthResult<()> {
    // Both need several reduction rounds on the disk side, whose ellipse has no skew term.
    for eps in ["1e-3", "1e-10"] {
        let config = GridSynthConfig::new("0.5", eps)?;
        let result = gridsynth(&config)?;
        let (distance, epsilon) = independent_distance(&config, &result);
        assert!(distance <= epsilon, "eps = {}", eps);
    }
    Ok(())
}
