//! Parameters of one synthesis run.

use crate::errors::{SynthResult, SynthesisError};
use crate::precision::{Context, Literal};

/// Default iteration budget for each cofactor handed to Pollard's rho.
pub const DEFAULT_FACTORING_EFFORT: u64 = 25_000;
/// Default number of factoring timeouts tolerated before the effort is doubled.
pub const DEFAULT_EFFORT_GROWTH_THRESHOLD: usize = 16;
/// Default largest denominator exponent searched.
pub const DEFAULT_MAX_DENOMEXP: u32 = 400;
/// Default number of candidates sent to the Diophantine solver together.
pub const DEFAULT_BATCH_SIZE: usize = 8;
/// Default seed for the randomized parts of factoring.
pub const DEFAULT_SEED: u64 = 1234;
/// Default number of times a precision failure is retried at raised precision.
pub const DEFAULT_PRECISION_RETRIES: u32 = 3;

/// Configuration of a single `Rz(θ)` approximation.
///
/// ```
/// use gridsynth::GridSynthConfig;
/// let config = GridSynthConfig::new("pi/128", "1e-10")
///     .unwrap()
///     .with_seed(7)
///     .with_digits(80);
/// assert_eq!(config.digits, Some(80));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSynthConfig {
    /// Rotation angle in radians.
    pub theta: Literal,
    /// Operator norm tolerance, strictly between 0 and 1.
    pub epsilon: Literal,
    /// Working decimal digits, derived from `epsilon` when `None`.
    pub digits: Option<u32>,
    /// Pollard iterations per cofactor before a candidate is given up on.
    pub factoring_effort: u64,
    /// Timeouts after which `factoring_effort` is doubled.
    pub effort_growth_threshold: usize,
    /// Largest denominator exponent searched.
    pub max_denomexp: u32,
    /// Candidates solved together, in parallel with the `parallel` feature.
    pub batch_size: usize,
    /// Seed for the randomized parts of factoring.
    pub seed: u64,
    /// Raised precision attempts for comparisons too close to call.
    pub precision_retries: u32,
    /// Recheck the final gate sequence at raised precision.
    pub verify: bool,
}

impl GridSynthConfig {
    /// Parse `theta` and `epsilon` from literals such as `"0.5"`, `"1e-10"` or `"pi/8"`.
    pub fn new(theta: &str, epsilon: &str) -> SynthResult<Self> {
        Ok(Self::from_literals(
            Literal::parse(theta)?,
            Literal::parse(epsilon)?,
        ))
    }

    /// Use the exact values of two `f64`s.
    pub fn from_f64(theta: f64, epsilon: f64) -> SynthResult<Self> {
        Ok(Self::from_literals(
            Literal::from_f64(theta)?,
            Literal::from_f64(epsilon)?,
        ))
    }

    /// Use already parsed literals, with default search parameters.
    pub fn from_literals(theta: Literal, epsilon: Literal) -> Self {
        Self {
            theta,
            epsilon,
            digits: None,
            factoring_effort: DEFAULT_FACTORING_EFFORT,
            effort_growth_threshold: DEFAULT_EFFORT_GROWTH_THRESHOLD,
            max_denomexp: DEFAULT_MAX_DENOMEXP,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: DEFAULT_SEED,
            precision_retries: DEFAULT_PRECISION_RETRIES,
            verify: true,
        }
    }

    /// Fix the working precision.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = Some(digits);
        self
    }

    /// Set [`GridSynthConfig::factoring_effort`].
    pub fn with_factoring_effort(mut self, effort: u64) -> Self {
        self.factoring_effort = effort;
        self
    }

    /// Set [`GridSynthConfig::effort_growth_threshold`].
    pub fn with_effort_growth_threshold(mut self, threshold: usize) -> Self {
        self.effort_growth_threshold = threshold;
        self
    }

    /// Set [`GridSynthConfig::max_denomexp`].
    pub fn with_max_denomexp(mut self, k: u32) -> Self {
        self.max_denomexp = k;
        self
    }

    /// Set [`GridSynthConfig::batch_size`].
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set [`GridSynthConfig::seed`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set [`GridSynthConfig::precision_retries`].
    pub fn with_precision_retries(mut self, retries: u32) -> Self {
        self.precision_retries = retries;
        self
    }

    /// Turn the final independent check on or off.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Reject inputs no search could satisfy.
    pub fn validate(&self) -> SynthResult<()> {
        if !self.epsilon.is_open_unit() {
            return Err(SynthesisError::domain(format!(
                "epsilon must be strictly between 0 and 1, got {}",
                self.epsilon
            )));
        }
        if self.batch_size == 0 {
            return Err(SynthesisError::domain("batch size must be positive"));
        }
        if self.factoring_effort == 0 {
            return Err(SynthesisError::domain("factoring effort must be positive"));
        }
        Ok(())
    }

    /// The working precision: the explicit override, or one derived from `epsilon` and
    /// widened by the digits of `theta` lost when it is reduced modulo `2π`.
    pub fn context(&self) -> Context {
        match self.digits {
            Some(digits) => Context::with_digits(digits),
            None => {
                let eps_digits = (self.epsilon.neg_log10() - 1e-9).ceil().max(1.0) as u32;
                Context::for_epsilon_digits(eps_digits).widened(self.theta.magnitude_digits())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_epsilon() {
        for eps in ["0", "1", "1.5", "-0.1", "pi/8"] {
            let config = GridSynthConfig::new("0.5", eps).unwrap();
            assert!(
                matches!(config.validate(), Err(SynthesisError::Domain(_))),
                "{}",
                eps
            );
        }
        for eps in ["0.999", "1e-3", "1e-30"] {
            assert!(GridSynthConfig::new("0.5", eps).unwrap().validate().is_ok());
        }
    }

    #[test]
    fn test_validate_search_parameters() {
        let config = GridSynthConfig::new("0.5", "0.1").unwrap();
        assert!(config.clone().with_batch_size(0).validate().is_err());
        assert!(config.with_factoring_effort(0).validate().is_err());
    }

    #[test]
    fn test_derived_digits() {
        let config = GridSynthConfig::new("0.5", "1e-10").unwrap();
        assert_eq!(config.context().digits(), 60);
        let config = config.with_digits(35);
        assert_eq!(config.context().digits(), 35);
        // Large angles get the digits their reduction modulo 2π cancels.
        let config = GridSynthConfig::new("1e40", "1e-3").unwrap();
        assert_eq!(config.context().digits(), 32 + 40);
        let config = GridSynthConfig::new("-123.5", "1e-3").unwrap();
        assert_eq!(config.context().digits(), 32 + 3);
    }

    #[test]
    fn test_from_f64() {
        let config = GridSynthConfig::from_f64(0.5, 0.25).unwrap();
        let ctx = Context::with_digits(20);
        assert_eq!(config.theta.to_real(&ctx), ctx.parse("0.5").unwrap());
        assert!(GridSynthConfig::from_f64(f64::NAN, 0.1).is_err());
    }
}
