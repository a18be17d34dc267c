use thiserror::Error;

/// Everything that can go wrong while synthesizing a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// The requested angle or tolerance is outside of the supported domain.
    #[error("domain error: {0}")]
    Domain(String),
    /// A numeric decision could not be made at the current working precision.
    #[error("insufficient working precision ({digits} digits): {message}")]
    Precision {
        /// Working precision in decimal digits.
        digits: u32,
        /// What was being decided.
        message: String,
    },
    /// The value is not the norm of any element of the extended ring.
    #[error("{0} is not representable as a norm")]
    NotRepresentable(String),
    /// The factoring budget ran out before the cofactor was fully factored.
    #[error("factoring gave up on {value} after {effort} iterations")]
    FactorizationTimeout {
        /// The cofactor that could not be split.
        value: String,
        /// Iterations spent.
        effort: u64,
    },
    /// No candidate was accepted before the maximum denominator exponent.
    #[error("search exhausted after {0} denominator exponents")]
    SearchExhausted(u32),
    /// An internal invariant failed. This is a bug.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl SynthesisError {
    /// Make a new domain error.
    pub fn domain<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Domain(msg.into())
    }

    /// Make a new invariant violation.
    pub fn invariant<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvariantViolation(msg.into())
    }

    /// True for the outcomes the orchestrator recovers from by moving on to the next candidate.
    pub fn is_candidate_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotRepresentable(_) | Self::FactorizationTimeout { .. }
        )
    }
}

/// A result which may contain a synthesis error.
pub type SynthResult<T> = Result<T, SynthesisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_recoverable() {
        assert!(SynthesisError::NotRepresentable("7".into()).is_candidate_rejection());
        assert!(SynthesisError::FactorizationTimeout {
            value: "91".into(),
            effort: 3
        }
        .is_candidate_rejection());
        assert!(!SynthesisError::domain("eps").is_candidate_rejection());
        assert!(!SynthesisError::SearchExhausted(4).is_candidate_rejection());
    }

    #[test]
    fn display_messages() {
        let err = SynthesisError::Precision {
            digits: 40,
            message: "error bound".into(),
        };
        assert_eq!(
            err.to_string(),
            "insufficient working precision (40 digits): error bound"
        );
    }
}
