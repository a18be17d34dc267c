#![forbid(unsafe_code)]
#![warn(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    missing_docs
)]

//! Approximate single-qubit z-rotations with Clifford+T circuits.
//!
//! Given an angle `θ` and a tolerance `ε`, [`gridsynth`] finds a sequence of `H`, `T`, `S`,
//! `X` and `W` (global phase `ω = e^{iπ/4}`) gates whose product is within `ε` of
//! `Rz(θ) = diag(e^{-iθ/2}, e^{iθ/2})` in operator norm, following the grid-problem method of
//! Ross and Selinger. All matrix entries are kept exactly in `Z[1/√2, i]`; only the geometric
//! search runs on arbitrary precision floats, at a precision derived from `ε` and `θ`.
//!
//! # Example
//! ```
//! use gridsynth::prelude::*;
//!
//! # fn main() -> SynthResult<()> {
//! let config = GridSynthConfig::new("0.5", "1e-4")?;
//! let result = gridsynth(&config)?;
//!
//! // The gates multiply out exactly to a unitary within epsilon of Rz(0.5).
//! let ctx = config.context();
//! let theta = config.theta.to_real(&ctx);
//! let distance = DOmegaUnitary::from_gates(&result.gates).distance_to_rz(&ctx, &theta);
//! assert!(distance.to_f64() <= 1e-4);
//! println!("{} ({} T gates)", result.gates, result.t_count);
//! # Ok(())
//! # }
//! ```
//!
//! Gate sequences read as operator products: `"HT"` is the matrix `H·T`, so the `T` acts
//! first on a state.

/// Clifford+T decomposition of exact unitaries.
pub mod exact_synthesis;
/// The grid problems behind the candidate search.
pub mod grid;
/// Primality, modular square roots and bounded factoring.
pub mod number_theory;
/// Arbitrary precision reals and parsed real literals.
pub mod precision;
/// The rings `Z[√2]`, `Z[ω]` and their dyadic extensions.
pub mod ring;
/// Gates, gate sequences and exact unitaries.
pub mod unitary;

/// Norm equations over `Z[ω]`.
pub mod diophantine;

/// Synthesis configuration.
pub mod config;
/// Error types.
pub mod errors;
/// The approximation search.
pub mod gridsynth;

mod rayon_helper;

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::config::GridSynthConfig;
    pub use crate::errors::{SynthResult, SynthesisError};
    pub use crate::gridsynth::{gridsynth, gridsynth_gates, GridSynthResult};
    pub use crate::precision::{Context, Literal, Real};
    pub use crate::unitary::{DOmegaUnitary, Gate, GateSequence};
}

pub use self::config::GridSynthConfig;
pub use self::errors::{SynthResult, SynthesisError};
pub use self::gridsynth::{gridsynth, gridsynth_gates, GridSynthResult};
pub use self::unitary::{DOmegaUnitary, Gate, GateSequence};
