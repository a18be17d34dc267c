//! Clifford+T gates, gate sequences and exact unitaries over `D[ω]`.

use crate::errors::{SynthResult, SynthesisError};
use crate::precision::{Context, Real};
use crate::ring::{DOmega, DRootTwo};
use nalgebra::Matrix2;
use num::Complex;
use std::fmt;
use std::str::FromStr;

/// A single-qubit gate from the Clifford+T alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Hadamard.
    H,
    /// `diag(1, ω)`.
    T,
    /// `diag(1, i)`.
    S,
    /// Pauli X.
    X,
    /// The global phase `ω`.
    W,
}

impl Gate {
    /// Single letter name.
    pub fn symbol(self) -> char {
        match self {
            Gate::H => 'H',
            Gate::T => 'T',
            Gate::S => 'S',
            Gate::X => 'X',
            Gate::W => 'W',
        }
    }

    /// Parse a single letter name.
    pub fn from_symbol(c: char) -> SynthResult<Self> {
        match c {
            'H' => Ok(Gate::H),
            'T' => Ok(Gate::T),
            'S' => Ok(Gate::S),
            'X' => Ok(Gate::X),
            'W' => Ok(Gate::W),
            _ => Err(SynthesisError::domain(format!("unknown gate {:?}", c))),
        }
    }
}

/// A word in the gate alphabet, read as the matrix product in written order: `"HT"` is `H·T`,
/// so `T` acts first on a state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GateSequence {
    gates: Vec<Gate>,
}

impl GateSequence {
    /// The empty sequence, the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate on the right.
    pub fn push(&mut self, gate: Gate) {
        self.gates.push(gate);
    }

    /// Append a whole sequence on the right.
    pub fn extend(&mut self, other: &GateSequence) {
        self.gates.extend_from_slice(&other.gates);
    }

    /// Gates in written order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// No gates at all.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Number of `T` gates.
    pub fn t_count(&self) -> usize {
        self.gates.iter().filter(|g| **g == Gate::T).count()
    }
}

impl FromStr for GateSequence {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let gates = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(Gate::from_symbol)
            .collect::<SynthResult<Vec<_>>>()?;
        Ok(Self { gates })
    }
}

impl fmt::Display for GateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for g in &self.gates {
            write!(f, "{}", g.symbol())?;
        }
        Ok(())
    }
}

impl From<Vec<Gate>> for GateSequence {
    fn from(gates: Vec<Gate>) -> Self {
        Self { gates }
    }
}

/// The unitary `[[z, -w† ωⁿ], [w, z† ωⁿ]]` with `z, w ∈ D[ω]` and `|z|² + |w|² = 1`.
#[derive(Clone, Debug)]
pub struct DOmegaUnitary {
    z: DOmega,
    w: DOmega,
    n: u8,
}

impl DOmegaUnitary {
    /// Build from the first column and the determinant phase `ωⁿ`.
    pub fn new(z: DOmega, w: DOmega, n: i64) -> Self {
        Self {
            z: z.reduce(),
            w: w.reduce(),
            n: n.rem_euclid(8) as u8,
        }
    }

    /// The identity.
    pub fn identity() -> Self {
        Self::new(DOmega::one(), DOmega::zero(), 0)
    }

    /// A determinant one unitary with first column `(z, w)`, using `w` or `ωw` so the
    /// off-diagonal entry needs no larger denominator than `z`.
    pub fn from_column(z: DOmega, w: DOmega) -> Self {
        let z = z.reduce();
        let w = w.reduce();
        let sum = (&z + &w).reduce();
        if sum.k() < z.k() {
            Self::new(z, w, 0)
        } else {
            Self::new(z, w.mul_omega_pow(1), 0)
        }
    }

    /// The product of a gate sequence.
    pub fn from_gates(gates: &GateSequence) -> Self {
        gates
            .gates()
            .iter()
            .rev()
            .fold(Self::identity(), |u, g| u.left_mul(*g))
    }

    /// Top left entry.
    pub fn z(&self) -> &DOmega {
        &self.z
    }

    /// Bottom left entry.
    pub fn w(&self) -> &DOmega {
        &self.w
    }

    /// Exponent of the determinant phase `ωⁿ`.
    pub fn n(&self) -> u8 {
        self.n
    }

    /// The four entries `[[u00, u01], [u10, u11]]`.
    pub fn entries(&self) -> [[DOmega; 2]; 2] {
        let n = i64::from(self.n);
        [
            [self.z.clone(), -self.w.conj().mul_omega_pow(n)],
            [self.w.clone(), self.z.conj().mul_omega_pow(n)],
        ]
    }

    /// `|z|² + |w|² = 1`, exactly.
    pub fn is_unitary(&self) -> bool {
        (self.z.norm_sq() + self.w.norm_sq()) == DRootTwo::one()
    }

    /// Smallest denominator exponent of `|z|²`.
    pub fn sde_abs_z_sq(&self) -> u32 {
        self.z.norm_sq().reduce().k()
    }

    /// `gate · self`.
    pub fn left_mul(&self, gate: Gate) -> Self {
        let n = i64::from(self.n);
        match gate {
            Gate::H => Self::new(
                (&self.z + &self.w).div_sqrt2(),
                (&self.z - &self.w).div_sqrt2(),
                n + 4,
            ),
            Gate::T => self.left_mul_t_pow(1),
            Gate::S => self.left_mul_t_pow(2),
            Gate::X => Self::new(self.w.clone(), self.z.clone(), n + 4),
            Gate::W => Self::new(self.z.mul_omega_pow(1), self.w.mul_omega_pow(1), n + 2),
        }
    }

    /// `T^j · self` for any integer `j`.
    pub fn left_mul_t_pow(&self, j: i64) -> Self {
        Self::new(
            self.z.clone(),
            self.w.mul_omega_pow(j),
            i64::from(self.n) + j,
        )
    }

    /// The entries evaluated at the precision of `ctx`.
    pub fn to_matrix(&self, ctx: &Context) -> Matrix2<Complex<Real>> {
        let [[u00, u01], [u10, u11]] = self.entries();
        let c = |x: &DOmega| {
            let (re, im) = x.to_complex(ctx);
            Complex::new(re, im)
        };
        Matrix2::new(c(&u00), c(&u01), c(&u10), c(&u11))
    }

    /// Operator norm distance to `Rz(θ) = diag(e^{-iθ/2}, e^{iθ/2})`.
    pub fn distance_to_rz(&self, ctx: &Context, theta: &Real) -> Real {
        let (sin, cos) = ctx.sin_cos(&theta.half());
        let zero = || Complex::new(ctx.zero(), ctx.zero());
        let rz = Matrix2::new(
            Complex::new(cos.clone(), -&sin),
            zero(),
            zero(),
            Complex::new(cos, sin),
        );
        let diff = self
            .to_matrix(ctx)
            .zip_map(&rz, |a, b| Complex::new(a.re - &b.re, a.im - &b.im));
        operator_norm(ctx, &diff)
    }
}

fn complex_mul(x: &Complex<Real>, y: &Complex<Real>) -> Complex<Real> {
    Complex::new(
        &x.re * &y.re - &x.im * &y.im,
        &x.re * &y.im + &x.im * &y.re,
    )
}

/// Largest singular value of a 2x2 complex matrix.
fn operator_norm(ctx: &Context, m: &Matrix2<Complex<Real>>) -> Real {
    let frob = m
        .iter()
        .fold(ctx.zero(), |acc, e| acc + e.re.square() + e.im.square());
    let p = complex_mul(&m[(0, 0)], &m[(1, 1)]);
    let q = complex_mul(&m[(0, 1)], &m[(1, 0)]);
    let det2 = (&p.re - &q.re).square() + (&p.im - &q.im).square();
    // σ_max² = (‖M‖_F² + √(‖M‖_F⁴ - 4|det M|²)) / 2
    let disc = (frob.square() - det2.mul_int(&4.into())).sqrt();
    (frob + disc).half().sqrt()
}

impl PartialEq for DOmegaUnitary {
    fn eq(&self, other: &Self) -> bool {
        self.z == other.z && self.w == other.w && self.n == other.n
    }
}

impl Eq for DOmegaUnitary {}

impl fmt::Display for DOmegaUnitary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[[{}, .], [{}, .]] det ω^{}", self.z, self.w, self.n)
    }
}
