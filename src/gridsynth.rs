//! Approximation of `Rz(θ)` by Clifford+T sequences.
//!
//! For each denominator exponent `k = 0, 1, ...` the grid problem over the ε-region and the
//! unit disk yields candidate top left entries `u`. A candidate is accepted once
//! `t† t = 1 - |u|²` has a solution, at which point `[[u, -t†], [t, u†]]` is an exact
//! Clifford+T unitary within `ε` of the target and is decomposed into gates.

use crate::config::GridSynthConfig;
use crate::diophantine::solve_droottwo;
use crate::errors::{SynthResult, SynthesisError};
use crate::exact_synthesis::decompose;
use crate::grid::{to_upright_pair, ConvexRegion, EpsilonRegion, GridPoints, UnitDisk};
use crate::rayon_helper::iter;
use crate::precision::{Context, Real};
#[cfg(feature = "parallel")]
use crate::rayon_helper::*;
use crate::ring::{DOmega, DRootTwo};
use crate::unitary::{DOmegaUnitary, GateSequence};
use log::{debug, info, trace};
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// A gate sequence approximating `Rz(θ)` and how it was found.
#[derive(Clone, Debug)]
pub struct GridSynthResult {
    /// The gates, as an operator product in written order.
    pub gates: GateSequence,
    /// Operator norm distance between the gates and `Rz(θ)`.
    pub error: Real,
    /// Number of `T` gates.
    pub t_count: usize,
    /// Number of gates.
    pub gate_count: usize,
    /// Denominator exponent of the accepted candidate.
    pub denomexp: u32,
    /// Candidates handed to the Diophantine solver, in search order.
    pub candidates_tried: usize,
    /// Candidates abandoned because factoring ran out of budget.
    pub factoring_timeouts: usize,
    /// Working decimal digits of the search.
    pub digits: u32,
}

/// Outcome of the Diophantine stage for one candidate.
type Attempt = SynthResult<DOmega>;

/// Mutable state of one search.
struct Search<'a> {
    config: &'a GridSynthConfig,
    ctx: Context,
    theta: Real,
    epsilon: Real,
    effort: u64,
    /// Timeouts since the effort was last raised.
    recent_timeouts: usize,
    timeouts: usize,
    tried: usize,
}

/// An accepted candidate.
struct Accepted {
    u: DOmega,
    t: DOmega,
    error: Real,
}

/// `√(2 - 2 Re(u e^{iθ/2}))`, the operator norm distance between `[[u, -t†], [t, u†]]`
/// and `Rz(θ)` for any `t` completing it to a determinant one unitary.
fn rotation_error(ctx: &Context, u: &DOmega, theta: &Real) -> Real {
    let (sin, cos) = ctx.sin_cos(&theta.half());
    let (x, y) = u.to_complex(ctx);
    let overlap = &x * &cos - &y * &sin;
    (ctx.int(2) - overlap.mul_int(&2.into())).sqrt()
}

impl<'a> Search<'a> {
    fn new(config: &'a GridSynthConfig) -> Self {
        let ctx = config.context();
        Self {
            config,
            theta: config.theta.to_real(&ctx),
            epsilon: config.epsilon.to_real(&ctx),
            ctx,
            effort: config.factoring_effort,
            recent_timeouts: 0,
            timeouts: 0,
            tried: 0,
        }
    }

    fn attempt(&self, u: &DOmega, index: usize) -> Attempt {
        let xi = DRootTwo::one() - u.norm_sq();
        solve_droottwo(&xi, self.effort, self.config.seed.wrapping_add(index as u64))
    }

    /// Run the Diophantine stage over a batch. Entries after the earliest success may be
    /// skipped and are left as `None`.
    fn attempt_batch(&self, batch: &[DOmega], base: usize) -> Vec<Option<Attempt>> {
        let best = AtomicUsize::new(usize::MAX);
        iter!(batch)
            .enumerate()
            .map(|(i, u)| {
                if i > best.load(Ordering::Acquire) {
                    return None;
                }
                let outcome = self.attempt(u, base + i);
                if outcome.is_ok() {
                    best.fetch_min(i, Ordering::AcqRel);
                }
                Some(outcome)
            })
            .collect()
    }

    /// The distance to the target, or `None` if it exceeds `ε`. Comparisons too close to
    /// call are redone at raised precision.
    fn check_error(&self, u: &DOmega) -> SynthResult<Option<Real>> {
        let mut ctx = self.ctx.clone();
        let mut retries = 0;
        loop {
            let theta = self.config.theta.to_real(&ctx);
            let epsilon = self.config.epsilon.to_real(&ctx);
            let error = rotation_error(&ctx, u, &theta);
            match ctx.try_cmp(&error, &epsilon, "candidate error against epsilon") {
                Ok(CmpOrdering::Greater) => return Ok(None),
                Ok(_) => return Ok(Some(error)),
                Err(e @ SynthesisError::Precision { .. }) => {
                    if retries >= self.config.precision_retries {
                        return Err(e);
                    }
                    retries += 1;
                    ctx = ctx.raised();
                    debug!("raising precision to {} digits: {}", ctx.digits(), e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Scan a batch in order, returning the first candidate passing every check.
    fn process_batch(&mut self, batch: &[DOmega], base: usize) -> SynthResult<Option<Accepted>> {
        let mut results = self.attempt_batch(batch, base);
        for (i, u) in batch.iter().enumerate() {
            self.tried += 1;
            let outcome = match results[i].take() {
                Some(outcome) => outcome,
                None => self.attempt(u, base + i),
            };
            let t = match outcome {
                Ok(t) => t,
                Err(e @ SynthesisError::FactorizationTimeout { .. }) => {
                    trace!("candidate {}: {}", base + i, e);
                    self.timeouts += 1;
                    self.recent_timeouts += 1;
                    continue;
                }
                Err(e) if e.is_candidate_rejection() => continue,
                Err(e) => return Err(e),
            };
            let unitary = DOmegaUnitary::from_column(u.clone(), t.clone());
            if !unitary.is_unitary() {
                return Err(SynthesisError::invariant(format!(
                    "candidate {} with witness {} is not unitary",
                    u, t
                )));
            }
            if let Some(error) = self.check_error(u)? {
                return Ok(Some(Accepted {
                    u: u.clone(),
                    t,
                    error,
                }));
            }
            debug!("candidate {} rejected by the error check", base + i);
        }
        Ok(None)
    }

    fn maybe_raise_effort(&mut self) {
        if self.recent_timeouts >= self.config.effort_growth_threshold {
            self.effort = self.effort.saturating_mul(2);
            self.recent_timeouts = 0;
            info!("raising factoring effort to {}", self.effort);
        }
    }

    fn run(&mut self) -> SynthResult<(u32, Accepted)> {
        let region_a = EpsilonRegion::new(&self.ctx, &self.theta, &self.epsilon);
        let region_b = UnitDisk::new(&self.ctx);
        let upright = to_upright_pair(&self.ctx, region_a.ellipse(), region_b.ellipse())?;
        for k in 0..=self.config.max_denomexp {
            let mut points = GridPoints::new(&self.ctx, &region_a, &region_b, upright.as_ref(), k);
            let mut seen = 0;
            loop {
                let batch: Vec<DOmega> = points.by_ref().take(self.config.batch_size).collect();
                if batch.is_empty() {
                    break;
                }
                let base = self.tried;
                seen += batch.len();
                let accepted = self.process_batch(&batch, base)?;
                self.maybe_raise_effort();
                if let Some(accepted) = accepted {
                    debug!("k = {}: accepted after {} candidates", k, seen);
                    return Ok((k, accepted));
                }
            }
            debug!("k = {}: {} candidates, none accepted", k, seen);
        }
        Err(SynthesisError::SearchExhausted(self.config.max_denomexp))
    }
}

/// Independent check of a finished sequence at raised precision.
fn verify(config: &GridSynthConfig, ctx: &Context, gates: &GateSequence) -> SynthResult<()> {
    let ctx = ctx.raised();
    let theta = config.theta.to_real(&ctx);
    let epsilon = config.epsilon.to_real(&ctx);
    let distance = DOmegaUnitary::from_gates(gates).distance_to_rz(&ctx, &theta);
    if distance > epsilon {
        return Err(SynthesisError::invariant(format!(
            "gates {} are {} away from the target, more than {}",
            gates, distance, epsilon
        )));
    }
    Ok(())
}

/// Approximate `Rz(θ)` to within `ε` in operator norm.
pub fn gridsynth(config: &GridSynthConfig) -> SynthResult<GridSynthResult> {
    config.validate()?;
    let start = Instant::now();
    let mut search = Search::new(config);
    info!(
        "gridsynth theta = {}, epsilon = {}, {} digits",
        config.theta,
        config.epsilon,
        search.ctx.digits()
    );
    let (denomexp, accepted) = search.run()?;
    let unitary = DOmegaUnitary::from_column(accepted.u, accepted.t);
    let gates = decompose(&unitary)?;
    if config.verify {
        verify(config, &search.ctx, &gates)?;
    }
    info!(
        "found {} gates ({} T) at k = {} after {} candidates in {:.3} s",
        gates.len(),
        gates.t_count(),
        denomexp,
        search.tried,
        start.elapsed().as_secs_f64()
    );
    Ok(GridSynthResult {
        t_count: gates.t_count(),
        gate_count: gates.len(),
        gates,
        error: accepted.error,
        denomexp,
        candidates_tried: search.tried,
        factoring_timeouts: search.timeouts,
        digits: search.ctx.digits(),
    })
}

/// Gates approximating `Rz(theta)` to within `epsilon`, both given as literals.
pub fn gridsynth_gates(theta: &str, epsilon: &str) -> SynthResult<GateSequence> {
    let config = GridSynthConfig::new(theta, epsilon)?;
    gridsynth(&config).map(|r| r.gates)
}
