//! Maximum-likelihood ability estimation.
//!
//! The estimate is a bounded minimization of the negative log-likelihood
//! with Brent's method. Every call refits against the full history; the
//! simulator calls it once per administered item, so an exam of `n` items
//! costs `O(n²)` likelihood terms. Exams are a few dozen items long and
//! this stays negligible.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State, TerminationReason};
use argmin::solver::brent::BrentOpt;

use crate::config::{EstimatorOptions, ThetaBounds};
use crate::error::{ensure_finite, CatError, Result};
use crate::item::ResponseRecord;
use crate::likelihood::neg_log_likelihood;

struct NegLogLikelihood<'a> {
    history: &'a [ResponseRecord],
}

impl CostFunction for NegLogLikelihood<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, theta: &f64) -> std::result::Result<f64, ArgminError> {
        Ok(neg_log_likelihood(*theta, self.history)?)
    }
}

/// Bounded MLE of theta, reporting every failure.
///
/// Returns `initial_guess` unchanged for an empty history. Optimizer errors
/// and non-convergence come back as [`CatError::EstimationFailure`].
pub fn try_estimate_theta(
    history: &[ResponseRecord],
    initial_guess: f64,
    bounds: ThetaBounds,
    options: &EstimatorOptions,
) -> Result<f64> {
    ensure_finite("initial_guess", initial_guess)?;
    bounds.validate()?;
    if history.is_empty() {
        return Ok(initial_guess);
    }

    let solver = BrentOpt::new(bounds.lower, bounds.upper)
        .set_tolerance(f64::EPSILON.sqrt(), options.tolerance);
    let result = Executor::new(NegLogLikelihood { history }, solver)
        .configure(|state| state.max_iters(options.max_iters))
        .run()
        .map_err(|e| CatError::EstimationFailure {
            reason: e.to_string(),
        })?;

    let state = result.state();
    match state.get_termination_reason() {
        Some(TerminationReason::SolverConverged) | Some(TerminationReason::TargetCostReached) => {}
        other => {
            return Err(CatError::EstimationFailure {
                reason: format!("optimizer stopped without converging: {other:?}"),
            })
        }
    }
    let theta = state
        .get_best_param()
        .copied()
        .ok_or_else(|| CatError::EstimationFailure {
            reason: "optimizer produced no estimate".into(),
        })?;
    if !theta.is_finite() {
        return Err(CatError::NumericFailure { theta });
    }
    Ok(bounds.clip(theta))
}

/// Bounded MLE of theta that never fails.
///
/// Any estimation failure is logged and the caller's `initial_guess` is
/// returned, so ability estimation can never abort an exam run.
pub fn estimate_theta_with(
    history: &[ResponseRecord],
    initial_guess: f64,
    bounds: ThetaBounds,
    options: &EstimatorOptions,
) -> f64 {
    match try_estimate_theta(history, initial_guess, bounds, options) {
        Ok(theta) => theta,
        Err(e) => {
            tracing::warn!(
                error = %e,
                initial_guess,
                responses = history.len(),
                "ability estimation failed, keeping previous estimate"
            );
            initial_guess
        }
    }
}

/// [`estimate_theta_with`] using default [`EstimatorOptions`].
pub fn estimate_theta(history: &[ResponseRecord], initial_guess: f64, bounds: ThetaBounds) -> f64 {
    estimate_theta_with(history, initial_guess, bounds, &EstimatorOptions::default())
}
