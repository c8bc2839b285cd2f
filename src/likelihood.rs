//! Log-likelihood of a response history under the 3PL model.

use crate::error::{ensure_finite, CatError, Result};
use crate::item::ResponseRecord;
use crate::model::probability_correct;
use crate::utils::clip_probability;

/// Negative log-likelihood of `history` at `theta`.
///
/// Correct responses contribute `-ln(P)` and incorrect ones `-ln(1 - P)`,
/// with `P` clamped away from `{0, 1}`. The sum does not depend on the order
/// of `history`. An empty history has likelihood one, so this returns `0.0`.
pub fn neg_log_likelihood(theta: f64, history: &[ResponseRecord]) -> Result<f64> {
    ensure_finite("theta", theta)?;
    let mut nll = 0.0;
    for record in history {
        let p = clip_probability(probability_correct(
            theta,
            record.a(),
            record.b(),
            record.c(),
        )?);
        let term = if record.answered_correctly() {
            -p.ln()
        } else {
            -(1.0 - p).ln()
        };
        if !term.is_finite() {
            return Err(CatError::NumericFailure { theta });
        }
        nll += term;
    }
    Ok(nll)
}

#[inline]
pub fn log_likelihood(theta: f64, history: &[ResponseRecord]) -> Result<f64> {
    neg_log_likelihood(theta, history).map(|nll| -nll)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(a: f64, b: f64, c: f64, correct: bool) -> ResponseRecord {
        ResponseRecord::new(a, b, c, correct).unwrap()
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(neg_log_likelihood(1.0, &[]).unwrap(), 0.0);
    }

    #[test]
    fn single_correct_response_matches_closed_form() {
        let history = [record(1.0, 0.0, 0.25, true)];
        let nll = neg_log_likelihood(0.0, &history).unwrap();
        assert!((nll - (-(0.625_f64).ln())).abs() < 1e-12);
    }

    #[test]
    fn extreme_theta_stays_finite() {
        let history = [record(1.5, -2.0, 0.0, false), record(1.5, 2.0, 0.0, true)];
        let nll = neg_log_likelihood(400.0, &history).unwrap();
        assert!(nll.is_finite());
        assert!(nll > 0.0);
    }

    #[test]
    fn rejects_non_finite_theta() {
        assert!(matches!(
            neg_log_likelihood(f64::NAN, &[record(1.0, 0.0, 0.2, true)]),
            Err(CatError::NonNumeric { name: "theta", .. })
        ));
    }

    #[test]
    fn order_does_not_matter() {
        let history = vec![
            record(1.2, -0.4, 0.18, true),
            record(0.6, 1.1, 0.12, false),
            record(1.4, 0.3, 0.22, true),
            record(0.9, -1.7, 0.2, false),
        ];
        let mut reversed = history.clone();
        reversed.reverse();
        let forward = neg_log_likelihood(0.4, &history).unwrap();
        let backward = neg_log_likelihood(0.4, &reversed).unwrap();
        assert!((forward - backward).abs() < 1e-12);
        assert_eq!(log_likelihood(0.4, &history).unwrap(), -forward);
    }
}
