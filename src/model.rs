//! Three-parameter logistic item response model.

use crate::error::{ensure_finite, CatError, Result};
use crate::item::Item;
use crate::utils::{clip, clip_probability, sigmoid, EPSILON};

/// Probability of a correct response under the 3PL model:
/// `c + (1 - c) * sigmoid(a * (theta - b))`, clamped to `[0, 1]`.
///
/// Fails with [`CatError::NonNumeric`] for NaN or infinite arguments and
/// with [`CatError::GuessingOutOfRange`] when `c` is outside `[0, 1]`.
pub fn probability_correct(theta: f64, a: f64, b: f64, c: f64) -> Result<f64> {
    ensure_finite("theta", theta)?;
    ensure_finite("a", a)?;
    ensure_finite("b", b)?;
    ensure_finite("c", c)?;
    if !(0.0..=1.0).contains(&c) {
        return Err(CatError::GuessingOutOfRange(c));
    }
    Ok(clip(c + (1.0 - c) * sigmoid(a * (theta - b)), 0.0, 1.0))
}

/// Fisher information `a² · P · (1 - P) / (1 - c)²` of one item at `theta`.
///
/// Items whose guessing parameter is at or beyond `1 - EPSILON` carry no
/// information and yield exactly `0.0`.
pub fn item_information(theta: f64, a: f64, b: f64, c: f64) -> Result<f64> {
    ensure_finite("theta", theta)?;
    ensure_finite("c", c)?;
    if c >= 1.0 - EPSILON {
        return Ok(0.0);
    }
    let p = clip_probability(probability_correct(theta, a, b, c)?);
    let one_minus_c = 1.0 - c;
    Ok(a * a * p * (1.0 - p) / (one_minus_c * one_minus_c))
}

/// Information of a bank item at `theta`.
#[inline]
pub fn information_at(item: &Item, theta: f64) -> Result<f64> {
    item_information(theta, item.a(), item.b(), item.c())
}

/// Sum of item information over `items` at `theta`.
pub fn test_information<'a, I>(theta: f64, items: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a Item>,
{
    items
        .into_iter()
        .try_fold(0.0, |acc, item| -> Result<f64> {
            Ok(acc + information_at(item, theta)?)
        })
}
