//! Shared numeric helpers for the 3PL model.

/// Probability clamp used before taking logs or products near `{0, 1}`.
pub const EPSILON: f64 = 1e-10;

/// Minimum information an item must carry to be worth administering.
pub const MIN_INFORMATION: f64 = 1e-12;

/// Numerically stable logistic function.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

#[inline]
pub fn clip(x: f64, min: f64, max: f64) -> f64 {
    x.max(min).min(max)
}

/// Clamp a probability away from the boundary so `ln(p)` and `ln(1 - p)` stay finite.
#[inline]
pub fn clip_probability(p: f64) -> f64 {
    clip(p, EPSILON, 1.0 - EPSILON)
}
