//! Error taxonomy for the adaptive testing engine.
//!
//! Validation and range errors point at a caller bug and are always
//! propagated. Estimation failures are recovered inside
//! [`estimate_theta`](crate::estimation::estimate_theta) and only surface
//! through [`try_estimate_theta`](crate::estimation::try_estimate_theta).
//! Pool exhaustion is not an error at all; it is reported through
//! [`Termination::Exhausted`](crate::simulation::Termination).

use thiserror::Error;

use crate::item::ItemId;

pub type Result<T> = std::result::Result<T, CatError>;

/// Coarse classification of a [`CatError`], for callers that branch on the
/// failure family rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Range,
    Numeric,
    Estimation,
    BankInitialization,
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// An argument was NaN or infinite.
    #[error("{name} must be a finite number, got {value}")]
    NonNumeric { name: &'static str, value: f64 },

    /// The guessing parameter fell outside `[0, 1]`.
    #[error("guessing parameter c must lie in [0, 1], got {0}")]
    GuessingOutOfRange(f64),

    #[error("invalid item {id}: {reason}")]
    InvalidItem { id: ItemId, reason: String },

    #[error("invalid response record: {reason}")]
    InvalidResponse { reason: String },

    /// A log-likelihood term came out non-finite despite clamping.
    #[error("non-finite log-likelihood term at theta = {theta}")]
    NumericFailure { theta: f64 },

    #[error("ability estimation failed: {reason}")]
    EstimationFailure { reason: String },

    #[error("item bank size must be a positive integer, got {count}")]
    BankInitialization { count: usize },

    #[error("duplicate item id {0} in bank")]
    DuplicateItemId(ItemId),

    #[error("total question count must be positive, got {0}")]
    InvalidTotalQuestions(usize),

    #[error("theta bounds must be finite with lower < upper, got [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("exam positions are 1-based, got {0}")]
    InvalidPosition(usize),

    /// The same position was listed in both override sets.
    #[error("positions {positions:?} appear in both the to-correct and to-incorrect overrides")]
    ConflictingOverrides { positions: Vec<usize> },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatError::NonNumeric { .. }
            | CatError::InvalidItem { .. }
            | CatError::InvalidResponse { .. }
            | CatError::DuplicateItemId(_) => ErrorKind::Validation,
            CatError::GuessingOutOfRange(_) => ErrorKind::Range,
            CatError::NumericFailure { .. } => ErrorKind::Numeric,
            CatError::EstimationFailure { .. } => ErrorKind::Estimation,
            CatError::BankInitialization { .. } => ErrorKind::BankInitialization,
            CatError::InvalidTotalQuestions(_)
            | CatError::InvalidBounds { .. }
            | CatError::InvalidPosition(_)
            | CatError::ConflictingOverrides { .. }
            | CatError::InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}

/// Reject NaN and infinities with a [`CatError::NonNumeric`] naming the argument.
#[inline]
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CatError::NonNumeric { name, value })
    }
}
