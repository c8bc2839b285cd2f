//! Run configuration: ability bounds, estimator settings and per-subject setup.

use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};
use crate::utils::clip;

pub const DEFAULT_THETA_LOWER: f64 = -4.0;
pub const DEFAULT_THETA_UPPER: f64 = 4.0;
pub const DEFAULT_BASE_SEED: u64 = 42;
pub const DEFAULT_BANK_SIZE: usize = 1000;

/// Closed interval the ability estimate is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for ThetaBounds {
    fn default() -> Self {
        Self {
            lower: DEFAULT_THETA_LOWER,
            upper: DEFAULT_THETA_UPPER,
        }
    }
}

impl ThetaBounds {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper {
            Ok(())
        } else {
            Err(CatError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
            })
        }
    }

    #[inline]
    pub fn clip(&self, theta: f64) -> f64 {
        clip(theta, self.lower, self.upper)
    }

    #[inline]
    pub fn contains(&self, theta: f64) -> bool {
        (self.lower..=self.upper).contains(&theta)
    }
}

/// Settings for the bounded maximum-likelihood search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorOptions {
    pub max_iters: u64,
    /// Absolute tolerance on theta.
    pub tolerance: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            max_iters: 100,
            tolerance: 1e-8,
        }
    }
}

/// How one exam section is simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub name: String,
    #[serde(default = "default_bank_size")]
    pub bank_size: usize,
    #[serde(default)]
    pub seed_offset: u64,
    #[serde(default)]
    pub initial_theta: f64,
    pub total_questions: usize,
    #[serde(default)]
    pub theta_bounds: ThetaBounds,
}

fn default_bank_size() -> usize {
    DEFAULT_BANK_SIZE
}

impl SubjectConfig {
    pub fn new(name: impl Into<String>, total_questions: usize, seed_offset: u64) -> Self {
        Self {
            name: name.into(),
            bank_size: DEFAULT_BANK_SIZE,
            seed_offset,
            initial_theta: 0.0,
            total_questions,
            theta_bounds: ThetaBounds::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatError::InvalidConfig("subject name is empty".into()));
        }
        if self.bank_size == 0 {
            return Err(CatError::BankInitialization {
                count: self.bank_size,
            });
        }
        if self.total_questions == 0 {
            return Err(CatError::InvalidTotalQuestions(self.total_questions));
        }
        if !self.initial_theta.is_finite() {
            return Err(CatError::NonNumeric {
                name: "initial_theta",
                value: self.initial_theta,
            });
        }
        self.theta_bounds.validate()
    }

    /// Seed for this subject's bank: `base_seed + seed_offset`, wrapping.
    #[inline]
    pub fn seed(&self, base_seed: u64) -> u64 {
        base_seed.wrapping_add(self.seed_offset)
    }
}

/// Configuration for a full diagnostic run over several subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_base_seed")]
    pub base_seed: u64,
    #[serde(default)]
    pub estimator: EstimatorOptions,
    pub subjects: Vec<SubjectConfig>,
}

fn default_base_seed() -> u64 {
    DEFAULT_BASE_SEED
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::gmat_focus()
    }
}

impl BatchConfig {
    /// The three GMAT Focus sections with their official question counts.
    pub fn gmat_focus() -> Self {
        Self {
            base_seed: DEFAULT_BASE_SEED,
            estimator: EstimatorOptions::default(),
            subjects: vec![
                SubjectConfig::new("Quantitative Reasoning", 21, 0),
                SubjectConfig::new("Verbal Reasoning", 23, 1),
                SubjectConfig::new("Data Insights", 20, 2),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CatError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subjects.is_empty() {
            return Err(CatError::InvalidConfig("no subjects configured".into()));
        }
        for (i, subject) in self.subjects.iter().enumerate() {
            subject.validate()?;
            if self.subjects[..i].iter().any(|s| s.name == subject.name) {
                return Err(CatError::InvalidConfig(format!(
                    "subject `{}` configured twice",
                    subject.name
                )));
            }
        }
        let tolerance = self.estimator.tolerance;
        if self.estimator.max_iters == 0 || tolerance.is_nan() || tolerance <= 0.0 {
            return Err(CatError::InvalidConfig(
                "estimator needs max_iters > 0 and a positive tolerance".into(),
            ));
        }
        Ok(())
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectConfig> {
        self.subjects.iter().find(|s| s.name == name)
    }
}
