//! Per-subject orchestration for a full diagnostic run.
//!
//! Each exam section gets its own freshly seeded bank and its own session,
//! so sections share no state and run in parallel. A failing section is
//! recorded in the report and never stops its siblings.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bank::initialize_question_bank;
use crate::config::{BatchConfig, EstimatorOptions, SubjectConfig};
use crate::error::{CatError, Result};
use crate::simulation::{simulate_cat_exam_with, CorrectnessSchedule, Trace};

/// A student's observed results for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectInput {
    /// Number of questions the student actually answered; `None` uses the
    /// configured section length. `Some(0)` skips the section.
    pub question_count: Option<usize>,
    /// 1-based positions answered incorrectly.
    pub wrong_positions: Vec<usize>,
    /// Manual incorrect-to-correct adjustments.
    pub to_correct: Vec<usize>,
    /// Manual correct-to-incorrect adjustments.
    pub to_incorrect: Vec<usize>,
}

impl SubjectInput {
    pub fn from_wrong_positions(wrong_positions: impl IntoIterator<Item = usize>) -> Self {
        Self {
            wrong_positions: wrong_positions.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn schedule(&self) -> Result<CorrectnessSchedule> {
        CorrectnessSchedule::from_wrong_positions(self.wrong_positions.iter().copied())?
            .with_overrides(
                self.to_correct.iter().copied(),
                self.to_incorrect.iter().copied(),
            )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectReport {
    pub name: String,
    pub outcome: std::result::Result<Trace, CatError>,
}

impl SubjectReport {
    pub fn trace(&self) -> Option<&Trace> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CatError> {
        self.outcome.as_ref().err()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub subjects: Vec<SubjectReport>,
}

impl BatchReport {
    pub fn get(&self, name: &str) -> Option<&SubjectReport> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubjectReport> {
        self.subjects.iter().filter(|s| s.outcome.is_err())
    }

    /// Final ability estimate of every section that administered at least one item.
    pub fn final_thetas(&self) -> Vec<(&str, f64)> {
        self.subjects
            .iter()
            .filter_map(|s| Some((s.name.as_str(), s.trace()?.final_theta()?)))
            .collect()
    }
}

/// Simulate one section. Missing input yields a skipped trace.
pub fn run_subject(
    config: &SubjectConfig,
    base_seed: u64,
    options: &EstimatorOptions,
    input: Option<&SubjectInput>,
) -> Result<Trace> {
    let span = tracing::info_span!("subject", subject = %config.name);
    let _enter = span.enter();

    let Some(input) = input.filter(|i| i.question_count != Some(0)) else {
        tracing::info!("no responses for subject, skipping simulation");
        return Ok(Trace::skipped(config.total_questions));
    };
    config.validate()?;

    let total_questions = input.question_count.unwrap_or(config.total_questions);
    let schedule = input.schedule()?;
    let bank = initialize_question_bank(config.bank_size, config.seed(base_seed))?;

    simulate_cat_exam_with(
        &bank,
        total_questions,
        config.initial_theta,
        &schedule,
        config.theta_bounds,
        options,
    )
}

/// Simulate every configured section in parallel.
pub fn run_batch(config: &BatchConfig, inputs: &HashMap<String, SubjectInput>) -> BatchReport {
    let subjects = config
        .subjects
        .par_iter()
        .map(|subject| {
            let outcome = run_subject(
                subject,
                config.base_seed,
                &config.estimator,
                inputs.get(&subject.name),
            );
            if let Err(e) = &outcome {
                tracing::error!(subject = %subject.name, error = %e, "subject simulation failed");
            }
            SubjectReport {
                name: subject.name.clone(),
                outcome,
            }
        })
        .collect();

    BatchReport { subjects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(entries: Vec<(&str, SubjectInput)>) -> HashMap<String, SubjectInput> {
        entries
            .into_iter()
            .map(|(name, input)| (name.to_string(), input))
            .collect()
    }

    #[test]
    fn missing_input_is_skipped() {
        let config = BatchConfig::gmat_focus();
        let report = run_batch(
            &config,
            &inputs(vec![("Verbal Reasoning", SubjectInput::from_wrong_positions([3]))]),
        );
        assert_eq!(report.subjects.len(), 3);
        assert!(report.get("Quantitative Reasoning").unwrap().trace().unwrap().is_skipped());
        let verbal = report.get("Verbal Reasoning").unwrap().trace().unwrap();
        assert!(verbal.is_complete());
        assert_eq!(verbal.len(), 23);
        assert_eq!(report.final_thetas().len(), 1);
    }

    #[test]
    fn failing_subject_does_not_block_others() {
        let config = BatchConfig::gmat_focus();
        let conflicting = SubjectInput {
            to_correct: vec![4],
            to_incorrect: vec![4],
            ..SubjectInput::default()
        };
        let report = run_batch(
            &config,
            &inputs(vec![
                ("Quantitative Reasoning", conflicting),
                ("Data Insights", SubjectInput::from_wrong_positions([1, 2])),
            ]),
        );
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].error(),
            Some(&CatError::ConflictingOverrides { positions: vec![4] })
        );
        assert!(report.get("Data Insights").unwrap().trace().unwrap().is_complete());
    }

    #[test]
    fn oversized_question_count_is_exhausted_without_affecting_siblings() {
        let mut config = BatchConfig::gmat_focus();
        config.subjects[0].bank_size = 12;
        let huge = SubjectInput {
            question_count: Some(usize::MAX),
            ..SubjectInput::default()
        };
        let report = run_batch(
            &config,
            &inputs(vec![
                ("Quantitative Reasoning", huge),
                ("Data Insights", SubjectInput::from_wrong_positions([1])),
            ]),
        );

        let quant = report.get("Quantitative Reasoning").unwrap().trace().unwrap();
        assert!(quant.is_partial());
        assert_eq!(quant.len(), 12);
        let insights = report.get("Data Insights").unwrap().trace().unwrap();
        assert!(insights.is_complete());
        assert_eq!(insights.len(), 20);
    }

    #[test]
    fn question_count_overrides_section_length() {
        let config = SubjectConfig::new("Quant", 21, 0);
        let input = SubjectInput {
            question_count: Some(6),
            wrong_positions: vec![2, 4],
            ..SubjectInput::default()
        };
        let trace = run_subject(&config, 42, &EstimatorOptions::default(), Some(&input)).unwrap();
        assert_eq!(trace.len(), 6);

        let empty = SubjectInput {
            question_count: Some(0),
            ..SubjectInput::default()
        };
        let trace = run_subject(&config, 42, &EstimatorOptions::default(), Some(&empty)).unwrap();
        assert!(trace.is_skipped());
    }

    #[test]
    fn empty_input_skips_before_config_checks() {
        let config = SubjectConfig::new("Quant", 0, 0);
        let empty = SubjectInput {
            question_count: Some(0),
            wrong_positions: vec![1],
            ..SubjectInput::default()
        };
        let trace = run_subject(&config, 7, &EstimatorOptions::default(), Some(&empty)).unwrap();
        assert!(trace.is_skipped());
        assert_eq!(trace.termination(), crate::simulation::Termination::Skipped);
        assert!(trace.is_empty());
    }

    #[test]
    fn runs_are_reproducible() {
        let config = BatchConfig::gmat_focus();
        let input = inputs(vec![(
            "Data Insights",
            SubjectInput::from_wrong_positions([1, 7, 8, 15]),
        )]);
        let first = run_batch(&config, &input);
        let second = run_batch(&config, &input);
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_bank_size_fails_the_subject() {
        let mut config = SubjectConfig::new("Quant", 5, 0);
        config.bank_size = 0;
        let err = run_subject(
            &config,
            42,
            &EstimatorOptions::default(),
            Some(&SubjectInput::default()),
        )
        .unwrap_err();
        assert_eq!(err, CatError::BankInitialization { count: 0 });
    }
}
