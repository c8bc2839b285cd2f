//! Simulated adaptive exam runs.
//!
//! A [`CatSession`] walks the loop `select -> score -> append & re-estimate
//! -> remove item` until the requested number of items has been
//! administered or the selector finds nothing informative left. Responses
//! are scored by exam position through a [`CorrectnessSchedule`], not by
//! item identity, so a student's real right/wrong pattern can be replayed
//! over a freshly selected item sequence.

use std::collections::BTreeSet;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::bank::ItemBank;
use crate::cat::select_next_question;
use crate::config::{EstimatorOptions, ThetaBounds};
use crate::error::{ensure_finite, CatError, Result};
use crate::estimation::estimate_theta_with;
use crate::item::{Item, ItemId, ResponseRecord};
use crate::model::test_information;

/// Which exam positions (1-based) are scored correct.
///
/// The base pattern marks `wrong` positions incorrect and everything else
/// correct. `to_correct` and `to_incorrect` then flip individual positions.
/// A position may not appear in both override sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessSchedule {
    #[serde(default)]
    wrong: BTreeSet<usize>,
    #[serde(default)]
    to_correct: BTreeSet<usize>,
    #[serde(default)]
    to_incorrect: BTreeSet<usize>,
}

fn collect_positions(positions: impl IntoIterator<Item = usize>) -> Result<BTreeSet<usize>> {
    positions
        .into_iter()
        .map(|p| if p == 0 { Err(CatError::InvalidPosition(p)) } else { Ok(p) })
        .collect()
}

impl CorrectnessSchedule {
    /// Every position correct.
    pub fn all_correct() -> Self {
        Self::default()
    }

    pub fn from_wrong_positions(wrong: impl IntoIterator<Item = usize>) -> Result<Self> {
        Ok(Self {
            wrong: collect_positions(wrong)?,
            ..Self::default()
        })
    }

    /// Apply manual overrides on top of the base pattern.
    pub fn with_overrides(
        self,
        to_correct: impl IntoIterator<Item = usize>,
        to_incorrect: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        let schedule = Self {
            to_correct: collect_positions(to_correct)?,
            to_incorrect: collect_positions(to_incorrect)?,
            ..self
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Check invariants, including for schedules that came from serde.
    pub fn validate(&self) -> Result<()> {
        if let Some(&p) = self
            .wrong
            .iter()
            .chain(&self.to_correct)
            .chain(&self.to_incorrect)
            .find(|&&p| p == 0)
        {
            return Err(CatError::InvalidPosition(p));
        }
        let conflicts: Vec<usize> = self
            .to_correct
            .intersection(&self.to_incorrect)
            .copied()
            .collect();
        if !conflicts.is_empty() {
            return Err(CatError::ConflictingOverrides {
                positions: conflicts,
            });
        }
        Ok(())
    }

    /// Whether the item administered at 1-based `position` is scored correct.
    pub fn is_correct(&self, position: usize) -> bool {
        if self.to_correct.contains(&position) {
            true
        } else if self.to_incorrect.contains(&position) {
            false
        } else {
            !self.wrong.contains(&position)
        }
    }

    /// Positions named anywhere in the schedule that an exam of
    /// `total_questions` items never reaches.
    pub fn positions_beyond(&self, total_questions: usize) -> Vec<usize> {
        let mut beyond: Vec<usize> = self
            .wrong
            .iter()
            .chain(&self.to_correct)
            .chain(&self.to_incorrect)
            .copied()
            .filter(|&p| p > total_questions)
            .collect();
        beyond.sort_unstable();
        beyond.dedup();
        beyond
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The requested number of items was administered.
    Complete,
    /// The pool ran out of informative items first; the trace is partial.
    Exhausted,
    /// No simulation was attempted, typically because the subject had no input.
    Skipped,
}

/// One administered item, in the column layout downstream reports expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub question_number: usize,
    #[serde(rename = "question_id")]
    pub item_id: ItemId,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub answered_correctly: bool,
    #[serde(rename = "theta_est_before_answer")]
    pub theta_before: f64,
    #[serde(rename = "theta_est_after_answer")]
    pub theta_after: f64,
}

/// Step-by-step record of one simulated exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
    requested: usize,
    termination: Termination,
}

impl Trace {
    /// Marker trace for a subject that was not simulated.
    pub fn skipped(requested: usize) -> Self {
        Self {
            entries: Vec::new(),
            requested,
            termination: Termination::Skipped,
        }
    }

    #[inline]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn requested(&self) -> usize {
        self.requested
    }

    #[inline]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_skipped(&self) -> bool {
        self.termination == Termination::Skipped
    }

    pub fn is_complete(&self) -> bool {
        self.termination == Termination::Complete
    }

    /// A real run that stopped before the requested length.
    pub fn is_partial(&self) -> bool {
        self.termination == Termination::Exhausted
    }

    /// Ability estimate after the last administered item.
    pub fn final_theta(&self) -> Option<f64> {
        self.entries.last().map(|e| e.theta_after)
    }

    /// Simulated difficulty per exam position, in administration order.
    pub fn difficulties(&self) -> Array1<f64> {
        self.entries.iter().map(|e| e.b).collect()
    }

    /// Test information of the administered items at the final estimate.
    ///
    /// Zero for an empty trace. Entries that do not describe a valid item
    /// are reported rather than skipped.
    pub fn information(&self) -> Result<f64> {
        let Some(theta) = self.final_theta() else {
            return Ok(0.0);
        };
        let administered = self
            .entries
            .iter()
            .map(|e| Item::new(e.item_id, e.a, e.b, e.c))
            .collect::<Result<Vec<_>>>()?;
        test_information(theta, &administered)
    }

    /// `1 / sqrt(I(theta))` over the administered items at the final estimate.
    ///
    /// `Ok(None)` for an empty trace; infinite when the items carry no information.
    pub fn standard_error(&self) -> Result<Option<f64>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let info = self.information()?;
        Ok(Some(if info > 0.0 { 1.0 / info.sqrt() } else { f64::INFINITY }))
    }

    /// Records keyed by the report column names.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated(Termination),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Administered(TraceEntry),
    Terminated(Termination),
}

/// A single exam run. Owns a private copy of the item pool.
#[derive(Debug, Clone)]
pub struct CatSession {
    pool: ItemBank,
    schedule: CorrectnessSchedule,
    bounds: ThetaBounds,
    options: EstimatorOptions,
    total_questions: usize,
    theta: f64,
    history: Vec<ResponseRecord>,
    trace: Vec<TraceEntry>,
    state: SessionState,
}

impl CatSession {
    pub fn new(
        bank: &ItemBank,
        total_questions: usize,
        initial_theta: f64,
        schedule: CorrectnessSchedule,
        bounds: ThetaBounds,
    ) -> Result<Self> {
        if total_questions == 0 {
            return Err(CatError::InvalidTotalQuestions(total_questions));
        }
        ensure_finite("initial_theta", initial_theta)?;
        bounds.validate()?;
        schedule.validate()?;

        let beyond = schedule.positions_beyond(total_questions);
        if !beyond.is_empty() {
            tracing::warn!(?beyond, total_questions, "ignoring positions past the end of the exam");
        }

        let theta = bounds.clip(initial_theta);
        if theta != initial_theta {
            tracing::warn!(initial_theta, theta, "initial theta clipped to bounds");
        }

        // No run can administer more items than the bank holds.
        let capacity = total_questions.min(bank.len());

        Ok(Self {
            pool: bank.clone(),
            schedule,
            bounds,
            options: EstimatorOptions::default(),
            total_questions,
            theta,
            history: Vec::with_capacity(capacity),
            trace: Vec::with_capacity(capacity),
            state: SessionState::Running,
        })
    }

    pub fn with_options(mut self, options: EstimatorOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn history(&self) -> &[ResponseRecord] {
        &self.history
    }

    #[inline]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Items not yet administered.
    #[inline]
    pub fn remaining(&self) -> &ItemBank {
        &self.pool
    }

    fn terminate(&mut self, termination: Termination) -> StepOutcome {
        self.state = SessionState::Terminated(termination);
        tracing::info!(
            ?termination,
            administered = self.trace.len(),
            requested = self.total_questions,
            theta = self.theta,
            "exam simulation finished"
        );
        StepOutcome::Terminated(termination)
    }

    /// Administer one item, or report why the run is over.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let SessionState::Terminated(termination) = self.state {
            return Ok(StepOutcome::Terminated(termination));
        }
        if self.trace.len() >= self.total_questions {
            return Ok(self.terminate(Termination::Complete));
        }

        // select
        let Some(item_id) = select_next_question(self.theta, &self.pool)? else {
            return Ok(self.terminate(Termination::Exhausted));
        };
        let Some(&item) = self.pool.get(item_id) else {
            return Ok(self.terminate(Termination::Exhausted));
        };

        // score
        let question_number = self.trace.len() + 1;
        let answered_correctly = self.schedule.is_correct(question_number);

        // append and re-estimate from the full history
        let theta_before = self.theta;
        self.history
            .push(ResponseRecord::from_item(&item, answered_correctly));
        let theta_after = self
            .bounds
            .clip(estimate_theta_with(&self.history, theta_before, self.bounds, &self.options));
        self.theta = theta_after;

        let entry = TraceEntry {
            question_number,
            item_id,
            a: item.a(),
            b: item.b(),
            c: item.c(),
            answered_correctly,
            theta_before,
            theta_after,
        };
        self.trace.push(entry);
        debug_assert_eq!(self.history.len(), self.trace.len());

        // remove
        self.pool.remove(item_id);

        tracing::debug!(
            question_number,
            item = %item_id,
            a = item.a(),
            b = item.b(),
            c = item.c(),
            answered_correctly,
            theta_before,
            theta_after,
            "administered item"
        );

        if self.trace.len() == self.total_questions {
            self.terminate(Termination::Complete);
        }
        Ok(StepOutcome::Administered(entry))
    }

    /// Step until the run terminates and return its trace.
    pub fn run(mut self) -> Result<Trace> {
        loop {
            if let StepOutcome::Terminated(_) = self.step()? {
                break;
            }
        }
        Ok(self.into_trace())
    }

    pub fn into_trace(self) -> Trace {
        let termination = match self.state {
            SessionState::Terminated(termination) => termination,
            SessionState::Running if self.trace.len() >= self.total_questions => {
                Termination::Complete
            }
            SessionState::Running => Termination::Exhausted,
        };
        Trace {
            entries: self.trace,
            requested: self.total_questions,
            termination,
        }
    }
}

/// Simulate one adaptive exam over a private copy of `bank`.
///
/// Fails only for invalid arguments (zero `total_questions`, non-finite
/// `initial_theta`, bad bounds or schedule). Pool exhaustion ends the run
/// early with [`Termination::Exhausted`] and estimator failures keep the
/// previous estimate.
pub fn simulate_cat_exam(
    bank: &ItemBank,
    total_questions: usize,
    initial_theta: f64,
    schedule: &CorrectnessSchedule,
    bounds: ThetaBounds,
) -> Result<Trace> {
    simulate_cat_exam_with(
        bank,
        total_questions,
        initial_theta,
        schedule,
        bounds,
        &EstimatorOptions::default(),
    )
}

pub fn simulate_cat_exam_with(
    bank: &ItemBank,
    total_questions: usize,
    initial_theta: f64,
    schedule: &CorrectnessSchedule,
    bounds: ThetaBounds,
    options: &EstimatorOptions,
) -> Result<Trace> {
    let span = tracing::info_span!("cat_exam", total_questions, bank_size = bank.len());
    let _enter = span.enter();

    tracing::info!(initial_theta, "starting exam simulation");
    CatSession::new(bank, total_questions, initial_theta, schedule.clone(), bounds)?
        .with_options(*options)
        .run()
}
