//! Python bindings for the host application.

use ndarray::Array1;
use numpy::{PyArray2, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::bank;
use crate::batch::{run_subject, SubjectInput};
use crate::config::{EstimatorOptions, SubjectConfig, ThetaBounds};
use crate::error::CatError;
use crate::simulation::{self, Termination};

fn to_py_err(e: CatError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Generate a reproducible bank as an `(n_items, 3)` array of `a, b, c`.
#[pyfunction]
pub fn initialize_question_bank<'py>(
    py: Python<'py>,
    count: usize,
    seed: u64,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let bank = bank::initialize_question_bank(count, seed).map_err(to_py_err)?;
    Ok(bank.parameter_matrix().to_pyarray(py))
}

/// Simulate one adaptive exam and return its trace as numpy columns.
///
/// `question_count` is the number of responses the student actually gave
/// for the section; `0` skips the simulation and `None` uses
/// `total_questions`. The returned dict holds one array per trace column
/// plus `termination` (`"complete"`, `"exhausted"` or `"skipped"`) and
/// `skipped`.
#[pyfunction]
#[pyo3(signature = (
    bank_size,
    seed,
    total_questions,
    initial_theta = 0.0,
    wrong_positions = Vec::new(),
    to_correct = Vec::new(),
    to_incorrect = Vec::new(),
    theta_min = -4.0,
    theta_max = 4.0,
    question_count = None,
))]
#[allow(clippy::too_many_arguments)]
pub fn simulate_cat_exam<'py>(
    py: Python<'py>,
    bank_size: usize,
    seed: u64,
    total_questions: usize,
    initial_theta: f64,
    wrong_positions: Vec<usize>,
    to_correct: Vec<usize>,
    to_incorrect: Vec<usize>,
    theta_min: f64,
    theta_max: f64,
    question_count: Option<usize>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = SubjectConfig {
        name: "exam".into(),
        bank_size,
        seed_offset: 0,
        initial_theta,
        total_questions,
        theta_bounds: ThetaBounds {
            lower: theta_min,
            upper: theta_max,
        },
    };
    let input = SubjectInput {
        question_count,
        wrong_positions,
        to_correct,
        to_incorrect,
    };
    let trace = py
        .detach(|| run_subject(&config, seed, &EstimatorOptions::default(), Some(&input)))
        .map_err(to_py_err)?;

    let entries = trace.entries();
    let column = |f: fn(&simulation::TraceEntry) -> f64| -> Array1<f64> {
        entries.iter().map(f).collect()
    };

    let out = PyDict::new(py);
    out.set_item(
        "question_number",
        entries
            .iter()
            .map(|e| e.question_number as u64)
            .collect::<Array1<u64>>()
            .to_pyarray(py),
    )?;
    out.set_item(
        "question_id",
        entries
            .iter()
            .map(|e| e.item_id.0)
            .collect::<Array1<u32>>()
            .to_pyarray(py),
    )?;
    out.set_item("a", column(|e| e.a).to_pyarray(py))?;
    out.set_item("b", column(|e| e.b).to_pyarray(py))?;
    out.set_item("c", column(|e| e.c).to_pyarray(py))?;
    out.set_item(
        "answered_correctly",
        entries
            .iter()
            .map(|e| e.answered_correctly)
            .collect::<Array1<bool>>()
            .to_pyarray(py),
    )?;
    out.set_item(
        "theta_est_before_answer",
        column(|e| e.theta_before).to_pyarray(py),
    )?;
    out.set_item(
        "theta_est_after_answer",
        column(|e| e.theta_after).to_pyarray(py),
    )?;
    let termination = match trace.termination() {
        Termination::Complete => "complete",
        Termination::Exhausted => "exhausted",
        Termination::Skipped => "skipped",
    };
    out.set_item("termination", termination)?;
    out.set_item("skipped", trace.is_skipped())?;
    Ok(out)
}

/// Register engine functions with the Python module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(initialize_question_bank, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_cat_exam, m)?)?;
    Ok(())
}

/// Python module for gmat_cat.
#[pymodule]
fn gmat_cat(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register(m)
}
