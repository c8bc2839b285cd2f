//! Computerized adaptive testing engine for simulated GMAT section diagnostics.
//!
//! This crate provides:
//! - Three-parameter logistic (3PL) response probability and Fisher information
//! - Negative log-likelihood of a response history
//! - Bounded maximum-likelihood ability estimation that never aborts a run
//! - Reproducible synthetic item banks
//! - Maximum-information item selection
//! - A step-wise exam simulator producing a per-item trace
//! - Parallel per-subject orchestration for a full diagnostic run
//! - Optional Python bindings (feature `python`)

pub mod utils;

pub mod bank;
pub mod batch;
pub mod cat;
pub mod config;
pub mod error;
pub mod estimation;
pub mod item;
pub mod likelihood;
pub mod model;
#[cfg(feature = "python")]
pub mod python;
pub mod simulation;

pub use bank::{initialize_question_bank, ItemBank};
pub use batch::{run_batch, run_subject, BatchReport, SubjectInput, SubjectReport};
pub use cat::select_next_question;
pub use config::{BatchConfig, EstimatorOptions, SubjectConfig, ThetaBounds};
pub use error::{CatError, ErrorKind, Result};
pub use estimation::{estimate_theta, try_estimate_theta};
pub use item::{Item, ItemId, ResponseRecord};
pub use likelihood::neg_log_likelihood;
pub use model::{item_information, probability_correct};
pub use simulation::{
    simulate_cat_exam, CatSession, CorrectnessSchedule, Termination, Trace, TraceEntry,
};
