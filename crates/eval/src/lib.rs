//! Answer-equivalence evaluation for ragdoc.
//!
//! Grades pipeline answers against expected answers, either by comparing
//! the numbers they contain or by asking a judge model.

pub mod error;
pub mod evaluator;
pub mod suite;

pub use error::{EvalError, EvalResult};
pub use evaluator::{AnswerSource, Comparison, EvaluationRecord, Evaluator, Method, Verdict};
pub use suite::{CaseOutcome, EvalCase, Suite, SuiteReport};
