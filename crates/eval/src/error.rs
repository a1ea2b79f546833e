//! Errors raised while grading an answer.

use ragdoc_core::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("The pipeline returned an empty response")]
    EmptyResponse,

    /// The judge (or the deflection heuristic) gave no usable verdict
    #[error("Ambiguous verdict: {0}")]
    AmbiguousVerdict(String),

    #[error(transparent)]
    Pipeline(#[from] AppError),
}

pub type EvalResult<T> = Result<T, EvalError>;
