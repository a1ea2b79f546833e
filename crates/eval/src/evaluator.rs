//! Grading a pipeline answer against an expected answer.
//!
//! A question flows through: input check, query, deflection heuristic,
//! number extraction and, only when no cheaper rule decides, a judge model.

use crate::error::{EvalError, EvalResult};
use async_trait::async_trait;
use ragdoc_core::{AppError, AppResult};
use ragdoc_knowledge::QueryPipeline;
use ragdoc_llm::Generator;
use ragdoc_prompt::PromptAssembler;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Anything that can answer a question in free text.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn answer(&self, question: &str) -> AppResult<String>;
}

#[async_trait]
impl AnswerSource for QueryPipeline {
    async fn answer(&self, question: &str) -> AppResult<String> {
        Ok(self.query(question).await?.text)
    }
}

/// Outcome of comparing two answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Match,
    Mismatch,
    /// No verdict could be read; carries the reason
    Ambiguous(String),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }

    /// Collapse to a boolean, refusing to guess on ambiguity.
    pub fn into_bool(self) -> EvalResult<bool> {
        match self {
            Verdict::Match => Ok(true),
            Verdict::Mismatch => Ok(false),
            Verdict::Ambiguous(reason) => Err(EvalError::AmbiguousVerdict(reason)),
        }
    }
}

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// The answer looked like a refusal to answer
    Deflection,
    /// First integers compared, judge not consulted
    Numeric,
    /// Judge model consulted
    Judge,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub expected: String,
    pub actual: String,
    pub verdict: Verdict,
    pub method: Method,
    /// Raw judge output, when the judge was consulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgement: Option<String>,
}

/// Verdict plus how it was reached, before it is tied to a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub verdict: Verdict,
    pub method: Method,
    pub judgement: Option<String>,
}

pub struct Evaluator {
    answers: Arc<dyn AnswerSource>,
    judge: Generator,
    prompts: PromptAssembler,
    deflection_markers: Vec<String>,
}

impl Evaluator {
    pub fn new(answers: Arc<dyn AnswerSource>, judge: Generator) -> Self {
        Self {
            answers,
            judge,
            prompts: PromptAssembler::builtin(),
            deflection_markers: Vec::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptAssembler) -> Self {
        self.prompts = prompts;
        self
    }

    /// Phrases that mark an answer as a deflection. Matched case-insensitively.
    pub fn with_deflection_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deflection_markers = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    /// Ask `question` and grade the answer against `expected`.
    #[tracing::instrument(skip_all, fields(question_len = question.len()))]
    pub async fn evaluate(&self, question: &str, expected: &str) -> EvalResult<EvaluationRecord> {
        if question.trim().is_empty() {
            return Err(EvalError::EmptyQuestion);
        }

        let actual = self.answers.answer(question).await?;
        if actual.trim().is_empty() {
            return Err(EvalError::EmptyResponse);
        }

        let comparison = self.compare(expected, &actual).await?;
        tracing::info!(
            "Verdict {:?} via {:?} for question '{}'",
            comparison.verdict,
            comparison.method,
            question
        );

        Ok(EvaluationRecord {
            question: question.to_string(),
            expected: expected.to_string(),
            actual,
            verdict: comparison.verdict,
            method: comparison.method,
            judgement: comparison.judgement,
        })
    }

    /// Grade `actual` against `expected` without querying.
    pub async fn compare(&self, expected: &str, actual: &str) -> EvalResult<Comparison> {
        if let Some(marker) = self.deflection(actual) {
            return Ok(Comparison {
                verdict: Verdict::Ambiguous(format!(
                    "response deflects the question ('{}')",
                    marker
                )),
                method: Method::Deflection,
                judgement: None,
            });
        }

        if is_numeric(expected) || is_numeric(actual) {
            match (first_integer(expected)?, first_integer(actual)?) {
                (Some(want), Some(got)) => {
                    let verdict = if want == got {
                        Verdict::Match
                    } else {
                        Verdict::Mismatch
                    };
                    return Ok(Comparison {
                        verdict,
                        method: Method::Numeric,
                        judgement: None,
                    });
                }
                _ => tracing::debug!("One side has no integer; asking the judge"),
            }
        }

        let prompt = self.prompts.compare_prompt(expected, actual)?;
        let judgement = self.judge.generate(&prompt).await?;

        Ok(Comparison {
            verdict: read_judgement(&judgement),
            method: Method::Judge,
            judgement: Some(judgement),
        })
    }

    fn deflection(&self, actual: &str) -> Option<&str> {
        let lowered = actual.to_lowercase();
        self.deflection_markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
            .map(String::as_str)
    }
}

/// "true" wins over "false" when both appear.
fn read_judgement(judgement: &str) -> Verdict {
    let lowered = judgement.to_lowercase();
    if lowered.contains("true") {
        Verdict::Match
    } else if lowered.contains("false") {
        Verdict::Mismatch
    } else {
        Verdict::Ambiguous(format!(
            "judge answered neither true nor false: '{}'",
            judgement.trim()
        ))
    }
}

fn is_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// First run of ASCII digits, without leading zeros.
///
/// A pattern that fails to compile is an error, never a silent miss.
fn first_integer(text: &str) -> EvalResult<Option<&str>> {
    static NUMBER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let number = NUMBER
        .get_or_init(|| Regex::new(r"[0-9]+"))
        .as_ref()
        .map_err(|e| AppError::Other(format!("Invalid number pattern: {}", e)))?;

    Ok(number.find(text).map(|m| {
        let trimmed = m.as_str().trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }))
}
