//! Eval command handler.
//!
//! Runs a suite (or a single question) through the query pipeline and grades
//! each answer with the evaluator.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppError, AppResult};
use ragdoc_eval::{CaseOutcome, EvalCase, Evaluator, Suite, SuiteReport, Verdict};
use std::path::PathBuf;
use std::sync::Arc;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

/// Grade answers against an evaluation suite
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// YAML suite of {question, expected} cases
    #[arg(short, long, default_value = "suites/hukum_pidana.yaml")]
    pub suite: PathBuf,

    /// Grade a single question instead of a suite
    #[arg(long, requires = "expected")]
    pub question: Option<String>,

    /// Expected answer for --question
    #[arg(long, requires = "question")]
    pub expected: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command");

        let suite = match (&self.question, &self.expected) {
            (Some(question), Some(expected)) => Suite::new(vec![EvalCase {
                question: question.clone(),
                expected: expected.clone(),
            }]),
            _ => {
                let path = if self.suite.is_absolute() {
                    self.suite.clone()
                } else {
                    config.workspace.join(&self.suite)
                };
                Suite::load(&path)?
            }
        };

        let pipeline = super::query_pipeline(config, None)?;
        let judge = super::generator(config, &config.llm.judge_model)?;
        let evaluator = Evaluator::new(Arc::new(pipeline), judge)
            .with_prompts(super::prompts(config)?)
            .with_deflection_markers(&config.evaluation.deflection_markers);

        let report = suite.run(&evaluator).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report, !config.no_color);
        }

        if report.all_passed() {
            Ok(())
        } else {
            Err(AppError::Other(format!(
                "Evaluation did not pass: {}",
                report.summary()
            )))
        }
    }
}

fn print_report(report: &SuiteReport, color: bool) {
    for outcome in &report.outcomes {
        let (tone, label) = match outcome.verdict() {
            Some(Verdict::Match) => (GREEN, "PASS"),
            Some(Verdict::Mismatch) => (RED, "FAIL"),
            Some(Verdict::Ambiguous(_)) => (YELLOW, "AMBIGUOUS"),
            None => (RED, "ERROR"),
        };

        println!("{}", paint(&format!("[{}] {}", label, outcome.question()), tone, color));
        match outcome {
            CaseOutcome::Graded(record) => {
                println!("  expected: {}", record.expected);
                println!("  actual:   {}", record.actual);
                if let Verdict::Ambiguous(reason) = &record.verdict {
                    println!("  reason:   {}", reason);
                }
                if let Some(judgement) = &record.judgement {
                    println!("  judge:    {}", paint(judgement.trim(), tone, color));
                }
            }
            CaseOutcome::Errored { error, .. } => println!("  error:    {}", error),
        }
    }
    println!("{}", report.summary());
}

fn paint(text: &str, tone: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", tone, text, RESET)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_respects_no_color() {
        assert_eq!(paint("true", GREEN, false), "true");
        assert_eq!(paint("false", RED, true), "\x1b[91mfalse\x1b[0m");
    }
}
