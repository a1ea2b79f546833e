//! YAML evaluation suites.

use crate::evaluator::{EvaluationRecord, Evaluator, Verdict};
use ragdoc_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// One question with the answer it should get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    /// Bare numbers are accepted unquoted
    #[serde(deserialize_with = "scalar_string")]
    pub expected: String,
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a scalar answer, found {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub cases: Vec<EvalCase>,
}

impl Suite {
    pub fn new(cases: Vec<EvalCase>) -> Self {
        Self { cases }
    }

    /// Parse a YAML list of `{question, expected}` cases.
    pub fn parse(yaml: &str) -> AppResult<Self> {
        let cases: Vec<EvalCase> = serde_yaml::from_str(yaml)?;
        if cases.is_empty() {
            return Err(AppError::Input("Evaluation suite has no cases".to_string()));
        }
        Ok(Self { cases })
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Input(format!(
                "Evaluation suite not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Grade every case in order. A failing case never stops the run.
    pub async fn run(&self, evaluator: &Evaluator) -> SuiteReport {
        let mut outcomes = Vec::with_capacity(self.cases.len());

        for (n, case) in self.cases.iter().enumerate() {
            tracing::info!("Case {}/{}", n + 1, self.cases.len());
            let outcome = match evaluator.evaluate(&case.question, &case.expected).await {
                Ok(record) => CaseOutcome::Graded(record),
                Err(e) => {
                    tracing::warn!("Case {} errored: {}", n + 1, e);
                    CaseOutcome::Errored {
                        question: case.question.clone(),
                        expected: case.expected.clone(),
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        SuiteReport { outcomes }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CaseOutcome {
    Graded(EvaluationRecord),
    Errored {
        question: String,
        expected: String,
        error: String,
    },
}

impl CaseOutcome {
    pub fn question(&self) -> &str {
        match self {
            CaseOutcome::Graded(record) => &record.question,
            CaseOutcome::Errored { question, .. } => question,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            CaseOutcome::Graded(record) => Some(&record.verdict),
            CaseOutcome::Errored { .. } => None,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict().is_some_and(Verdict::is_match)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.count_verdicts(|v| matches!(v, Verdict::Mismatch))
    }

    pub fn ambiguous(&self) -> usize {
        self.count_verdicts(|v| matches!(v, Verdict::Ambiguous(_)))
    }

    pub fn errored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CaseOutcome::Errored { .. }))
            .count()
    }

    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.passed() == self.outcomes.len()
    }

    /// One-line tally, e.g. `2/4 passed, 1 failed, 1 ambiguous, 0 errored`.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} passed, {} failed, {} ambiguous, {} errored",
            self.passed(),
            self.outcomes.len(),
            self.failed(),
            self.ambiguous(),
            self.errored()
        )
    }

    fn count_verdicts(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter_map(CaseOutcome::verdict)
            .filter(|v| pred(*v))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Method;
    use ragdoc_knowledge::embeddings::providers::HashProvider;
    use ragdoc_knowledge::{
        Chunker, Document, Embedder, Indexer, QueryPipeline, Retriever, SqliteStore,
    };
    use ragdoc_llm::{Generator, MockClient};
    use ragdoc_prompt::PromptAssembler;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CORPUS: &str = "Hukum pidana adalah kumpulan aturan yang mendefinisikan perilaku \
yang dilarang. Sistem peradilan pidana terdiri dari tiga komponen utama: polisi, \
pengadilan, dan lembaga pemasyarakatan.";

    #[test]
    fn test_bundled_suite_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../suites/hukum_pidana.yaml");
        let suite = Suite::load(&path).unwrap();

        assert_eq!(suite.cases.len(), 4);
        assert_eq!(suite.cases[1].expected, "3");
        assert!(suite.cases[0].question.starts_with("Apa definisi hukum pidana?"));
    }

    #[test]
    fn test_parse_accepts_bare_numbers() {
        let suite = Suite::parse("- question: Berapa?\n  expected: 4\n").unwrap();
        assert_eq!(suite.cases[0].expected, "4");
    }

    #[test]
    fn test_empty_or_missing_suite_rejected() {
        assert!(Suite::parse("[]").unwrap_err().is_input());

        let dir = TempDir::new().unwrap();
        let err = Suite::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.is_input());
    }

    #[tokio::test]
    async fn test_suite_over_indexed_corpus() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(&dir.path().join("store.sqlite")).unwrap());
        let embedder = Embedder::new(Arc::new(HashProvider::new(128)));
        Indexer::new(store.clone(), embedder.clone(), Chunker::new(800, 80).unwrap())
            .index(&[Document::single("data/hukum_pidana.txt", CORPUS)])
            .await
            .unwrap();

        let answers = Arc::new(MockClient::fixed("unused").with_script(vec![
            Ok("Hukum pidana adalah aturan tentang perbuatan yang dilarang."),
            Ok("Ada 3 komponen utama."),
            Ok("Terdapat 5 jenis."),
            Ok("Pertanyaan tidak valid."),
        ]));
        let pipeline = QueryPipeline::new(
            Retriever::new(store, embedder),
            PromptAssembler::builtin(),
            Generator::new(answers.clone(), "llama3.2:1b"),
        );

        let judge = Arc::new(MockClient::fixed("true"));
        let evaluator = Evaluator::new(Arc::new(pipeline), Generator::new(judge.clone(), "aya:8b"))
            .with_deflection_markers(["tidak valid"]);

        let mut suite = Suite::load(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join("../../suites/hukum_pidana.yaml"),
        )
        .unwrap();
        suite.cases.push(EvalCase {
            question: "   ".to_string(),
            expected: "1".to_string(),
        });

        let report = suite.run(&evaluator).await;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.ambiguous(), 1);
        assert_eq!(report.errored(), 1);
        assert!(!report.all_passed());
        assert_eq!(report.summary(), "2/5 passed, 1 failed, 1 ambiguous, 1 errored");

        // Only the free-text definition needed the judge
        assert_eq!(judge.calls(), 1);
        assert_eq!(answers.calls(), 4);
        match &report.outcomes[1] {
            CaseOutcome::Graded(record) => assert_eq!(record.method, Method::Numeric),
            other => panic!("expected a graded case, got {:?}", other),
        }
    }
}
