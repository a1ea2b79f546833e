//! Prompt builder: renders templates and assembles the RAG context block.

use crate::builtin::{eval_compare, rag_answer, CONTEXT_SEPARATOR, EVAL_COMPARE_ID, RAG_ANSWER_ID};
use crate::loader::resolve_prompt;
use crate::types::PromptDefinition;
use handlebars::Handlebars;
use ragdoc_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Build a prompt from a definition and input variables.
///
/// Every variable the definition declares must be supplied; extra variables
/// are rendered if the template uses them.
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<String> {
    tracing::debug!("Building prompt: {}", definition.id);

    for var in &definition.variables {
        if !variables.contains_key(var) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' is missing variable '{}'",
                definition.id, var
            )));
        }
    }

    render_template(&definition.template, &variables)
}

/// Join chunk texts into one context block, keeping their order.
pub fn join_context<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut context = String::new();
    for (i, text) in texts.into_iter().enumerate() {
        if i > 0 {
            context.push_str(CONTEXT_SEPARATOR);
        }
        context.push_str(text.as_ref());
    }
    context
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Holds the two prompts a ragdoc process renders.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    answer: PromptDefinition,
    compare: PromptDefinition,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptAssembler {
    /// Assembler using the compiled-in templates.
    pub fn builtin() -> Self {
        Self {
            answer: rag_answer(),
            compare: eval_compare(),
        }
    }

    /// Assembler honouring overrides in `prompts_dir`.
    pub fn from_dir(prompts_dir: &Path) -> AppResult<Self> {
        Ok(Self {
            answer: resolve_prompt(Some(prompts_dir), RAG_ANSWER_ID)?,
            compare: resolve_prompt(Some(prompts_dir), EVAL_COMPARE_ID)?,
        })
    }

    /// Render the grounded-answer prompt for `question` over `texts`.
    ///
    /// Texts are used in the order given, without deduplication.
    pub fn answer_prompt<I, S>(&self, question: &str, texts: I) -> AppResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), join_context(texts));
        vars.insert("question".to_string(), question.to_string());
        build_prompt(&self.answer, vars)
    }

    /// Render the answer-equivalence prompt.
    pub fn compare_prompt(&self, expected: &str, actual: &str) -> AppResult<String> {
        let mut vars = HashMap::new();
        vars.insert("expected".to_string(), expected.to_string());
        vars.insert("actual".to_string(), actual.to_string());
        build_prompt(&self.compare, vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Pasal 1 & 2 <KUHP>".to_string());

        let result = render_template("{{question}}", &vars).unwrap();
        assert_eq!(result, "Pasal 1 & 2 <KUHP>");
    }

    #[test]
    fn test_build_prompt_requires_declared_variables() {
        let def = PromptDefinition::new("t", "", "{{a}} {{b}}", &["a", "b"]);
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "1".to_string());

        assert!(build_prompt(&def, vars).is_err());
    }

    #[test]
    fn test_join_context_keeps_order_and_duplicates() {
        let joined = join_context(["satu", "dua", "satu"]);
        assert_eq!(joined, "satu\n\n---\n\ndua\n\n---\n\nsatu");
        assert_eq!(join_context(Vec::<String>::new()), "");
    }

    #[test]
    fn test_answer_prompt_exact_layout() {
        let assembler = PromptAssembler::builtin();
        let prompt = assembler
            .answer_prompt("Apa definisi hukum pidana?", ["A", "B"])
            .unwrap();

        assert_eq!(
            prompt,
            "Answer the question based only on the following context:\n\
             A\n\n---\n\nB\n\
             ---\n\
             Answer the question based on the above context: Apa definisi hukum pidana?"
        );
    }

    #[test]
    fn test_compare_prompt_contains_both_answers() {
        let prompt = PromptAssembler::builtin()
            .compare_prompt("3", "Terdapat 3 komponen")
            .unwrap();

        assert!(prompt.starts_with("Expected Response: 3\nActual Response: Terdapat 3 komponen\n---\n"));
        assert!(prompt.ends_with("Does the actual response match the expected response?"));
    }

    #[test]
    fn test_from_dir_uses_override() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("eval.compare.yml"),
            "id: eval.compare\ntemplate: \"{{expected}} == {{actual}}?\"\n",
        )
        .unwrap();

        let assembler = PromptAssembler::from_dir(temp_dir.path()).unwrap();
        assert_eq!(assembler.compare_prompt("a", "b").unwrap(), "a == b?");
        // No override for the answer prompt
        assert!(assembler
            .answer_prompt("q", ["c"])
            .unwrap()
            .starts_with("Answer the question"));
    }
}
