//! Prompts compiled into the binary.
//!
//! Both can be replaced per workspace by dropping `<id>.yml` into
//! `.ragdoc/prompts/`; see [`crate::loader::resolve_prompt`].

use crate::types::PromptDefinition;

/// Grounded-answer prompt used by the query pipeline.
pub const RAG_ANSWER_ID: &str = "rag.answer";

/// Answer-equivalence prompt used by the evaluator's judge.
pub const EVAL_COMPARE_ID: &str = "eval.compare";

/// Separator placed between retrieved chunk texts in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const RAG_ANSWER_TEMPLATE: &str = "Answer the question based only on the following context:
{{context}}
---
Answer the question based on the above context: {{question}}";

const EVAL_COMPARE_TEMPLATE: &str = "Expected Response: {{expected}}
Actual Response: {{actual}}
---
Compare the actual response with the expected response. Consider numerical values and key information.
Answer with 'true' if they match semantically, or 'false' if they don't match.
Does the actual response match the expected response?";

/// The grounded-answer prompt.
pub fn rag_answer() -> PromptDefinition {
    PromptDefinition::new(
        RAG_ANSWER_ID,
        "Grounded answer",
        RAG_ANSWER_TEMPLATE,
        &["context", "question"],
    )
}

/// The answer-equivalence prompt.
pub fn eval_compare() -> PromptDefinition {
    PromptDefinition::new(
        EVAL_COMPARE_ID,
        "Answer equivalence",
        EVAL_COMPARE_TEMPLATE,
        &["expected", "actual"],
    )
}

/// Look up a built-in prompt by id.
pub fn builtin(id: &str) -> Option<PromptDefinition> {
    match id {
        RAG_ANSWER_ID => Some(rag_answer()),
        EVAL_COMPARE_ID => Some(eval_compare()),
        _ => None,
    }
}

/// Ids of every built-in prompt.
pub fn builtin_ids() -> [&'static str; 2] {
    [RAG_ANSWER_ID, EVAL_COMPARE_ID]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_reference_their_variables() {
        for id in builtin_ids() {
            let def = builtin(id).unwrap();
            assert_eq!(def.id, id);
            for var in &def.variables {
                assert!(def.references(var), "{} misses {{{{{}}}}}", id, var);
            }
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin("agent.ask.default").is_none());
    }
}
