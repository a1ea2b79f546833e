//! Prompt types.

use serde::{Deserialize, Serialize};

fn default_api_version() -> String {
    "1.0".to_string()
}

/// A prompt definition, either built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    #[serde(default)]
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Variables the template must reference
    #[serde(default)]
    pub variables: Vec<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

impl PromptDefinition {
    /// Create a definition from an id, template and required variables.
    pub fn new(id: &str, title: &str, template: &str, variables: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            api_version: default_api_version(),
            created_by: "ragdoc".to_string(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
            template: template.to_string(),
        }
    }

    /// Whether the template mentions `{{name}}`.
    pub fn references(&self, name: &str) -> bool {
        self.template.contains(&format!("{{{{{}}}}}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: rag.answer
title: Grounded answer
apiVersion: "1.0"
createdBy: test
variables: [context, question]
template: "{{context}} / {{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "rag.answer");
        assert_eq!(def.variables, vec!["context", "question"]);
        assert!(def.references("context"));
        assert!(!def.references("expected"));
    }

    #[test]
    fn test_minimal_definition_gets_defaults() {
        let def: PromptDefinition = serde_yaml::from_str("id: x\ntemplate: hi").unwrap();
        assert_eq!(def.api_version, "1.0");
        assert!(def.variables.is_empty());
        assert!(def.title.is_empty());
    }
}
