//! Prompt loader for YAML prompt overrides.

use crate::builtin::builtin;
use crate::types::PromptDefinition;
use ragdoc_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID from a prompts directory.
///
/// Looks for `<id>.yml` directly inside `prompts_dir`.
///
/// # Example
/// ```no_run
/// use ragdoc_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".ragdoc/prompts"), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.id);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let mut definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}'",
            prompt_file, definition.id
        )));
    }

    // An override must keep every variable the built-in relies on
    if let Some(base) = builtin(prompt_id) {
        for var in base.variables {
            if !definition.variables.contains(&var) {
                definition.variables.push(var);
            }
        }
    }

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt override: {}", definition.id);

    Ok(definition)
}

/// Resolve a prompt: the workspace override if present, else the built-in.
pub fn resolve_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        if dir.join(format!("{}.yml", prompt_id)).exists() {
            return load_prompt(dir, prompt_id);
        }
    }

    builtin(prompt_id).ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for var in &def.variables {
        if !def.references(var) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' must reference {{{{{}}}}}",
                def.id, var
            )));
        }
    }

    Ok(())
}
