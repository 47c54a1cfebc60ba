//! Workflow Parser
//!
//! Reads workflow documents from JSON text, JSON values and files, and
//! locates JSON objects embedded in free-form text (as produced by
//! language models that wrap their answer in prose).

use std::error::Error;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use super::model::Workflow;
use super::validator::{validate_workflow, ValidationError};

/// Top-level keys every workflow document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["name", "nodes", "connections"];

/// Parses and validates a workflow from JSON text.
pub fn parse_workflow(json: &str) -> Result<Workflow, ValidationError> {
    let workflow: Workflow =
        serde_json::from_str(json).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate_workflow(&workflow)?;
    Ok(workflow)
}

/// Converts and validates a workflow from an already-parsed JSON value.
pub fn workflow_from_value(value: Value) -> Result<Workflow, ValidationError> {
    let workflow: Workflow =
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate_workflow(&workflow)?;
    Ok(workflow)
}

/// Returns the required top-level keys absent from `value`.
///
/// A non-object value is missing all of them.
pub fn missing_keys(value: &Value) -> Vec<&'static str> {
    match value.as_object() {
        Some(object) => REQUIRED_KEYS
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect(),
        None => REQUIRED_KEYS.to_vec(),
    }
}

/// Locates the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) are
/// ignored, so nested objects and strings such as `"a } b"` do not end
/// the span early. Returns `None` if no opening brace exists or the
/// first object is never closed.
///
/// # Example
///
/// ```
/// use flowcomposer::workflow::parser::extract_json_object;
///
/// let reply = "Sure! Here it is: {\"a\": {\"b\": 1}} Enjoy.";
/// assert_eq!(extract_json_object(reply), Some("{\"a\": {\"b\": 1}}"));
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Returns true if `path` names a YAML document.
fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Loads a workflow from a JSON or YAML file.
///
/// The format is chosen by extension (`.yaml`/`.yml` for YAML, anything
/// else is read as JSON). The loaded workflow is validated.
///
/// # Example
///
/// ```rust,no_run
/// use flowcomposer::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("report.json")?;
///     println!("Loaded {} nodes", workflow.nodes.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow, Box<dyn Error>> {
    let path = path.as_ref();
    info!("Loading workflow from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read workflow file '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        )
    })?;

    debug!("Workflow document loaded ({} bytes)", content.len());

    let workflow = if is_yaml(path) {
        let workflow: Workflow = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse workflow YAML: {}. Check the file format.", e))?;
        validate_workflow(&workflow)?;
        workflow
    } else {
        parse_workflow(&content)?
    };

    info!(
        "Parsed workflow '{}': {} nodes, {} connections",
        workflow.name,
        workflow.nodes.len(),
        workflow.connections.len()
    );
    Ok(workflow)
}

/// Saves a workflow to a JSON or YAML file, chosen by extension.
pub fn save_workflow(workflow: &Workflow, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let content = if is_yaml(path) {
        serde_yaml::to_string(workflow)?
    } else {
        serde_json::to_string_pretty(workflow)?
    };
    fs::write(path, content)?;
    info!("Workflow saved to: {}", path.display());
    Ok(())
}
