//! Workflow Validation
//!
//! Checks a workflow's structural invariants:
//! - Every node has a non-empty ID
//! - Node IDs are unique
//! - Connections reference existing nodes

use std::collections::HashSet;

use log::{debug, info};
use thiserror::Error;

use super::model::Workflow;

/// Validation error types for user-friendly error messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload could not be read as a workflow at all
    #[error("Malformed workflow: {0}")]
    Malformed(String),

    #[error("Node has empty or whitespace-only ID")]
    EmptyNodeId,

    #[error("Duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    #[error("Connection '{from}' -> '{to}' references unknown node '{missing}'")]
    UnknownNode {
        from: String,
        to: String,
        missing: String,
    },
}

/// Validates the entire workflow structure.
///
/// Performs the following checks, stopping at the first failure:
/// 1. All nodes have a non-empty ID
/// 2. No duplicate node IDs
/// 3. Every connection endpoint names a node in this workflow
///
/// Node types need no check here: an unrecognised type never
/// deserializes into a [`Workflow`].
pub fn validate_workflow(workflow: &Workflow) -> Result<(), ValidationError> {
    debug!(
        "Validating workflow '{}' with {} nodes",
        workflow.name,
        workflow.nodes.len()
    );

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if node.id.trim().is_empty() {
            return Err(ValidationError::EmptyNodeId);
        }
        if !seen_ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateNodeId(node.id.clone()));
        }
    }

    for connection in &workflow.connections {
        for endpoint in [&connection.source, &connection.target] {
            if !seen_ids.contains(endpoint.as_str()) {
                return Err(ValidationError::UnknownNode {
                    from: connection.source.clone(),
                    to: connection.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }

    info!(
        "Workflow '{}' validated: {} nodes, {} connections",
        workflow.name,
        workflow.nodes.len(),
        workflow.connections.len()
    );
    Ok(())
}

/// Quick validation that returns every problem as a message.
///
/// Useful for editor feedback where all issues should be shown at once.
pub fn quick_validate(workflow: &Workflow) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for node in &workflow.nodes {
        if node.id.trim().is_empty() {
            errors.push(format!("Node '{}': empty ID", node.name));
            continue;
        }
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(format!("Node '{}': duplicate ID", node.id));
        }
    }

    for connection in &workflow.connections {
        if !seen_ids.contains(connection.source.as_str()) {
            errors.push(format!(
                "Connection '{}' -> '{}': unknown source",
                connection.source, connection.target
            ));
        }
        if !seen_ids.contains(connection.target.as_str()) {
            errors.push(format!(
                "Connection '{}' -> '{}': unknown target",
                connection.source, connection.target
            ));
        }
    }

    errors
}
