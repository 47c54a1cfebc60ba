//! Keyword-based Workflow Generation
//!
//! Translates a natural-language description into a workflow by matching
//! keywords against a fixed decision table. No model is involved, so the
//! same description always yields the same shape of workflow.
//!
//! The generated workflow is a single linear chain:
//!
//! ```text
//! trigger ──► [HTTP Request] ──► [Process Data]
//! ```
//!
//! The trigger is always present; both actions are optional.

use chrono::Utc;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::workflow::{Connection, Node, NodeParameters, NodeType, Workflow};

/// Name used when the description does not name the workflow.
pub const DEFAULT_WORKFLOW_NAME: &str = "Generated Workflow";

/// Placeholder transform inserted into generated `function` nodes.
pub const PROCESS_DATA_CODE: &str =
    "// Transform the data\nreturn items.map(item => {\n  return item;\n});";

/// Endpoint inserted into generated `http` nodes.
pub const HTTP_REQUEST_URL: &str = "https://api.example.com/data";

const HOURLY_KEYWORDS: &[&str] = &["every hour", "hourly"];
const WEBHOOK_KEYWORDS: &[&str] = &["webhook", "api call"];
const HTTP_KEYWORDS: &[&str] = &["fetch", "get data", "api", "request"];
const FUNCTION_KEYWORDS: &[&str] = &["process", "transform", "filter", "map"];

/// `called <name>`, where the name is double-quoted, single-quoted or bare.
/// A bare name may open with a quote that is never closed.
static CALLED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)called\s+(?:"([^"]*)"|'([^']*)'|["']?([^"'\r\n]+))"#)
        .expect("name pattern is valid")
});

/// Words that end a bare workflow name ("called Daily Report that runs...").
static CONNECTIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s(?:that|which|and|to|with|when|then|who)\b")
        .expect("connective pattern is valid")
});

const CLAUSE_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?'];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Cuts a bare name at the first clause boundary.
fn trim_to_clause(bare: &str) -> &str {
    let clause = match bare.find(CLAUSE_PUNCTUATION) {
        Some(end) => &bare[..end],
        None => bare,
    };
    match CONNECTIVE_PATTERN.find(clause) {
        Some(connective) => &clause[..connective.start()],
        None => clause,
    }
}

/// Extracts the workflow name from a description.
///
/// Only descriptions that say "create a workflow ... called ..." name
/// their workflow; casing of the name is preserved.
fn extract_name(description: &str, lowered: &str) -> String {
    if !(lowered.contains("create a workflow") && lowered.contains("called")) {
        return DEFAULT_WORKFLOW_NAME.to_string();
    }

    let name = CALLED_PATTERN.captures(description).and_then(|captures| {
        let quoted = captures.get(1).or_else(|| captures.get(2));
        let raw = match quoted {
            Some(m) => m.as_str(),
            None => trim_to_clause(captures.get(3)?.as_str()),
        };
        let name = raw.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
        (!name.is_empty()).then(|| name.to_string())
    });

    name.unwrap_or_else(|| DEFAULT_WORKFLOW_NAME.to_string())
}

/// Chooses the trigger node. Hourly keywords win over webhook keywords.
fn trigger_node(id: String, lowered: &str) -> Node {
    if contains_any(lowered, HOURLY_KEYWORDS) {
        Node::new(id, NodeType::Schedule, "Schedule Trigger")
            .with_parameters(NodeParameters::new().with_frequency("hourly"))
    } else if contains_any(lowered, WEBHOOK_KEYWORDS) {
        Node::new(id, NodeType::Webhook, "Webhook Trigger")
            .with_parameters(NodeParameters::new().with_path("/webhook").with_method("POST"))
    } else {
        Node::new(id, NodeType::Schedule, "Manual Trigger")
            .with_parameters(NodeParameters::new().with_frequency("manual"))
    }
}

/// Appends `node` to the chain, connecting it from the current tail.
fn append_to_chain(workflow: &mut Workflow, node: Node) {
    if let Some(tail) = workflow.nodes.last() {
        workflow
            .connections
            .push(Connection::new(tail.id.clone(), node.id.clone()));
    }
    workflow.nodes.push(node);
}

/// Generates a workflow from a description.
///
/// Node ids are `node_<n>`, numbered from the current Unix time so they
/// are distinct within the call. This function never fails; a description
/// matching no keyword yields a single manual trigger.
///
/// # Example
///
/// ```
/// use flowcomposer::generation::heuristic::generate;
/// use flowcomposer::workflow::NodeType;
///
/// let workflow = generate("fetch the orders every hour and filter them");
/// assert_eq!(workflow.nodes.len(), 3);
/// assert_eq!(workflow.nodes[0].node_type, NodeType::Schedule);
/// assert_eq!(workflow.connections.len(), 2);
/// ```
pub fn generate(description: &str) -> Workflow {
    generate_with_id_base(description, Utc::now().timestamp())
}

/// Same as [`generate`], numbering node ids from `id_base`.
pub fn generate_with_id_base(description: &str, id_base: i64) -> Workflow {
    let lowered = description.to_lowercase();
    let mut next_id = id_base;
    let mut fresh_id = || {
        let id = format!("node_{}", next_id);
        next_id += 1;
        id
    };

    let mut workflow = Workflow::new(extract_name(description, &lowered));
    append_to_chain(&mut workflow, trigger_node(fresh_id(), &lowered));

    if contains_any(&lowered, HTTP_KEYWORDS) {
        let node = Node::new(fresh_id(), NodeType::Http, "HTTP Request").with_parameters(
            NodeParameters::new()
                .with_url(HTTP_REQUEST_URL)
                .with_method("GET"),
        );
        append_to_chain(&mut workflow, node);
    }

    if contains_any(&lowered, FUNCTION_KEYWORDS) {
        let node = Node::new(fresh_id(), NodeType::Function, "Process Data")
            .with_parameters(NodeParameters::new().with_code(PROCESS_DATA_CODE));
        append_to_chain(&mut workflow, node);
    }

    debug!(
        "Heuristic generated '{}': {} nodes, {} connections",
        workflow.name,
        workflow.nodes.len(),
        workflow.connections.len()
    );
    workflow
}
