//! Workflow Data Model
//!
//! Core data structures representing workflow nodes and the connections
//! between them.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "name": "Daily Report",
//!   "nodes": [
//!     {
//!       "id": "node_1",
//!       "type": "schedule",
//!       "name": "Schedule Trigger",
//!       "parameters": { "frequency": "hourly" }
//!     },
//!     {
//!       "id": "node_2",
//!       "type": "http",
//!       "name": "HTTP Request",
//!       "parameters": { "url": "https://api.example.com/data", "method": "GET" }
//!     }
//!   ],
//!   "connections": [
//!     { "source": "node_1", "target": "node_2" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::validator::ValidationError;

/// The kind of work a node performs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Starts the workflow on a timer (or manually)
    Schedule,
    /// Starts the workflow when an inbound HTTP call arrives
    Webhook,
    /// Performs an outbound HTTP request
    Http,
    /// Runs a code snippet over the incoming items
    Function,
}

impl NodeType {
    /// All recognised node types, in the order they are documented.
    pub const ALL: [NodeType; 4] = [
        NodeType::Http,
        NodeType::Function,
        NodeType::Webhook,
        NodeType::Schedule,
    ];

    /// Returns true for node types that start a workflow.
    pub fn is_trigger(self) -> bool {
        matches!(self, NodeType::Schedule | NodeType::Webhook)
    }

    /// Returns the wire name of this node type.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Schedule => "schedule",
            NodeType::Webhook => "webhook",
            NodeType::Http => "http",
            NodeType::Function => "function",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Recognised node parameters.
///
/// Every field is optional; unrecognised keys are dropped on input.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Source code for `function` nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Inbound path for `webhook` nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Trigger frequency for `schedule` nodes (e.g. "hourly", "manual")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub headers: BTreeMap<String, String>,
}

impl NodeParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    /// Adds a single request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns true if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A single typed node in a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identifier, unique within the owning workflow
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Human-readable label
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: NodeParameters,
}

impl Node {
    /// Creates a node with empty parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use flowcomposer::workflow::{Node, NodeParameters, NodeType};
    ///
    /// let node = Node::new("fetch", NodeType::Http, "Fetch Orders")
    ///     .with_parameters(NodeParameters::new().with_url("https://example.com").with_method("GET"));
    /// assert_eq!(node.parameters.method.as_deref(), Some("GET"));
    /// ```
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            node_type,
            name: name.into(),
            parameters: NodeParameters::default(),
        }
    }

    /// Replaces this node's parameters.
    pub fn with_parameters(mut self, parameters: NodeParameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A directed edge between two nodes, referenced by id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A named directed graph of nodes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,

    /// Nodes in insertion order
    pub nodes: Vec<Node>,

    /// Connections in insertion order
    pub connections: Vec<Connection>,
}

impl Workflow {
    /// Creates an empty workflow with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Appends a node, rejecting duplicate ids.
    pub fn add_node(&mut self, node: Node) -> Result<(), ValidationError> {
        if self.nodes.iter().any(|n| n.id == node.id) {
            return Err(ValidationError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Connects two existing nodes.
    pub fn connect(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let connection = Connection::new(source, target);

        for endpoint in [&connection.source, &connection.target] {
            if self.get_node(endpoint).is_none() {
                return Err(ValidationError::UnknownNode {
                    from: connection.source.clone(),
                    to: connection.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }

        self.connections.push(connection);
        Ok(())
    }

    /// Gets a node by ID.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the first node if it is a trigger.
    pub fn trigger(&self) -> Option<&Node> {
        self.nodes.first().filter(|n| n.node_type.is_trigger())
    }

    /// Returns the ids of nodes directly downstream of `id`.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.connections
            .iter()
            .filter(|c| c.source == id)
            .map(|c| c.target.as_str())
            .collect()
    }

    /// Returns the number of nodes in the workflow.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the workflow has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
