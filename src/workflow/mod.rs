//! Workflow Definition Module
//!
//! Provides data structures and utilities for defining, parsing, and
//! validating workflow documents.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Node, Connection, Workflow)
//! - [`parser`]: JSON/YAML parsing, loading and JSON extraction from text
//! - [`validator`]: Validation rules and reference checking

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{Connection, Node, NodeParameters, NodeType, Workflow};
pub use parser::{extract_json_object, load_workflow, parse_workflow, save_workflow};
pub use validator::{quick_validate, validate_workflow, ValidationError};
