//! FlowComposer - Workflow Composition Service
//!
//! A REST service for storing workflow documents and generating them from
//! natural-language descriptions. A workflow is a small directed graph of
//! typed nodes (schedule, webhook, http, function) joined by connections.
//!
//! # Architecture
//!
//! The library is organized into five main modules:
//!
//! - [`workflow`]: Data structures, parsing and validation
//! - [`generation`]: Keyword heuristic and language-model generators
//! - [`storage`]: In-memory workflow store
//! - [`api`]: HTTP routes, error mapping and server startup
//! - [`config`]: Environment-driven configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use flowcomposer::api::{self, AppState};
//! use flowcomposer::config::Config;
//! use flowcomposer::generation::Generator;
//! use flowcomposer::storage::WorkflowStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let generator = Generator::from_config(&config.ai)?;
//!
//!     let state = AppState::new(WorkflowStore::new(), generator);
//!     let app = api::app(state, config.server.static_dir.as_deref());
//!     api::serve(app, &config.server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod generation;
pub mod storage;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use generation::{GenerationError, Generator};
pub use storage::WorkflowStore;
pub use workflow::model::{Connection, Node, NodeType, Workflow};
pub use workflow::parser::load_workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "FlowComposer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports_node() {
        let node = Node::new("test", NodeType::Http, "Fetch");
        assert_eq!(node.id, "test");
        assert_eq!(node.node_type, NodeType::Http);
    }

    #[test]
    fn test_module_exports_workflow() {
        let mut workflow = Workflow::new("pair");
        workflow
            .add_node(Node::new("a", NodeType::Webhook, "In"))
            .unwrap();
        workflow.add_node(Node::new("b", NodeType::Http, "Out")).unwrap();
        workflow.connect("a", "b").unwrap();

        assert_eq!(workflow.connections, vec![Connection::new("a", "b")]);
    }

    #[test]
    fn test_default_config_selects_heuristic() {
        let generator = Generator::from_config(&Config::default().ai).unwrap();
        assert_eq!(generator.label(), "heuristic");
    }

    #[tokio::test]
    async fn test_store_round_trip_through_root_exports() {
        let store = WorkflowStore::new();
        let workflow = Generator::Heuristic.generate("fetch data hourly").await.unwrap();
        let record = store.create(workflow.clone()).await;

        assert_eq!(store.get(record.id).await.unwrap(), workflow);
    }

    #[test]
    fn test_load_workflow_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");
        std::fs::write(
            &path,
            r#"{"name": "Saved", "nodes": [{"id": "t", "type": "schedule", "name": "Start"}], "connections": []}"#,
        )
        .unwrap();

        let workflow = load_workflow(&path).unwrap();
        assert_eq!(workflow.name, "Saved");
        assert!(workflow.trigger().is_some());
    }
}
