//! Workflow Storage Module
//!
//! Keeps workflows for the lifetime of the process. Nothing is written to
//! disk; a restart starts from an empty store.
//!
//! - [`memory`]: Lock-guarded in-memory store

pub mod memory;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::Workflow;

pub use memory::WorkflowStore;

/// Errors raised by store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Workflow not found")]
    NotFound(Uuid),
}

/// A workflow together with the identity the store assigned to it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredWorkflow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub workflow: Workflow,
}

/// Stored workflows in creation order.
///
/// Serializes as a JSON object keyed by id, entries in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowListing(pub Vec<(Uuid, Workflow)>);

impl WorkflowListing {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.0.iter().map(|(id, _)| *id)
    }
}

impl Serialize for WorkflowListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, workflow) in &self.0 {
            map.serialize_entry(id, workflow)?;
        }
        map.end()
    }
}
