//! In-memory Workflow Store
//!
//! A single [`RwLock`] guards the whole map, so every operation is atomic
//! and writes to the same id are applied in lock order (last writer wins).
//! Listings come back in creation order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoredWorkflow, WorkflowListing};
use crate::workflow::Workflow;

/// Shared handle to the workflow map.
///
/// Cloning is cheap; clones see the same workflows. Callers always receive
/// copies, never references into the map.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStore {
    inner: Arc<RwLock<Records>>,
}

#[derive(Debug, Default)]
struct Records {
    /// Record and its creation sequence number
    by_id: HashMap<Uuid, (u64, StoredWorkflow)>,
    next_seq: u64,
}

impl WorkflowStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a workflow under a freshly generated id.
    pub async fn create(&self, workflow: Workflow) -> StoredWorkflow {
        let now = Utc::now();
        let record = StoredWorkflow {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            workflow,
        };

        let mut records = self.inner.write().await;
        let seq = records.next_seq;
        records.next_seq += 1;
        records.by_id.insert(record.id, (seq, record.clone()));
        drop(records);

        info!("Stored workflow '{}' as {}", record.workflow.name, record.id);
        record
    }

    /// Returns every stored workflow, oldest first.
    pub async fn list(&self) -> WorkflowListing {
        let records = self.inner.read().await;
        let mut entries: Vec<_> = records.by_id.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);

        WorkflowListing(
            entries
                .into_iter()
                .map(|(_, record)| (record.id, record.workflow.clone()))
                .collect(),
        )
    }

    /// Returns the workflow stored under `id`.
    pub async fn get(&self, id: Uuid) -> Result<Workflow, StoreError> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .map(|(_, record)| record.workflow.clone())
            .ok_or(StoreError::NotFound(id))
    }

    /// Returns the full record stored under `id`.
    pub async fn get_record(&self, id: Uuid) -> Result<StoredWorkflow, StoreError> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .map(|(_, record)| record.clone())
            .ok_or(StoreError::NotFound(id))
    }

    /// Overwrites the workflow stored under `id`.
    ///
    /// Never inserts: an unknown id is an error and leaves the store unchanged.
    pub async fn replace(&self, id: Uuid, workflow: Workflow) -> Result<Workflow, StoreError> {
        let mut records = self.inner.write().await;
        let (_, record) = records
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        record.workflow = workflow;
        record.updated_at = Utc::now();
        debug!("Replaced workflow {}", id);
        Ok(record.workflow.clone())
    }

    /// Removes the workflow stored under `id`.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let (_, record) = self
            .inner
            .write()
            .await
            .by_id
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;

        info!("Deleted workflow '{}' ({})", record.workflow.name, id);
        Ok(())
    }

    /// Returns the number of stored workflows.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}
