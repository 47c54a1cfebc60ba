//! Workflow and generation request handlers.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::storage::{StoredWorkflow, WorkflowListing};
use crate::workflow::{validate_workflow, Workflow};
use crate::VERSION;

/// Confirmation returned by deletions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

/// Query parameters accepted by the generation endpoint.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateParams {
    pub description: Option<String>,
}

/// Service status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub generator: String,
}

/// Reads a submitted workflow, rejecting malformed or invalid documents.
fn accept_workflow(payload: Result<Json<Workflow>, JsonRejection>) -> ApiResult<Workflow> {
    let Json(workflow) = payload?;
    validate_workflow(&workflow)?;
    Ok(workflow)
}

/// Workflow ids are UUIDs; any other path segment names no workflow.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

/// Picks the description from the query string, else from a JSON body
/// field `description`. Blank values count as missing.
fn resolve_description(params: GenerateParams, body: &[u8]) -> ApiResult<String> {
    let from_body = || {
        serde_json::from_slice::<Value>(body)
            .ok()?
            .get("description")?
            .as_str()
            .map(str::to_owned)
    };

    params
        .description
        .filter(|d| !d.trim().is_empty())
        .or_else(|| from_body().filter(|d| !d.trim().is_empty()))
        .ok_or(ApiError::MissingInput)
}

/// `POST /api/workflows/`
pub async fn create_workflow(
    State(state): State<AppState>,
    payload: Result<Json<Workflow>, JsonRejection>,
) -> ApiResult<Json<StoredWorkflow>> {
    let workflow = accept_workflow(payload)?;
    let record = state.store.create(workflow).await;
    Ok(Json(record))
}

/// `GET /api/workflows/`
pub async fn list_workflows(State(state): State<AppState>) -> Json<WorkflowListing> {
    let workflows = state.store.list().await;
    debug!("Listing {} workflows", workflows.len());
    Json(workflows)
}

/// `GET /api/workflows/{id}`
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Workflow>> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.get(id).await?))
}

/// `PUT /api/workflows/{id}`
///
/// Full replacement; an unknown id is never created.
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Workflow>, JsonRejection>,
) -> ApiResult<Json<Workflow>> {
    let id = parse_id(&id)?;
    let workflow = accept_workflow(payload)?;
    Ok(Json(state.store.replace(id, workflow).await?))
}

/// `DELETE /api/workflows/{id}`
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    Ok(Json(Message {
        message: "Workflow deleted".to_string(),
    }))
}

/// `POST /api/generate-workflow/`
///
/// The description comes from `?description=` or the JSON body; the query
/// string wins when both are present. The body is read leniently: anything
/// that is not a JSON object with a string `description` counts as absent.
pub async fn generate_workflow(
    State(state): State<AppState>,
    query: Result<Query<GenerateParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<Workflow>> {
    let Query(params) = query?;
    let description = resolve_description(params, &body)?;
    info!(
        "Generating workflow ({}) from a {}-character description",
        state.generator.label(),
        description.chars().count()
    );

    let workflow = state.generator.generate(&description).await?;
    Ok(Json(workflow))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        generator: state.generator.label().to_string(),
    })
}
