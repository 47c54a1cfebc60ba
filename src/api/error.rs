//! HTTP error mapping.
//!
//! Every handler failure is an [`ApiError`]; its response carries the
//! matching status code and a `{"detail": "..."}` body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::GenerationError;
use crate::storage::StoreError;
use crate::workflow::ValidationError;

/// Message returned when generation is requested without a description.
pub const MISSING_DESCRIPTION: &str =
    "Workflow description is required (provide in query or body)";

/// The error type for HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Well-formed JSON that is not a valid workflow
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A body or query string the extractors rejected
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("Workflow not found")]
    NotFound,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{}", MISSING_DESCRIPTION)]
    MissingInput,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBody { status, .. } => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingInput => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(_) => Self::NotFound,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Serialized error body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            debug!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;
