//! Workflow Generation Module
//!
//! Turns natural-language descriptions into workflows.
//!
//! # Structure
//!
//! - [`heuristic`]: Keyword decision table, no external calls
//! - [`ai`]: Language-model service client
//!
//! [`Generator`] selects between the two once, from configuration: a
//! configured credential selects the language model, otherwise the
//! heuristic is used. A failed model call is reported as an error and is
//! never retried with the heuristic.

pub mod ai;
pub mod heuristic;

use std::time::Duration;

use log::info;
use thiserror::Error;

use crate::config::AiConfig;
use crate::workflow::{ValidationError, Workflow};

pub use ai::AiGenerator;

/// Errors raised while generating a workflow with the language model.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to generate workflow: request to language model service failed: {0}")]
    Request(String),

    #[error("Failed to generate workflow: language model service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Failed to generate workflow: language model service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to generate workflow: language model returned no reply")]
    EmptyReply,

    #[error("Failed to generate workflow: reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Failed to generate workflow: generated workflow is missing required components: {0}")]
    MissingKeys(String),

    #[error("Failed to generate workflow: {0}")]
    InvalidWorkflow(#[from] ValidationError),
}

/// Generation strategy, chosen from configuration.
#[derive(Debug, Clone)]
pub enum Generator {
    /// Keyword decision table
    Heuristic,
    /// Language-model service
    Ai(AiGenerator),
}

impl Generator {
    /// Selects the language model when a credential is configured,
    /// the heuristic otherwise.
    pub fn from_config(config: &AiConfig) -> Result<Self, GenerationError> {
        match config.credential() {
            Some(api_key) => Ok(Self::Ai(AiGenerator::new(api_key, config)?)),
            None => {
                info!("Language model API key not found. Using rule-based generation.");
                Ok(Self::Heuristic)
            }
        }
    }

    /// Returns true if this generator calls the language model.
    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai(_))
    }

    /// Short label for logs and health output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Ai(_) => "ai",
        }
    }

    /// Generates a workflow from a description.
    ///
    /// The heuristic variant never fails.
    pub async fn generate(&self, description: &str) -> Result<Workflow, GenerationError> {
        match self {
            Self::Heuristic => Ok(heuristic::generate(description)),
            Self::Ai(generator) => generator.generate(description).await,
        }
    }
}
