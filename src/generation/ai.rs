//! Language-model Workflow Generation
//!
//! Asks an OpenAI-compatible chat-completions service to design a workflow
//! and turns its reply into a validated [`Workflow`].
//!
//! The model is told the exact JSON shape and the valid node types. Its
//! reply may wrap the JSON in prose; the first balanced `{...}` span is
//! taken as the answer.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GenerationError;
use crate::config::AiConfig;
use crate::workflow::parser::{extract_json_object, missing_keys, workflow_from_value};
use crate::workflow::{NodeType, Workflow};

/// Instruction sent ahead of every description.
fn system_prompt() -> String {
    let node_types: Vec<&str> = NodeType::ALL.iter().map(|t| t.as_str()).collect();

    format!(
        r#"You are an expert workflow designer. Your task is to create a workflow based on a description.
Output a JSON structure that represents the workflow with the following format:
{{
    "name": "Workflow name",
    "nodes": [
        {{
            "id": "node_id",
            "type": "node_type",
            "name": "Node Name",
            "parameters": {{...}}
        }}
    ],
    "connections": [
        {{
            "source": "source_node_id",
            "target": "target_node_id"
        }}
    ]
}}

Only return valid JSON. Support these node types: {}."#,
        node_types.join(", ")
    )
}

fn user_prompt(description: &str) -> String {
    format!("Create a workflow based on this description: {}", description)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ReplyMessage,
}

/// Assistant message; `content` is null for refusals and tool calls.
#[derive(Deserialize, Debug)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Turns a model reply into a validated workflow.
///
/// The first balanced `{...}` span is parsed (the whole reply when it
/// contains no brace). The object must carry `name`, `nodes` and
/// `connections` and must describe a valid workflow.
pub fn parse_reply(reply: &str) -> Result<Workflow, GenerationError> {
    let reply = reply.trim();
    let json = extract_json_object(reply).unwrap_or(reply);

    let value: Value =
        serde_json::from_str(json).map_err(|e| GenerationError::InvalidJson(e.to_string()))?;

    let missing = missing_keys(&value);
    if !missing.is_empty() {
        return Err(GenerationError::MissingKeys(missing.join(", ")));
    }

    Ok(workflow_from_value(value)?)
}

/// Client for the language-model service.
#[derive(Clone)]
pub struct AiGenerator {
    http: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for AiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AiGenerator {
    /// Creates a generator using `api_key` and the service settings in `config`.
    ///
    /// Every request is bounded by `config.timeout`.
    pub fn new(api_key: impl Into<String>, config: &AiConfig) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        debug!("Language model endpoint: {} ({})", endpoint, config.model);

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout,
        })
    }

    /// Returns the chat-completions URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Asks the model for a workflow matching `description`.
    ///
    /// Any failure (unreachable service, timeout, error status,
    /// unparseable or incomplete reply) is returned to the caller.
    pub async fn generate(&self, description: &str) -> Result<Workflow, GenerationError> {
        info!("Requesting workflow from language model '{}'", self.model);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::new("system", system_prompt()),
                ChatMessage::new("user", user_prompt(description)),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Language model service returned {}", status);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.request_error(e))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        debug!("Language model replied with {} bytes", reply.len());

        let workflow = parse_reply(&reply)?;
        info!(
            "Language model generated '{}': {} nodes, {} connections",
            workflow.name,
            workflow.nodes.len(),
            workflow.connections.len()
        );
        Ok(workflow)
    }

    fn request_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            warn!("Language model request timed out after {:?}", self.timeout);
            GenerationError::Timeout(self.timeout)
        } else {
            warn!("Language model request failed: {}", error);
            GenerationError::Request(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::generation::heuristic::PROCESS_DATA_CODE;

    const VALID_REPLY: &str = r#"Here is the workflow you asked for:
{
    "name": "Order Sync",
    "nodes": [
        {"id": "t", "type": "webhook", "name": "Incoming", "parameters": {"path": "/orders"}},
        {"id": "f", "type": "function", "name": "Clean", "parameters": {"code": "return items;"}}
    ],
    "connections": [{"source": "t", "target": "f"}]
}
Let me know if you need changes."#;

    /// What the mock service answers with.
    #[derive(Clone)]
    enum MockReply {
        Content(String),
        Status(StatusCode),
        NoChoices,
        NullContent,
        Slow(Duration),
    }

    #[derive(Clone)]
    struct MockState {
        reply: MockReply,
        received: Arc<Mutex<Vec<Value>>>,
    }

    async fn completions(
        State(state): State<MockState>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        state.received.lock().unwrap().push(body);

        match state.reply {
            MockReply::Content(content) => (
                StatusCode::OK,
                Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]})),
            ),
            MockReply::Status(status) => (status, Json(json!({"error": "boom"}))),
            MockReply::NoChoices => (StatusCode::OK, Json(json!({"choices": []}))),
            MockReply::NullContent => (
                StatusCode::OK,
                Json(json!({"choices": [{"message": {"role": "assistant", "content": null, "refusal": "no"}}]})),
            ),
            MockReply::Slow(delay) => {
                tokio::time::sleep(delay).await;
                (StatusCode::OK, Json(json!({"choices": []})))
            }
        }
    }

    /// Starts a mock chat-completions service and returns its base URL.
    async fn spawn_mock(reply: MockReply) -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1/", addr), received)
    }

    fn config_for(base_url: String) -> AiConfig {
        AiConfig {
            api_key: Some("sk-test".to_string()),
            base_url,
            timeout: Duration::from_secs(5),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_system_prompt_lists_node_types() {
        let prompt = system_prompt();
        assert!(prompt.contains("http, function, webhook, schedule"));
        assert!(prompt.contains("\"connections\""));
    }

    #[test]
    fn test_parse_reply_with_prose() {
        let workflow = parse_reply(VALID_REPLY).unwrap();

        assert_eq!(workflow.name, "Order Sync");
        assert_eq!(workflow.nodes[0].node_type, NodeType::Webhook);
        assert_eq!(workflow.connections.len(), 1);
    }

    #[test]
    fn test_parse_reply_keeps_braces_in_code() {
        let reply = json!({
            "name": "Braces",
            "nodes": [{"id": "f", "type": "function", "name": "F", "parameters": {"code": PROCESS_DATA_CODE}}],
            "connections": []
        })
        .to_string();

        let workflow = parse_reply(&format!("Sure.\n{}\nDone.", reply)).unwrap();
        assert_eq!(workflow.nodes[0].parameters.code.as_deref(), Some(PROCESS_DATA_CODE));
    }

    #[test]
    fn test_parse_reply_missing_keys() {
        let err = parse_reply(r#"{"name": "x", "nodes": []}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MissingKeys(ref keys) if keys == "connections"));
        assert!(err.to_string().contains("missing required components"));
    }

    #[test]
    fn test_parse_reply_not_json() {
        let err = parse_reply("I cannot help with that.").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson(_)));
    }

    #[test]
    fn test_parse_reply_null_headers() {
        let reply = r#"{"name": "Ping", "nodes": [{"id": "h", "type": "http", "name": "Ping",
            "parameters": {"url": "https://x.test", "method": "GET", "headers": null}}], "connections": []}"#;

        let workflow = parse_reply(reply).unwrap();
        assert!(workflow.nodes[0].parameters.headers.is_empty());
        assert_eq!(workflow.nodes[0].parameters.method.as_deref(), Some("GET"));
    }

    #[test]
    fn test_parse_reply_invalid_workflow() {
        let err = parse_reply(
            r#"{"name": "x", "nodes": [{"id": "a", "type": "email", "name": "Mail"}], "connections": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidWorkflow(_)));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let generator = AiGenerator::new("k", &config_for("http://localhost:1/v1/".into())).unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:1/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (base_url, received) = spawn_mock(MockReply::Content(VALID_REPLY.to_string())).await;
        let generator = AiGenerator::new("sk-test", &config_for(base_url)).unwrap();

        let workflow = generator.generate("sync orders from a webhook").await.unwrap();
        assert_eq!(workflow.name, "Order Sync");

        let requests = received.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request["model"], "gpt-3.5-turbo");
        assert_eq!(request["max_tokens"], 1000);
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(
            request["messages"][1]["content"],
            "Create a workflow based on this description: sync orders from a webhook"
        );
    }

    #[tokio::test]
    async fn test_generate_service_error() {
        let (base_url, _) = spawn_mock(MockReply::Status(StatusCode::INTERNAL_SERVER_ERROR)).await;
        let generator = AiGenerator::new("sk-test", &config_for(base_url)).unwrap();

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_generate_empty_reply() {
        let (base_url, _) = spawn_mock(MockReply::NoChoices).await;
        let generator = AiGenerator::new("sk-test", &config_for(base_url)).unwrap();

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyReply));
    }

    #[tokio::test]
    async fn test_generate_null_content() {
        let (base_url, _) = spawn_mock(MockReply::NullContent).await;
        let generator = AiGenerator::new("sk-test", &config_for(base_url)).unwrap();

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyReply));
    }

    #[tokio::test]
    async fn test_generate_malformed_reply() {
        let (base_url, _) = spawn_mock(MockReply::Content("{\"name\": ".to_string())).await;
        let generator = AiGenerator::new("sk-test", &config_for(base_url)).unwrap();

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let (base_url, _) = spawn_mock(MockReply::Slow(Duration::from_secs(5))).await;
        let mut config = config_for(base_url);
        config.timeout = Duration::from_millis(200);
        let generator = AiGenerator::new("sk-test", &config).unwrap();

        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_generate_unreachable() {
        // Bind then drop to obtain a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let generator =
            AiGenerator::new("sk-test", &config_for(format!("http://{}/v1", addr))).unwrap();
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Request(_)));
    }
}
