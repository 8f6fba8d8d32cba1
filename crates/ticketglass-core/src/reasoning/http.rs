use crate::error::{Result, TicketGlassError};
use crate::reasoning::messages::{MessagesRequest, MessagesResponse};
use crate::reasoning::{ReasoningClient, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default model identifier
pub const DEFAULT_MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Default protocol version sent in every request body
pub const DEFAULT_PROTOCOL_VERSION: &str = "bedrock-2023-05-31";

/// Upper bound on generated tokens per reply
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Connection settings for [`HttpReasoningClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasoningConfig {
    /// Full URL the request body is POSTed to.
    pub endpoint: String,
    pub model: String,
    /// Sent as `x-api-key` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub protocol_version: String,
    pub max_tokens: u32,
    /// Include `model` in the body. Off for endpoints that encode the model
    /// in the URL.
    pub model_in_body: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8089/v1/messages".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            model_in_body: true,
        }
    }
}

/// Reasoning client speaking the messages envelope over HTTP.
///
/// Uses a plain `reqwest::Client`: no request timeout and no retry. A slow
/// endpoint blocks the request until it answers or the connection drops.
#[derive(Clone)]
pub struct HttpReasoningClient {
    client: reqwest::Client,
    config: ReasoningConfig,
}

impl HttpReasoningClient {
    pub fn new(config: ReasoningConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    fn build_request(&self, system: &str, conversation: &[Turn]) -> MessagesRequest {
        MessagesRequest {
            anthropic_version: self.config.protocol_version.clone(),
            max_tokens: self.config.max_tokens,
            system: system.to_string(),
            messages: conversation.to_vec(),
            model: self
                .config
                .model_in_body
                .then(|| self.config.model.clone()),
        }
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn invoke(&self, system: &str, conversation: &[Turn]) -> Result<String> {
        let body = self.build_request(system, conversation);
        log::info!(
            "Invoking {} at {} ({} turns)",
            self.config.model,
            self.config.endpoint,
            conversation.len()
        );

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("anthropic-version", &self.config.protocol_version)
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("Reasoning endpoint unreachable: {}", e);
            TicketGlassError::RemoteInvocation(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TicketGlassError::RemoteInvocation(e.to_string()))?;

        if !status.is_success() {
            log::error!("Reasoning endpoint returned {}: {}", status, text);
            return Err(TicketGlassError::RemoteInvocation(format!(
                "endpoint returned {}: {}",
                status, text
            )));
        }

        let parsed = MessagesResponse::from_body(&text)?;
        let usage = parsed.usage.unwrap_or_default();
        log::info!(
            "Reasoning reply: input_tokens={} output_tokens={} total_tokens={}",
            usage.input_tokens,
            usage.output_tokens,
            usage.total()
        );
        parsed.first_text().map(str::to_string)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let last = body["messages"]
            .as_array()
            .and_then(|m| m.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string();
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none")
            .to_string();
        Json(json!({
            "content": [{"type": "text", "text": format!("{}|{}|{}", last, key, body["model"])}],
            "usage": {"input_tokens": 10, "output_tokens": 2}
        }))
    }

    async fn broken() -> (StatusCode, &'static str) {
        (StatusCode::SERVICE_UNAVAILABLE, "throttled")
    }

    async fn empty() -> Json<Value> {
        Json(json!({"content": []}))
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/v1/messages", post(echo))
            .route("/broken", post(broken))
            .route("/empty", post(empty));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(endpoint: String) -> HttpReasoningClient {
        HttpReasoningClient::new(ReasoningConfig {
            endpoint,
            model: "test-model".to_string(),
            api_key: Some("secret".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_invoke_returns_first_text() {
        let base = spawn_server().await;
        let client = client_for(format!("{}/v1/messages", base));
        let reply = client
            .invoke("system", &[Turn::user("hi"), Turn::assistant("hello"), Turn::user("still broken")])
            .await
            .unwrap();
        assert_eq!(reply, "still broken|secret|\"test-model\"");
    }

    #[tokio::test]
    async fn test_model_omitted_from_body() {
        let base = spawn_server().await;
        let client = HttpReasoningClient::new(ReasoningConfig {
            endpoint: format!("{}/v1/messages", base),
            model_in_body: false,
            ..Default::default()
        });
        let reply = client.invoke("system", &[Turn::user("hi")]).await.unwrap();
        assert_eq!(reply, "hi|none|null");
    }

    #[tokio::test]
    async fn test_error_status_is_remote_invocation() {
        let base = spawn_server().await;
        let client = client_for(format!("{}/broken", base));
        let err = client.invoke("system", &[Turn::user("hi")]).await.unwrap_err();
        match err {
            TicketGlassError::RemoteInvocation(msg) => assert!(msg.contains("throttled")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_malformed() {
        let base = spawn_server().await;
        let client = client_for(format!("{}/empty", base));
        let err = client.invoke("system", &[Turn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, TicketGlassError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_remote_invocation() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}/v1/messages", addr));
        let err = client.invoke("system", &[Turn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, TicketGlassError::RemoteInvocation(_)));
    }
}
