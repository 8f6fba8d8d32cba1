//! Wire envelope for the messages endpoint.

use crate::error::{Result, TicketGlassError};
use crate::reasoning::Turn;
use serde::{Deserialize, Serialize};

/// Request body posted to the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagesRequest {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Turn>,
    /// Omitted when the model is selected by the endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Response body. Only `content[0].text` matters; usage is logged.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Parse a raw body, mapping anything unreadable to `MalformedResponse`.
    pub fn from_body(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| {
            TicketGlassError::MalformedResponse(format!("response envelope is not valid JSON: {}", e))
        })
    }

    /// Text of the first content block.
    pub fn first_text(&self) -> Result<&str> {
        let block = self.content.first().ok_or_else(|| {
            TicketGlassError::MalformedResponse("response has no content blocks".to_string())
        })?;
        block.text.as_deref().ok_or_else(|| {
            TicketGlassError::MalformedResponse(format!(
                "first content block ({}) carries no text",
                block.kind.as_deref().unwrap_or("untyped")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = MessagesRequest {
            anthropic_version: "bedrock-2023-05-31".to_string(),
            max_tokens: 1024,
            system: "be kind".to_string(),
            messages: vec![Turn::user("help")],
            model: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "help");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_first_text() {
        let response = MessagesResponse::from_body(
            r#"{"content":[{"type":"text","text":"hello"}],"usage":{"input_tokens":12,"output_tokens":3}}"#,
        )
        .unwrap();
        assert_eq!(response.first_text().unwrap(), "hello");
        assert_eq!(response.usage.unwrap().total(), 15);
    }

    #[test]
    fn test_missing_text_is_malformed() {
        let empty = MessagesResponse::from_body(r#"{"content":[]}"#).unwrap();
        assert!(matches!(empty.first_text(), Err(TicketGlassError::MalformedResponse(_))));

        let no_text = MessagesResponse::from_body(r#"{"content":[{"type":"tool_use"}]}"#).unwrap();
        assert!(matches!(no_text.first_text(), Err(TicketGlassError::MalformedResponse(_))));

        assert!(matches!(
            MessagesResponse::from_body("<html>"),
            Err(TicketGlassError::MalformedResponse(_))
        ));
    }
}
