//! Reasoning client: one outbound call to a chat-style model endpoint.

pub mod http;
pub mod messages;

pub use http::{HttpReasoningClient, ReasoningConfig};
pub use messages::{MessagesRequest, MessagesResponse, Usage};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    #[serde(rename = "content")]
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Chat-completion style endpoint.
///
/// Exactly one remote call per `invoke`. Implementations do not retry and do
/// not fall back to local text; transport or status failures surface as
/// `RemoteInvocation`, an unreadable envelope as `MalformedResponse`.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Send the system instruction and ordered turns, return the generated text.
    async fn invoke(&self, system: &str, conversation: &[Turn]) -> Result<String>;

    /// Model identifier reported in agent output.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_as_message() {
        let json = serde_json::to_value(Turn::assistant("cache fix")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "cache fix");
    }
}
