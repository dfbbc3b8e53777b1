//! Chat payloads exchanged with the RUH and UGC endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session id used when the caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// One entry of a conversation history.
///
/// Only `role` and `content` are modelled; everything else (timestamps,
/// message ids, sources) stays in `extra` so a history can be handed back to
/// the caller verbatim. `content` keeps whatever JSON the service sent,
/// `null` included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Value::String(content.into()),
            extra: Map::new(),
        }
    }

    /// Text content, empty when the content is missing or not a string.
    pub fn text(&self) -> &str {
        self.content.as_str().unwrap_or_default()
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Body of `POST /ruh/chat` and `POST /ugc/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    /// Serialized as `null` for anonymous callers.
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_filter: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            user_id: None,
            guidance_filter: None,
        }
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_guidance_filter(mut self, filter: Option<String>) -> Self {
        self.guidance_filter = filter;
        self
    }
}

/// Reply from a chat endpoint, or the merge of two replies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default)]
    pub session_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatResponse {
    pub fn new(
        response: impl Into<String>,
        conversation_history: Vec<ChatMessage>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            response: response.into(),
            conversation_history,
            session_id: session_id.into(),
            extra: Map::new(),
        }
    }
}
