//! Payloads of the session, history, feedback and health endpoints.

use super::chat::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /chat/session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
}

/// Reply of `POST /chat/session`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionCreated {
    #[serde(default)]
    pub session_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply of `GET /chat/{session_id}/history`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Thumbs up/down on a single assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Like => "like",
            FeedbackType::Dislike => "dislike",
        }
    }
}

impl std::str::FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "like" => Ok(FeedbackType::Like),
            "dislike" => Ok(FeedbackType::Dislike),
            other => Err(format!("unknown feedback type: {other}")),
        }
    }
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub message_index: usize,
    pub feedback_type: FeedbackType,
    pub user_id: Option<String>,
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub active_sessions: u64,
}
