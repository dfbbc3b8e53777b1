//! Session, history, feedback, health and route operations.
//!
//! Each is a single authenticated call that fails with the upstream status
//! on a non-success response.

use crate::routing::Upstream;
use crate::transport::{ensure_success, read_json};
use crate::types::{
    ChatHistory, CreateSessionRequest, FeedbackRequest, FeedbackType, HealthStatus, SessionCreated,
};
use crate::Result;
use reqwest::Method;

use super::core::ChatGateway;

/// Query pairs whose value is present and non-empty.
pub(crate) fn present_params<'a>(pairs: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, &'a str)> {
    pairs
        .iter()
        .filter_map(|&(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v)))
        .collect()
}

impl ChatGateway {
    pub async fn create_new_chat_session(&self, user_id: Option<&str>) -> Result<SessionCreated> {
        const OP: &str = "create_new_chat_session";
        let user_id = self.user_or_resolved(user_id).await;
        let url = self.transport.url(&["chat", "session"])?;
        let req = self
            .transport
            .request(Method::POST, url)
            .json(&CreateSessionRequest { user_id });
        let response = self.transport.send(OP, req).await?;
        read_json(OP, response).await
    }

    /// Like or dislike the message at `message_index` of a session.
    pub async fn send_feedback(
        &self,
        session_id: &str,
        message_index: usize,
        feedback_type: FeedbackType,
        user_id: Option<&str>,
    ) -> Result<()> {
        const OP: &str = "send_feedback";
        let body = FeedbackRequest {
            session_id: session_id.to_string(),
            message_index,
            feedback_type,
            user_id: self.user_or_resolved(user_id).await,
        };
        let url = self.transport.url(&["feedback"])?;
        let req = self.transport.request(Method::POST, url).json(&body);
        let response = self.transport.send(OP, req).await?;
        ensure_success(OP, response).await?;
        Ok(())
    }

    pub async fn get_chat_history(
        &self,
        session_id: &str,
        user_id: Option<&str>,
    ) -> Result<ChatHistory> {
        const OP: &str = "get_chat_history";
        let user_id = self.user_or_resolved(user_id).await;
        let url = self.transport.url(&["chat", session_id, "history"])?;
        let mut req = self.transport.request(Method::GET, url);
        let params = present_params(&[("user_id", user_id.as_deref())]);
        if !params.is_empty() {
            req = req.query(&params);
        }
        let response = self.transport.send(OP, req).await?;
        read_json(OP, response).await
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        const OP: &str = "health_check";
        let url = self.transport.url(&["health"])?;
        let req = self.transport.request(Method::GET, url);
        let response = self.transport.send(OP, req).await?;
        read_json(OP, response).await
    }

    /// Sessions of the given (or resolved) user, as returned by the service.
    pub async fn get_chat_sessions(&self, user_id: Option<&str>) -> Result<serde_json::Value> {
        const OP: &str = "get_chat_sessions";
        let user_id = self.user_or_resolved(user_id).await;
        let url = self.transport.url(&["chat", "sessions"])?;
        let mut req = self.transport.request(Method::GET, url);
        let params = present_params(&[("user_id", user_id.as_deref())]);
        if !params.is_empty() {
            req = req.query(&params);
        }
        let response = self.transport.send(OP, req).await?;
        read_json(OP, response).await
    }

    /// Ask the caller's upstream (RUH for undergraduates, UGC otherwise) to
    /// route the latest message of a session.
    pub async fn route_latest(
        &self,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        const OP: &str = "route_latest";
        let user_id = self.user_or_resolved(user_id).await;
        let upstream = Upstream::for_role(self.role_of(user_id.as_deref()));
        let url = self
            .transport
            .url(&[upstream.path_prefix(), "chat", "route"])?;
        let mut req = self.transport.request(Method::POST, url);
        let params = present_params(&[("session_id", session_id), ("user_id", user_id.as_deref())]);
        if !params.is_empty() {
            req = req.query(&params);
        }
        let response = self.transport.send(OP, req).await?;
        read_json(OP, response).await
    }
}
