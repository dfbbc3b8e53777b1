//! Mock HTTP server setup for integration tests

use guidance_gateway::{ChatGatewayBuilder, FixedIdentity};
use mockito::{Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const UNDERGRAD: &str = "ada@ug.example.edu";
pub const STAFF: &str = "grace@example.edu";

/// Test fixture that owns a mock guidance service.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Gateway pointed at the mock server, holding token `t1`, with
    /// `@ug.example.edu` identities classified as undergraduates.
    pub fn builder(&self, identity: Option<&str>) -> ChatGatewayBuilder {
        let resolver = match identity {
            Some(email) => FixedIdentity::new(email),
            None => FixedIdentity::anonymous(),
        };
        ChatGatewayBuilder::new()
            .base_url(&self.base_url)
            .access_token("t1")
            .identity_resolver(resolver)
            .role_classifier(|id: Option<&str>| {
                id.map(|e| e.ends_with("@ug.example.edu")).unwrap_or(false)
            })
    }

    /// Chat endpoint mock answering with a JSON body.
    pub async fn mock_chat(&mut self, prefix: &str, status: usize, body: Value) -> Mock {
        self.server
            .mock("POST", format!("/{}/chat", prefix).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Chat endpoint mock that must not be hit.
    pub async fn mock_chat_unused(&mut self, prefix: &str) -> Mock {
        self.server
            .mock("POST", format!("/{}/chat", prefix).as_str())
            .with_status(200)
            .with_body(reply(prefix, &[], "unused").to_string())
            .expect(0)
            .create_async()
            .await
    }
}

/// A chat reply body whose history holds one assistant entry per item.
pub fn reply(text: &str, history: &[&str], session_id: &str) -> Value {
    let history: Vec<Value> = history
        .iter()
        .map(|c| json!({"role": "assistant", "content": c}))
        .collect();
    json!({
        "response": text,
        "conversation_history": history,
        "session_id": session_id,
    })
}
