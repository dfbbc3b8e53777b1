//! 类型模块：指导服务请求与响应的数据类型。
//!
//! # Types Module
//!
//! Wire types for the guidance service. Every response type keeps fields it
//! does not model in an `extra` map so payloads survive a round trip through
//! the gateway unchanged.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatRequest`] | Body sent to the RUH / UGC chat endpoints |
//! | [`ChatResponse`] | Chat reply, or the merge of two replies |
//! | [`ChatMessage`] | One conversation history entry |
//! | [`SessionCreated`] | Reply of session creation |
//! | [`ChatHistory`] | Stored history of one session |
//! | [`FeedbackType`] | Like / dislike |
//! | [`HealthStatus`] | Service health report |

pub mod chat;
pub mod session;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, DEFAULT_SESSION_ID};
pub use session::{
    ChatHistory, CreateSessionRequest, FeedbackRequest, FeedbackType, HealthStatus, SessionCreated,
};
