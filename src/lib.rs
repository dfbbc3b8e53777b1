//! # guidance-gateway
//!
//! 指导服务聊天网关：按用户角色路由到 RUH / UGC，合并响应，并处理令牌轮换。
//!
//! Client for the guidance chat service. Messages from undergraduates go to
//! the RUH backend; other users may choose RUH, UGC, or both, in which case
//! the two replies are merged into one.
//!
//! ## Key Features
//!
//! - **Role-based routing**: [`routing::RoutingDecision`] picks the upstream(s) for a message
//! - **Fault-tolerant merging**: a failing side of a combined call becomes a placeholder reply
//! - **Token rotation**: an `x-access-token` response header replaces the stored token
//! - **Auth failure signaling**: 401/403 clears the token and notifies observers
//!   registered with [`ChatGateway::on_auth_failure`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guidance_gateway::{ChatGatewayBuilder, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> guidance_gateway::Result<()> {
//!     let config = GatewayConfig::from_env()?;
//!     let gateway = ChatGatewayBuilder::from_config(&config)
//!         .access_token("eyJhbGciOi...")
//!         .build()?;
//!
//!     gateway.on_auth_failure(|failure| {
//!         eprintln!("signed out (HTTP {})", failure.status);
//!     });
//!
//!     let reply = gateway
//!         .chat("When is the add/drop deadline?")
//!         .session_id("s-42")
//!         .send()
//!         .await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | The gateway and its builder |
//! | [`routing`] | Upstream selection and response merging |
//! | [`auth`] | Token storage, rotation and failure observers |
//! | [`identity`] | Caller identity resolution |
//! | [`role`] | Undergraduate / non-undergraduate classification |
//! | [`transport`] | Authenticated HTTP transport |
//! | [`types`] | Request and response payloads |
//! | [`config`] | Environment and YAML configuration |

pub mod auth;
pub mod client;
pub mod config;
pub mod identity;
pub mod role;
pub mod routing;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use auth::{AuthContext, AuthFailure, ListenerId, AUTH_LOGOUT_EVENT};
pub use client::{ChatGateway, ChatGatewayBuilder, SendMessageBuilder};
pub use config::GatewayConfig;
pub use identity::{FixedIdentity, HttpIdentityResolver, IdentityResolver};
pub use role::{AllowListClassifier, RoleClassifier, UserRole};
pub use routing::{RoutingDecision, Upstream};
pub use types::{
    ChatHistory, ChatMessage, ChatRequest, ChatResponse, FeedbackType, HealthStatus,
    SessionCreated,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
