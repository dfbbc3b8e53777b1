//! 认证模块：令牌存储、令牌轮换与认证失败通知。
//!
//! # Auth Module
//!
//! Every response the gateway receives passes through [`observe_response`]
//! before its body is read:
//!
//! 1. an `x-access-token` header replaces the stored token, whatever the status;
//! 2. a 401/403 clears the token and notifies every [`AuthSignals`] observer.
//!
//! Rotation runs first so a 401/403 that also carries a new token still ends
//! with the token cleared.

pub mod context;
pub mod signals;

pub use context::AuthContext;
pub use signals::{AuthFailure, AuthSignals, ListenerId, AUTH_LOGOUT_EVENT};

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

/// Response header carrying a rotated access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// What [`observe_response`] did, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthOutcome {
    pub rotated: bool,
    pub failure: Option<AuthFailure>,
}

pub fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Apply token rotation, then auth-failure handling, for one response.
pub fn observe_response(
    ctx: &AuthContext,
    signals: &AuthSignals,
    status: StatusCode,
    headers: &HeaderMap,
) -> AuthOutcome {
    let mut outcome = AuthOutcome::default();

    if let Some(value) = headers.get(ACCESS_TOKEN_HEADER) {
        match value.to_str() {
            Ok(token) => {
                ctx.set(token);
                outcome.rotated = true;
                tracing::info!(status = status.as_u16(), "access token rotated");
            }
            Err(_) => tracing::warn!("ignoring non-text {} header", ACCESS_TOKEN_HEADER),
        }
    }

    if is_auth_failure(status) {
        let failure = AuthFailure {
            status: status.as_u16(),
        };
        ctx.clear();
        tracing::warn!(
            event = AUTH_LOGOUT_EVENT,
            status = failure.status,
            "upstream rejected credentials; token cleared"
        );
        signals.notify(&failure);
        outcome.failure = Some(failure);
    }

    outcome
}
