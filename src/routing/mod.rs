//! Upstream selection and response combination.
//!
//! This module is **pure logic**: it performs no network calls. The gateway
//! uses it to pick the RUH and/or UGC endpoint for a message and to fold the
//! per-upstream results back into a single [`ChatResponse`].

use crate::role::UserRole;
use crate::types::ChatResponse;
use std::fmt;

/// One of the two chat backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Ruh,
    Ugc,
}

impl Upstream {
    /// Upper-case label used in merged replies and placeholders.
    pub fn label(&self) -> &'static str {
        match self {
            Upstream::Ruh => "RUH",
            Upstream::Ugc => "UGC",
        }
    }

    /// First path segment of the upstream's endpoints.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Upstream::Ruh => "ruh",
            Upstream::Ugc => "ugc",
        }
    }

    /// Endpoint used for the "route latest" call of a given role.
    pub fn for_role(role: UserRole) -> Self {
        if role.is_undergraduate() {
            Upstream::Ruh
        } else {
            Upstream::Ugc
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which upstreams a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    RuhOnly,
    UgcOnly,
    Combined,
}

impl RoutingDecision {
    /// Undergraduates always go to RUH. Everyone else follows `only_use_ruh`:
    /// `Some(true)` RUH, `Some(false)` UGC, `None` both.
    pub fn decide(role: UserRole, only_use_ruh: Option<bool>) -> Self {
        if role.is_undergraduate() {
            return RoutingDecision::RuhOnly;
        }
        match only_use_ruh {
            Some(true) => RoutingDecision::RuhOnly,
            Some(false) => RoutingDecision::UgcOnly,
            None => RoutingDecision::Combined,
        }
    }

    /// Selected upstreams, RUH first.
    pub fn upstreams(&self) -> &'static [Upstream] {
        match self {
            RoutingDecision::RuhOnly => &[Upstream::Ruh],
            RoutingDecision::UgcOnly => &[Upstream::Ugc],
            RoutingDecision::Combined => &[Upstream::Ruh, Upstream::Ugc],
        }
    }

    pub fn includes(&self, upstream: Upstream) -> bool {
        self.upstreams().contains(&upstream)
    }
}

/// Stand-in for an upstream that answered with a non-success status.
pub fn failed_placeholder(upstream: Upstream, status: u16, session_id: &str) -> ChatResponse {
    ChatResponse::new(
        format!("{} request failed: {}", upstream.label(), status),
        Vec::new(),
        session_id,
    )
}

/// Stand-in for an upstream whose call could not complete at all.
pub fn error_placeholder(
    upstream: Upstream,
    message: impl fmt::Display,
    session_id: &str,
) -> ChatResponse {
    ChatResponse::new(
        format!("{} request error: {}", upstream.label(), message),
        Vec::new(),
        session_id,
    )
}

/// Merge per-upstream results.
///
/// A single result is returned untouched. Two results are merged: labelled
/// text, RUH history before UGC history, and the first non-empty session id
/// of RUH, UGC, then `session_id`. Returns `None` only when neither side
/// produced anything.
pub fn combine(
    ruh: Option<ChatResponse>,
    ugc: Option<ChatResponse>,
    session_id: &str,
) -> Option<ChatResponse> {
    match (ruh, ugc) {
        (Some(ruh), Some(ugc)) => Some(merge(ruh, ugc, session_id)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn merge(ruh: ChatResponse, ugc: ChatResponse, session_id: &str) -> ChatResponse {
    let response = format!(
        "[{}]\n{}\n\n[{}]\n{}",
        Upstream::Ruh.label(),
        ruh.response,
        Upstream::Ugc.label(),
        ugc.response
    );

    let session_id = [ruh.session_id.as_str(), ugc.session_id.as_str(), session_id]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();

    let mut history = ruh.conversation_history;
    history.extend(ugc.conversation_history);

    ChatResponse::new(response, history, session_id)
}
