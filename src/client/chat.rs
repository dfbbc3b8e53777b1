use crate::routing::{combine, error_placeholder, failed_placeholder, RoutingDecision, Upstream};
use crate::transport::{read_json, PendingCall};
use crate::types::{ChatRequest, ChatResponse, DEFAULT_SESSION_ID};
use crate::{Error, ErrorContext, Result};
use futures::future::OptionFuture;
use reqwest::{Method, RequestBuilder};

use super::core::ChatGateway;

const OPERATION: &str = "send_message";

impl ChatGateway {
    /// Start building a message for [`send_message`](Self::send_message).
    pub fn chat(&self, message: impl Into<String>) -> SendMessageBuilder<'_> {
        SendMessageBuilder::new(self, message.into())
    }

    /// Send a chat message to RUH, UGC, or both.
    ///
    /// Undergraduates always go to RUH only, and an upstream failure is
    /// returned as an error. Other callers pick with `only_use_ruh`
    /// (`Some(true)` RUH, `Some(false)` UGC, `None` both); on that path each
    /// upstream failure is folded into a placeholder reply instead of failing
    /// the call, even when it is the only upstream selected.
    ///
    /// Dropping the returned future (for example under a timeout) aborts any
    /// upstream call still in flight; a token rotated by an aborted call is
    /// not stored.
    pub async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
        guidance_filter: Option<&str>,
        only_use_ruh: Option<bool>,
    ) -> Result<ChatResponse> {
        let session_id = session_id.unwrap_or(DEFAULT_SESSION_ID);
        match self
            .route_message(message, session_id, guidance_filter, only_use_ruh)
            .await
        {
            Ok(resp) => Ok(resp),
            Err(e) => {
                tracing::error!(error = %e, session_id, "sending message failed");
                Err(e)
            }
        }
    }

    async fn route_message(
        &self,
        message: &str,
        session_id: &str,
        guidance_filter: Option<&str>,
        only_use_ruh: Option<bool>,
    ) -> Result<ChatResponse> {
        let user_id = self.resolve_identity().await;
        let request = ChatRequest::new(message, session_id)
            .with_user_id(user_id.clone())
            .with_guidance_filter(guidance_filter.map(String::from));
        let body = serde_json::to_vec(&request)?;

        let role = self.role_of(user_id.as_deref());
        if role.is_undergraduate() {
            let req = self.chat_call(Upstream::Ruh, body)?;
            let response = self.transport.send(OPERATION, req).await?;
            return read_json(OPERATION, response).await;
        }

        let decision = RoutingDecision::decide(role, only_use_ruh);
        tracing::debug!(?decision, session_id, "routing message");

        // Both calls are in flight before either is awaited; responses are
        // handled RUH first.
        let ruh = if decision.includes(Upstream::Ruh) {
            Some(self.dispatch_chat(Upstream::Ruh, body.clone())?)
        } else {
            None
        };
        let ugc = if decision.includes(Upstream::Ugc) {
            Some(self.dispatch_chat(Upstream::Ugc, body)?)
        } else {
            None
        };

        let ruh = OptionFuture::from(ruh.map(|p| self.settle_chat(Upstream::Ruh, p, session_id)))
            .await;
        let ugc = OptionFuture::from(ugc.map(|p| self.settle_chat(Upstream::Ugc, p, session_id)))
            .await;

        combine(ruh, ugc, session_id).ok_or_else(|| {
            Error::runtime_with_context(
                "no upstream selected for message",
                ErrorContext::new()
                    .with_details(format!("{:?}", decision))
                    .with_source(OPERATION),
            )
        })
    }

    fn chat_call(&self, upstream: Upstream, body: Vec<u8>) -> Result<RequestBuilder> {
        let url = self.transport.url(&[upstream.path_prefix(), "chat"])?;
        Ok(self.transport.request(Method::POST, url).body(body))
    }

    fn dispatch_chat(&self, upstream: Upstream, body: Vec<u8>) -> Result<PendingCall> {
        let req = self.chat_call(upstream, body)?;
        Ok(self.transport.dispatch(OPERATION, req))
    }

    /// Await one upstream, turning any failure into a placeholder reply.
    async fn settle_chat(
        &self,
        upstream: Upstream,
        pending: PendingCall,
        session_id: &str,
    ) -> ChatResponse {
        let request_id = pending.request_id().to_string();
        let response = match self.transport.settle(pending).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%upstream, %request_id, error = %e, "upstream call failed");
                return error_placeholder(upstream, e, session_id);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                %upstream,
                %request_id,
                status = status.as_u16(),
                "upstream returned an error status"
            );
            return failed_placeholder(upstream, status.as_u16(), session_id);
        }

        match response.json::<ChatResponse>().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%upstream, %request_id, error = %e, "upstream reply could not be read");
                error_placeholder(upstream, e, session_id)
            }
        }
    }
}

/// Builder for a single [`ChatGateway::send_message`] call.
pub struct SendMessageBuilder<'a> {
    gateway: &'a ChatGateway,
    message: String,
    session_id: Option<String>,
    guidance_filter: Option<String>,
    only_use_ruh: Option<bool>,
}

impl<'a> SendMessageBuilder<'a> {
    pub(crate) fn new(gateway: &'a ChatGateway, message: String) -> Self {
        Self {
            gateway,
            message,
            session_id: None,
            guidance_filter: None,
            only_use_ruh: None,
        }
    }

    /// Defaults to `"default"`.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn guidance_filter(mut self, filter: impl Into<String>) -> Self {
        self.guidance_filter = Some(filter.into());
        self
    }

    /// Ignored for undergraduates.
    pub fn only_use_ruh(mut self, only_use_ruh: bool) -> Self {
        self.only_use_ruh = Some(only_use_ruh);
        self
    }

    pub async fn send(self) -> Result<ChatResponse> {
        self.gateway
            .send_message(
                &self.message,
                self.session_id.as_deref(),
                self.guidance_filter.as_deref(),
                self.only_use_ruh,
            )
            .await
    }
}
