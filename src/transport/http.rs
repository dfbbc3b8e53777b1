use crate::auth::{observe_response, AuthContext, AuthSignals};
use crate::transport::TransportError;
use crate::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// Correlation id attached to every outgoing call.
pub const REQUEST_ID_HEADER: &str = "x-client-request-id";

/// A call that has been dispatched but whose response has not been handled yet.
///
/// Dropping it before [`HttpTransport::settle`] aborts the request task, so an
/// abandoned call does not keep running with its response (and any rotated
/// token on it) discarded.
pub struct PendingCall {
    operation: &'static str,
    request_id: String,
    handle: JoinHandle<reqwest::Result<Response>>,
}

impl PendingCall {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Authenticated JSON transport against the guidance service.
///
/// Every request carries the current bearer token, and every response goes
/// through token rotation / auth-failure handling before its body is read.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthContext,
    signals: Arc<AuthSignals>,
}

impl HttpTransport {
    pub fn new(
        base_url: Url,
        timeout: Option<Duration>,
        auth: AuthContext,
        signals: Arc<AuthSignals>,
    ) -> Result<Self> {
        // No timeout unless configured: a hung upstream hangs its call.
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self::with_client(client, base_url, auth, signals))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: Url,
        auth: AuthContext,
        signals: Arc<AuthSignals>,
    ) -> Self {
        Self {
            client,
            base_url,
            auth,
            signals,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn signals(&self) -> &AuthSignals {
        &self.signals
    }

    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        crate::transport::endpoint_url(&self.base_url, segments)
    }

    /// Start a request with bearer token and JSON content type set.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.auth.get() {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send and handle auth headers, without looking at the status.
    pub async fn send(&self, operation: &'static str, req: RequestBuilder) -> Result<Response> {
        let pending = self.dispatch(operation, req);
        self.settle(pending).await
    }

    /// Put a request in flight without waiting for it.
    pub fn dispatch(&self, operation: &'static str, req: RequestBuilder) -> PendingCall {
        let request_id = Uuid::new_v4().to_string();
        let req = req.header(REQUEST_ID_HEADER, request_id.as_str());
        tracing::debug!(operation, request_id = %request_id, "dispatching request");
        PendingCall {
            operation,
            request_id,
            handle: tokio::spawn(req.send()),
        }
    }

    /// Wait for a dispatched call and run rotation / auth-failure handling on it.
    pub async fn settle(&self, mut pending: PendingCall) -> Result<Response> {
        let operation = pending.operation;
        let request_id = std::mem::take(&mut pending.request_id);
        let response = (&mut pending.handle)
            .await
            .map_err(|e| {
                Error::Transport(TransportError::Other(format!(
                    "{} request task failed: {}",
                    operation, e
                )))
            })?
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        tracing::debug!(
            operation,
            request_id = %request_id,
            status = response.status().as_u16(),
            "response received"
        );
        observe_response(
            &self.auth,
            &self.signals,
            response.status(),
            response.headers(),
        );
        Ok(response)
    }
}

/// Fail with [`Error::Remote`] unless the response is a success.
pub async fn ensure_success(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // body is only for the error message; ignore read failures
    let body = response.text().await.unwrap_or_default();
    Err(Error::remote(operation, status.as_u16(), body.trim()))
}

/// Read a success response as JSON.
pub async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
    let response = ensure_success(operation, response).await?;
    let body = response
        .text()
        .await
        .map_err(|e| Error::Transport(TransportError::Http(e)))?;
    Ok(serde_json::from_str(&body)?)
}
