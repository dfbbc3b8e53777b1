//! Caller identity resolution.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Maps a bearer token to the caller's email.
///
/// Implementations never fail: any network, auth or decode problem yields `None`
/// and the caller is treated as anonymous.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: Option<&str>) -> Option<String>;
}

/// Resolves identity through `GET {auth_base}/auth/me`.
pub struct HttpIdentityResolver {
    http_client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    email: Option<String>,
}

impl HttpIdentityResolver {
    pub fn new(http_client: reqwest::Client, auth_base: &Url) -> crate::Result<Self> {
        let endpoint = crate::transport::endpoint_url(auth_base, &["auth", "me"])?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, token: Option<&str>) -> Option<String> {
        let token = token?;
        let response = match self
            .http_client
            .get(self.endpoint.clone())
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "identity lookup failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "identity lookup rejected");
            return None;
        }
        match response.json::<MeResponse>().await {
            Ok(me) => me.email.filter(|e| !e.is_empty()),
            Err(e) => {
                tracing::debug!(error = %e, "identity lookup returned an unreadable body");
                None
            }
        }
    }
}

/// Identity known up front; ignores the token.
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(Option<String>);

impl FixedIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self(Some(email.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityResolver for FixedIdentity {
    async fn resolve(&self, _token: Option<&str>) -> Option<String> {
        self.0.clone()
    }
}
