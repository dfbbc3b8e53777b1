use crate::auth::{AuthContext, AuthSignals};
use crate::client::core::ChatGateway;
use crate::config::GatewayConfig;
use crate::identity::{HttpIdentityResolver, IdentityResolver};
use crate::role::{AllowListClassifier, RoleClassifier};
use crate::transport::{parse_base_url, HttpTransport};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`ChatGateway`].
///
/// Only the guidance base URL is required. Without an explicit resolver the
/// gateway asks `{auth_base}/auth/me`; without an explicit classifier it uses
/// an [`AllowListClassifier`] over `undergraduate_users`.
pub struct ChatGatewayBuilder {
    base_url: Option<String>,
    auth_base_url: Option<String>,
    timeout: Option<Duration>,
    auth: Option<AuthContext>,
    identity: Option<Arc<dyn IdentityResolver>>,
    classifier: Option<Arc<dyn RoleClassifier>>,
    undergraduate_users: Vec<String>,
}

impl ChatGatewayBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_base_url: None,
            timeout: None,
            auth: None,
            identity: None,
            classifier: None,
            undergraduate_users: Vec::new(),
        }
    }

    /// Start from a loaded [`GatewayConfig`].
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut builder = Self::new()
            .base_url(config.guidance_base_url.clone())
            .undergraduate_users(config.undergraduate_users.clone());
        if let Some(auth) = &config.auth_base_url {
            builder = builder.auth_base_url(auth.clone());
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Base of the chat, session, feedback and health endpoints.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Base of `/auth/me`. Defaults to the guidance base URL.
    pub fn auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = Some(url.into());
        self
    }

    /// Per-request timeout. Off by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share token storage with the host application.
    pub fn auth_context(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Seed a fresh token store with `token`.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthContext::with_token(token));
        self
    }

    pub fn identity_resolver<R: IdentityResolver + 'static>(mut self, resolver: R) -> Self {
        self.identity = Some(Arc::new(resolver));
        self
    }

    pub fn role_classifier<C: RoleClassifier + 'static>(mut self, classifier: C) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Identities treated as undergraduates by the default classifier.
    pub fn undergraduate_users(mut self, users: Vec<String>) -> Self {
        self.undergraduate_users = users;
        self
    }

    pub fn build(self) -> Result<ChatGateway> {
        let raw_base = self.base_url.ok_or_else(|| {
            Error::configuration_with_context(
                "guidance base URL must be specified",
                ErrorContext::new()
                    .with_field_path("guidance_base_url")
                    .with_source("builder"),
            )
        })?;
        let base_url = parse_base_url(&raw_base, "guidance_base_url")?;
        let auth_base = match &self.auth_base_url {
            Some(raw) => parse_base_url(raw, "auth_base_url")?,
            None => base_url.clone(),
        };

        let transport = HttpTransport::new(
            base_url,
            self.timeout,
            self.auth.unwrap_or_default(),
            Arc::new(AuthSignals::new()),
        )?;

        let identity: Arc<dyn IdentityResolver> = match self.identity {
            Some(resolver) => resolver,
            None => Arc::new(HttpIdentityResolver::new(
                transport.client().clone(),
                &auth_base,
            )?),
        };
        let classifier: Arc<dyn RoleClassifier> = match self.classifier {
            Some(classifier) => classifier,
            None => Arc::new(AllowListClassifier::new(&self.undergraduate_users)),
        };

        tracing::debug!(
            base_url = %transport.base_url(),
            auth_base = %auth_base,
            "chat gateway ready"
        );

        Ok(ChatGateway {
            transport: Arc::new(transport),
            identity,
            classifier,
        })
    }
}

impl Default for ChatGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
