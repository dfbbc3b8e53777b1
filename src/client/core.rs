use crate::auth::{AuthContext, AuthFailure, ListenerId};
use crate::identity::IdentityResolver;
use crate::role::{RoleClassifier, UserRole};
use crate::transport::HttpTransport;
use std::sync::Arc;

/// Client for the guidance chat service.
///
/// Cheap to clone; clones share the transport, token store and observers.
#[derive(Clone)]
pub struct ChatGateway {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) identity: Arc<dyn IdentityResolver>,
    pub(crate) classifier: Arc<dyn RoleClassifier>,
}

impl ChatGateway {
    pub fn builder() -> crate::client::builder::ChatGatewayBuilder {
        crate::client::builder::ChatGatewayBuilder::new()
    }

    /// Token storage used by every call of this gateway.
    pub fn auth(&self) -> &AuthContext {
        self.transport.auth()
    }

    /// Register an observer for 401/403 responses.
    ///
    /// Observers run synchronously on the task that handled the response,
    /// after the stored token has been cleared.
    pub fn on_auth_failure<F>(&self, handler: F) -> ListenerId
    where
        F: Fn(&AuthFailure) + Send + Sync + 'static,
    {
        self.transport.signals().subscribe(handler)
    }

    pub fn remove_auth_listener(&self, id: ListenerId) -> bool {
        self.transport.signals().unsubscribe(id)
    }

    /// Identity of the current token holder, `None` when anonymous or unknown.
    pub async fn resolve_identity(&self) -> Option<String> {
        let token = self.auth().get();
        self.identity.resolve(token.as_deref()).await
    }

    /// Role of the given identity.
    pub fn role_of(&self, identity: Option<&str>) -> UserRole {
        self.classifier.classify(identity)
    }

    /// An explicit user id wins; otherwise the resolved identity.
    pub(crate) async fn user_or_resolved(&self, user_id: Option<&str>) -> Option<String> {
        match user_id {
            Some(id) => Some(id.to_string()),
            None => self.resolve_identity().await,
        }
    }
}

impl std::fmt::Debug for ChatGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGateway")
            .field("base_url", &self.transport.base_url().as_str())
            .field("auth", self.auth())
            .field("signals", self.transport.signals())
            .finish()
    }
}
