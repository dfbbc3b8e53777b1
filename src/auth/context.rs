//! Bearer-token storage shared by every call of a gateway.

use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

/// Holds the current access token.
///
/// Reads and writes are lock-free. Responses that settle concurrently may all
/// rotate the token; the last `set` wins and no ordering between them is
/// enforced.
#[derive(Clone, Default)]
pub struct AuthContext {
    token: Arc<ArcSwapOption<String>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let ctx = Self::new();
        ctx.set(token);
        ctx
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.token.load_full().map(|t| t.as_ref().clone())
    }

    pub fn set(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
    }

    pub fn clear(&self) {
        self.token.store(None);
    }

    pub fn is_present(&self) -> bool {
        self.token.load().is_some()
    }
}

impl fmt::Debug for AuthContext {
    // never print the token itself
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token_present", &self.is_present())
            .finish()
    }
}
