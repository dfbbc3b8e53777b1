//! Auth-failure observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Name of the logout event hosts may re-broadcast on their own bus.
pub const AUTH_LOGOUT_EVENT: &str = "auth:logout";

/// Payload delivered to observers when the upstream answers 401 or 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthFailure {
    pub status: u16,
}

impl AuthFailure {
    pub fn event_name(&self) -> &'static str {
        AUTH_LOGOUT_EVENT
    }
}

/// Handle returned by registration, used to remove the observer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&AuthFailure) + Send + Sync>;

/// Registry of auth-failure observers.
#[derive(Default)]
pub struct AuthSignals {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl AuthSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AuthFailure) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let len = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() < len
    }

    pub fn count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Invoke every observer in registration order.
    ///
    /// A panicking observer is logged and skipped; the rest still run.
    /// Returns how many observers completed.
    pub fn notify(&self, failure: &AuthFailure) -> usize {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        let mut delivered = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(failure))) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::warn!(
                    event = AUTH_LOGOUT_EVENT,
                    status = failure.status,
                    "auth failure observer panicked"
                ),
            }
        }
        delivered
    }
}

impl std::fmt::Debug for AuthSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSignals")
            .field("listeners", &self.count())
            .finish()
    }
}
