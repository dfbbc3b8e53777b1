//! User role classification.
//!
//! The real classification rule lives outside this crate; the gateway only
//! needs a total, synchronous predicate over an optional identity.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Undergraduate,
    NonUndergraduate,
}

impl UserRole {
    pub fn is_undergraduate(&self) -> bool {
        matches!(self, UserRole::Undergraduate)
    }
}

/// Decides whether an identity belongs to an undergraduate.
///
/// Must be pure and defined for every input, `None` included.
pub trait RoleClassifier: Send + Sync {
    fn is_undergraduate(&self, identity: Option<&str>) -> bool;

    fn classify(&self, identity: Option<&str>) -> UserRole {
        if self.is_undergraduate(identity) {
            UserRole::Undergraduate
        } else {
            UserRole::NonUndergraduate
        }
    }
}

impl<F> RoleClassifier for F
where
    F: Fn(Option<&str>) -> bool + Send + Sync,
{
    fn is_undergraduate(&self, identity: Option<&str>) -> bool {
        self(identity)
    }
}

/// Classifies listed identities as undergraduates, case-insensitively.
/// Anonymous callers are never undergraduates.
#[derive(Debug, Clone, Default)]
pub struct AllowListClassifier {
    undergraduates: HashSet<String>,
}

impl AllowListClassifier {
    pub fn new<I, S>(undergraduates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            undergraduates: undergraduates
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.undergraduates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undergraduates.is_empty()
    }
}

impl RoleClassifier for AllowListClassifier {
    fn is_undergraduate(&self, identity: Option<&str>) -> bool {
        identity
            .map(|id| self.undergraduates.contains(&id.trim().to_lowercase()))
            .unwrap_or(false)
    }
}
