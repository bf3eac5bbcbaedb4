//! Identity of the user that owns logged sessions.

/// Supplies the authenticated owner id, or `None` for guests.
pub trait IdentityProvider: Send + Sync {
    fn owner_id(&self) -> Option<String>;
}

/// Identity fixed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    owner_id: Option<String>,
}

impl StaticIdentity {
    /// Creates an identity; blank ids are treated as guest.
    #[must_use]
    pub fn new(owner_id: Option<String>) -> Self {
        Self {
            owner_id: owner_id.filter(|id| !id.trim().is_empty()),
        }
    }

    /// Creates an authenticated identity.
    #[must_use]
    pub fn user(owner_id: impl Into<String>) -> Self {
        Self::new(Some(owner_id.into()))
    }

    /// Creates a guest identity.
    #[must_use]
    pub fn guest() -> Self {
        Self { owner_id: None }
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.owner_id.is_none()
    }
}

impl IdentityProvider for StaticIdentity {
    fn owner_id(&self) -> Option<String> {
        self.owner_id.clone()
    }
}
