//! Signed-in identity surface consumed by the sync scheduler

use std::fmt;

use serde::{Deserialize, Serialize};

/// The signed-in user, as reported by the auth layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session holding the remote access token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Reports whether a user is signed in.
///
/// Anonymous (local-only) mode reports `None`, which gates off all network
/// sync; the engine never attempts remote calls on behalf of nobody.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;
}

/// Fixed identity, for the CLI and tests
pub struct StaticIdentity {
    user: Option<AuthUser>,
}

impl StaticIdentity {
    /// Anonymous local-only mode
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    /// A signed-in user
    #[must_use]
    pub const fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_debug_redacts_token() {
        let session = AuthSession {
            access_token: "secret".to_string(),
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn static_identity_modes() {
        assert!(StaticIdentity::anonymous().current_user().is_none());

        let user = AuthUser {
            id: "user-1".to_string(),
            email: Some("me@example.com".to_string()),
        };
        let identity = StaticIdentity::signed_in(user.clone());
        assert_eq!(identity.current_user(), Some(user));
    }
}
