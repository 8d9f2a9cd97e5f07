//! Session state
//!
//! The gate only needs a synchronous "is authenticated" snapshot, exposed
//! through [`SessionState`]. [`InMemorySession`] is the default holder for
//! the signed-in user; persisting it across reloads is the host's concern.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Synchronous snapshot of authentication state
pub trait SessionState: Send + Sync {
    /// Whether a user is signed in right now
    fn is_authenticated(&self) -> bool;
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID
    pub id: String,
    /// Login name
    pub username: String,
    /// Display name
    pub nickname: String,
    /// Granted roles
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Credentials and profile of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Bearer token
    pub token: String,
    /// User profile
    pub user: UserInfo,
}

impl UserSession {
    /// A session counts only with a non-empty token
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }
}

/// In-memory session holder
#[derive(Debug, Default)]
pub struct InMemorySession {
    current: RwLock<Option<UserSession>>,
}

impl InMemorySession {
    /// Create signed-out session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create session already signed in
    #[inline]
    #[must_use]
    pub fn signed_in(session: UserSession) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    /// Store a signed-in user
    pub fn sign_in(&self, session: UserSession) {
        tracing::info!(user = %session.user.username, "signed in");
        *self.current.write() = Some(session);
    }

    /// Forget the signed-in user
    pub fn sign_out(&self) {
        if let Some(previous) = self.current.write().take() {
            tracing::info!(user = %previous.user.username, "signed out");
        }
    }

    /// Signed-in user profile
    #[must_use]
    pub fn user(&self) -> Option<UserInfo> {
        self.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Bearer token of the signed-in user
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }
}

impl SessionState for InMemorySession {
    fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(UserSession::is_valid)
    }
}

impl<S: SessionState + ?Sized> SessionState for std::sync::Arc<S> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> UserSession {
        UserSession {
            token: "tok_admin".to_string(),
            user: UserInfo {
                id: "1".to_string(),
                username: "admin".to_string(),
                nickname: "Administrator".to_string(),
                roles: vec!["admin".to_string()],
            },
        }
    }

    #[test]
    fn session_sign_in_and_out() {
        let session = InMemorySession::new();
        assert!(!session.is_authenticated());

        session.sign_in(admin());
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().username, "admin");
        assert_eq!(session.token().as_deref(), Some("tok_admin"));

        session.sign_out();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let mut user = admin();
        user.token.clear();
        assert!(!InMemorySession::signed_in(user).is_authenticated());
    }

    #[test]
    fn arc_session_delegates() {
        let session = std::sync::Arc::new(InMemorySession::signed_in(admin()));
        assert!(SessionState::is_authenticated(&session));
    }
}
