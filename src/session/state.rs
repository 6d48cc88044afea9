use std::sync::Arc;

use super::types::Identity;

/// Authentication lifecycle phase.
///
/// The identity lives inside [`Authenticated`](Self::Authenticated), so a
/// session can never report an identity while unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Authenticated(Arc<Identity>),
    Unauthenticated,
}

/// [`SessionState`] without the identity payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Initializing,
    Authenticated,
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Initializing => SessionStatus::Initializing,
            Self::Authenticated(_) => SessionStatus::Authenticated,
            Self::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// What views render from: the lifecycle phase plus the startup `loading`
/// flag.
///
/// `loading` is true from construction until the first
/// [`check_auth_status`](crate::SessionManager::check_auth_status) returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Initializing,
            loading: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    #[test]
    fn test_identity_only_when_authenticated() {
        let identity = Arc::new(Identity {
            id: UserId(1),
            email: "a@b.com".into(),
            username: "a".into(),
            first_name: String::new(),
            last_name: String::new(),
        });

        let state = SessionState::Authenticated(identity.clone());
        assert_eq!(state.status(), SessionStatus::Authenticated);
        assert_eq!(state.identity(), Some(&identity));

        assert!(SessionState::Initializing.identity().is_none());
        assert!(SessionState::Unauthenticated.identity().is_none());
        assert!(!SessionState::Unauthenticated.is_authenticated());
    }

    #[test]
    fn test_starts_initializing_and_loading() {
        let snapshot = SessionSnapshot::default();

        assert_eq!(snapshot.state.status(), SessionStatus::Initializing);
        assert!(snapshot.loading);
    }
}
