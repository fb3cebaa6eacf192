//! Credential pair and session outcome types.

use serde::{Deserialize, Serialize};

use super::api::ErrorKind;

/// The stored access/refresh credential pair.
///
/// Both tokens are opaque bearer strings; the identity API is the only
/// authority on their validity. A pair is always in exactly one of the
/// four [`PairState`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived bearer token for resource calls.
    pub access_token: Option<String>,
    /// Longer-lived token used only to mint new access tokens.
    pub refresh_token: Option<String>,
}

/// Which of the two tokens are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    /// Neither token present.
    Empty,
    /// Access token only. Valid mid-session, but cannot be renewed.
    AccessOnly,
    /// Refresh token only. Renewable but not yet usable.
    RefreshOnly,
    /// Both tokens present.
    Both,
}

impl CredentialPair {
    /// Empty pair, the state at session start.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pair holding both tokens.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Current presence state.
    #[must_use]
    pub fn state(&self) -> PairState {
        match (&self.access_token, &self.refresh_token) {
            (None, None) => PairState::Empty,
            (Some(_), None) => PairState::AccessOnly,
            (None, Some(_)) => PairState::RefreshOnly,
            (Some(_), Some(_)) => PairState::Both,
        }
    }

    /// True when neither token is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state() == PairState::Empty
    }

    /// Replay mutations in order against this pair.
    pub fn apply(&mut self, mutations: &[Mutation]) {
        for m in mutations {
            match m {
                Mutation::SetAccess(token) => self.access_token = Some(token.clone()),
                Mutation::SetRefresh(token) => self.refresh_token = Some(token.clone()),
                Mutation::ClearAll => {
                    self.access_token = None;
                    self.refresh_token = None;
                }
            }
        }
    }
}

/// A single persistence operation staged by the resolver.
///
/// Order matters when applied. Clearing is a single atomic operation on
/// both entries so a failure path can never leave one token behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Store a new access token.
    SetAccess(String),
    /// Store a new (rotated) refresh token.
    SetRefresh(String),
    /// Remove both tokens. Idempotent.
    ClearAll,
}

/// Terminal authentication decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The caller holds a valid session.
    Authenticated,
    /// The caller holds no usable session.
    Unauthenticated,
    /// The identity API could not confirm either way. Credentials are not
    /// destroyed on this path.
    Error(ErrorKind),
}

/// Result of one session resolution: the decision plus the credential
/// mutations the caller must persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub mutations: Vec<Mutation>,
}

impl SessionOutcome {
    /// Authenticated, persisting whatever a renewal staged along the way.
    pub fn authenticated(mutations: Vec<Mutation>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            mutations,
        }
    }

    /// Unauthenticated with both entries cleared.
    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            mutations: vec![Mutation::ClearAll],
        }
    }

    /// Unconfirmed. Carries only non-destructive mutations (tokens already
    /// minted by a successful refresh), never a clear.
    pub fn error(kind: ErrorKind, mutations: Vec<Mutation>) -> Self {
        Self {
            status: SessionStatus::Error(kind),
            mutations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_states() {
        assert_eq!(CredentialPair::empty().state(), PairState::Empty);
        assert_eq!(CredentialPair::new("a", "r").state(), PairState::Both);

        let access_only = CredentialPair {
            access_token: Some("a".into()),
            refresh_token: None,
        };
        assert_eq!(access_only.state(), PairState::AccessOnly);

        let refresh_only = CredentialPair {
            access_token: None,
            refresh_token: Some("r".into()),
        };
        assert_eq!(refresh_only.state(), PairState::RefreshOnly);
    }

    #[test]
    fn test_apply_in_order() {
        let mut pair = CredentialPair::new("old", "old-r");
        pair.apply(&[
            Mutation::ClearAll,
            Mutation::SetAccess("new".into()),
            Mutation::SetRefresh("new-r".into()),
        ]);
        assert_eq!(pair, CredentialPair::new("new", "new-r"));
    }

    #[test]
    fn test_clear_is_atomic_and_idempotent() {
        let mut pair = CredentialPair {
            access_token: Some("a".into()),
            refresh_token: None,
        };
        pair.apply(&[Mutation::ClearAll]);
        assert!(pair.is_empty());
        pair.apply(&[Mutation::ClearAll]);
        assert!(pair.is_empty());
    }
}
