//! Session resolution state machine.
//!
//! Given a credential pair snapshot, decides whether the caller is
//! authenticated, performing at most one refresh attempt and at most one
//! re-verification per resolution. The bound guarantees termination even
//! when the identity API inconsistently reports `expired_token`.
//!
//! Two concurrent resolutions for the same caller may each refresh; the
//! authority treats refresh as idempotent, but with rotating refresh
//! tokens the losing write can discard the peer's result. That race is
//! tolerated here, not corrected.

use tracing::{debug, info, warn};

use crate::client::IdentityApi;
use crate::models::api::ErrorKind;
use crate::models::credentials::{CredentialPair, Mutation, SessionOutcome};

/// Outcome of one refresh attempt inside a resolution.
enum RefreshStep {
    /// New access token minted; mutations already staged.
    Renewed { access_token: String },
    /// The refresh token is permanently unusable.
    Rejected,
    /// The API could not be reached or answered ambiguously.
    Unconfirmed(ErrorKind),
}

/// Resolve a credential pair snapshot against the identity API.
///
/// Performs at most two sequential network calls (one refresh, one or two
/// verifies depending on renewal). Only this function and the route gate
/// ever decide to clear stored credentials.
pub async fn resolve(pair: &CredentialPair, api: &dyn IdentityApi) -> SessionOutcome {
    let mut mutations: Vec<Mutation> = Vec::new();
    let mut renewed = false;

    // Establish a current access token, renewing up front when only a
    // refresh token is present.
    let mut access_token = match (&pair.access_token, &pair.refresh_token) {
        (None, None) => {
            debug!("No credentials present");
            return SessionOutcome::unauthenticated();
        }
        (Some(access), _) => access.clone(),
        (None, Some(refresh)) => match attempt_refresh(api, refresh, &mut mutations).await {
            RefreshStep::Renewed { access_token } => {
                renewed = true;
                access_token
            }
            RefreshStep::Rejected => return SessionOutcome::unauthenticated(),
            RefreshStep::Unconfirmed(kind) => return SessionOutcome::error(kind, mutations),
        },
    };

    loop {
        let result = api.verify(&access_token).await;
        if result.ok {
            debug!(renewed, "Session verified");
            return SessionOutcome::authenticated(mutations);
        }

        match result.error_kind() {
            ErrorKind::ExpiredToken if !renewed && pair.refresh_token.is_some() => {
                let refresh = pair.refresh_token.as_deref().unwrap_or_default();
                match attempt_refresh(api, refresh, &mut mutations).await {
                    RefreshStep::Renewed {
                        access_token: token,
                    } => {
                        renewed = true;
                        access_token = token;
                    }
                    RefreshStep::Rejected => return SessionOutcome::unauthenticated(),
                    RefreshStep::Unconfirmed(kind) => {
                        return SessionOutcome::error(kind, mutations)
                    }
                }
            }
            kind if kind.rejects_credential() => {
                // Covers invalid_token, user_not_found, revoked_token, and a
                // second expired_token after renewal. A refresh producing the
                // same identity would be rejected just the same.
                info!(kind = kind.as_str(), "Access token rejected, clearing credentials");
                return SessionOutcome::unauthenticated();
            }
            kind => {
                // Transient or unrecognized: the caller's status is
                // unconfirmed and valid credentials must survive.
                warn!(kind = kind.as_str(), "Verification unconfirmed");
                return SessionOutcome::error(kind, mutations);
            }
        }
    }
}

async fn attempt_refresh(
    api: &dyn IdentityApi,
    refresh_token: &str,
    mutations: &mut Vec<Mutation>,
) -> RefreshStep {
    debug!("Attempting access token renewal");
    let result = api.refresh(refresh_token).await;

    if result.ok {
        let Some(data) = result.data else {
            warn!("Refresh succeeded without a token payload");
            return RefreshStep::Unconfirmed(ErrorKind::Unknown);
        };
        mutations.push(Mutation::SetAccess(data.access_token.clone()));
        if let Some(rotated) = data.refresh_token.filter(|t| !t.is_empty()) {
            mutations.push(Mutation::SetRefresh(rotated));
        }
        info!("Access token renewed");
        return RefreshStep::Renewed {
            access_token: data.access_token,
        };
    }

    let kind = result.error_kind();
    if kind.rejects_credential() {
        info!(kind = kind.as_str(), "Refresh token rejected, clearing credentials");
        RefreshStep::Rejected
    } else {
        warn!(kind = kind.as_str(), "Refresh unconfirmed");
        RefreshStep::Unconfirmed(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::api::{ApiResult, TokenData};
    use crate::models::credentials::SessionStatus;

    /// Scripted identity API that counts calls per operation.
    #[derive(Default)]
    struct ScriptedApi {
        verify_results: Mutex<VecDeque<ApiResult>>,
        refresh_results: Mutex<VecDeque<ApiResult>>,
        verify_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn on_verify(self, result: ApiResult) -> Self {
            self.verify_results.lock().unwrap().push_back(result);
            self
        }

        fn on_refresh(self, result: ApiResult) -> Self {
            self.refresh_results.lock().unwrap().push_back(result);
            self
        }

        fn verify_count(&self) -> usize {
            self.verify_calls.load(Ordering::SeqCst)
        }

        fn refresh_count(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityApi for ScriptedApi {
        async fn verify(&self, _access_token: &str) -> ApiResult {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.verify_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted verify call")
        }

        async fn refresh(&self, _refresh_token: &str) -> ApiResult {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            self.refresh_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted refresh call")
        }

        async fn login(&self, _email: &str, _password: &str) -> ApiResult {
            unreachable!("resolver never logs in")
        }

        async fn signup(&self, _e: &str, _f: &str, _l: &str, _p: &str, _c: &str) -> ApiResult {
            unreachable!("resolver never signs up")
        }
    }

    fn tokens(access: &str, refresh: Option<&str>) -> ApiResult {
        ApiResult::ok_with(TokenData {
            access_token: access.into(),
            refresh_token: refresh.map(String::from),
        })
    }

    fn access_only(token: &str) -> CredentialPair {
        CredentialPair {
            access_token: Some(token.into()),
            refresh_token: None,
        }
    }

    fn refresh_only(token: &str) -> CredentialPair {
        CredentialPair {
            access_token: None,
            refresh_token: Some(token.into()),
        }
    }

    #[tokio::test]
    async fn test_empty_pair_no_network_calls() {
        let api = ScriptedApi::default();
        let outcome = resolve(&CredentialPair::empty(), &api).await;

        assert_eq!(outcome.status, SessionStatus::Unauthenticated);
        assert_eq!(outcome.mutations, vec![Mutation::ClearAll]);
        assert_eq!(api.verify_count(), 0);
        assert_eq!(api.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_access_token_single_verify() {
        let api = ScriptedApi::default().on_verify(ApiResult::ok_empty());
        let outcome = resolve(&access_only("T1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Authenticated);
        assert!(outcome.mutations.is_empty());
        assert_eq!(api.verify_count(), 1);
        assert_eq!(api.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_clears() {
        let api =
            ScriptedApi::default().on_verify(ApiResult::failure(ErrorKind::ExpiredToken));
        let outcome = resolve(&access_only("T1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Unauthenticated);
        assert_eq!(outcome.mutations, vec![Mutation::ClearAll]);
        assert_eq!(api.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_then_renewed_then_authenticated() {
        let api = ScriptedApi::default()
            .on_verify(ApiResult::failure(ErrorKind::ExpiredToken))
            .on_refresh(tokens("T2", None))
            .on_verify(ApiResult::ok_empty());
        let outcome = resolve(&CredentialPair::new("T1", "R1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Authenticated);
        assert_eq!(outcome.mutations, vec![Mutation::SetAccess("T2".into())]);
        assert_eq!(api.verify_count(), 2);
        assert_eq!(api.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_staged() {
        let api = ScriptedApi::default()
            .on_refresh(tokens("T2", Some("R2")))
            .on_verify(ApiResult::ok_empty());
        let outcome = resolve(&refresh_only("R1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Authenticated);
        assert_eq!(
            outcome.mutations,
            vec![
                Mutation::SetAccess("T2".into()),
                Mutation::SetRefresh("R2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_expired_after_renewal_clears() {
        let api = ScriptedApi::default()
            .on_verify(ApiResult::failure(ErrorKind::ExpiredToken))
            .on_refresh(tokens("T2", None))
            .on_verify(ApiResult::failure(ErrorKind::ExpiredToken));
        let outcome = resolve(&CredentialPair::new("T1", "R1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Unauthenticated);
        assert_eq!(outcome.mutations, vec![Mutation::ClearAll]);
        assert_eq!(api.verify_count(), 2);
        assert_eq!(api.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_skips_refresh() {
        let api =
            ScriptedApi::default().on_verify(ApiResult::failure(ErrorKind::InvalidToken));
        let outcome = resolve(&CredentialPair::new("T1", "R1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Unauthenticated);
        assert_eq!(outcome.mutations, vec![Mutation::ClearAll]);
        assert_eq!(api.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_api_preserves_credentials() {
        let api =
            ScriptedApi::default().on_verify(ApiResult::failure(ErrorKind::ApiUnreachable));
        let outcome = resolve(&CredentialPair::new("T1", "R1"), &api).await;

        assert_eq!(
            outcome.status,
            SessionStatus::Error(ErrorKind::ApiUnreachable)
        );
        assert!(outcome.mutations.is_empty());
    }

    #[tokio::test]
    async fn test_expired_refresh_token_clears() {
        let api =
            ScriptedApi::default().on_refresh(ApiResult::failure(ErrorKind::ExpiredToken));
        let outcome = resolve(&refresh_only("R-expired"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Unauthenticated);
        assert_eq!(outcome.mutations, vec![Mutation::ClearAll]);
        assert_eq!(api.verify_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_refresh_preserves_credentials() {
        let api =
            ScriptedApi::default().on_refresh(ApiResult::failure(ErrorKind::ApiUnreachable));
        let outcome = resolve(&refresh_only("R1"), &api).await;

        assert_eq!(
            outcome.status,
            SessionStatus::Error(ErrorKind::ApiUnreachable)
        );
        assert!(outcome.mutations.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_after_renewal_keeps_staged_tokens() {
        let api = ScriptedApi::default()
            .on_verify(ApiResult::failure(ErrorKind::ExpiredToken))
            .on_refresh(tokens("T2", None))
            .on_verify(ApiResult::failure(ErrorKind::InternalError));
        let outcome = resolve(&CredentialPair::new("T1", "R1"), &api).await;

        assert_eq!(outcome.status, SessionStatus::Error(ErrorKind::InternalError));
        // The freshly minted token survives; nothing is cleared.
        assert_eq!(outcome.mutations, vec![Mutation::SetAccess("T2".into())]);
    }
}
