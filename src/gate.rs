//! Route gate: request-boundary session enforcement.
//!
//! Axum middleware that decides, per request, whether the target needs a
//! session, runs the resolver, and turns its outcome into continue or
//! redirect. Redirects use 303 See Other so a POST-originated request is
//! not replayed as a POST.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, warn};

use crate::client::IdentityApi;
use crate::config;
use crate::models::api::TokenData;
use crate::models::credentials::{Mutation, SessionStatus};
use crate::resolver;
use crate::storage::cookie;

/// Gate routing policy. All paths are static configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Requests whose path falls under this prefix require a session.
    pub protected_prefix: String,
    /// Redirect target for unauthenticated callers.
    pub sign_in_path: String,
    /// Redirect target when the identity API cannot confirm the caller.
    pub unavailable_path: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefix: config::DEFAULT_PROTECTED_PREFIX.to_string(),
            sign_in_path: config::DEFAULT_SIGN_IN_PATH.to_string(),
            unavailable_path: config::DEFAULT_UNAVAILABLE_PATH.to_string(),
        }
    }
}

/// The route gate. Shared across requests behind an `Arc`; holds no
/// per-request state.
pub struct RouteGate {
    api: Arc<dyn IdentityApi>,
    config: GateConfig,
}

impl RouteGate {
    /// Create a gate with default paths.
    pub fn new(api: Arc<dyn IdentityApi>) -> Self {
        Self::with_config(api, GateConfig::default())
    }

    /// Create a gate with a custom routing policy.
    pub fn with_config(api: Arc<dyn IdentityApi>, config: GateConfig) -> Self {
        Self { api, config }
    }

    /// Whether a request path requires a session.
    #[must_use]
    pub fn protects(&self, path: &str) -> bool {
        path.starts_with(&self.config.protected_prefix)
    }
}

impl std::fmt::Debug for RouteGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGate")
            .field("config", &self.config)
            .finish()
    }
}

/// Axum middleware enforcing the gate.
///
/// Mount with `axum::middleware::from_fn_with_state(gate, require_session)`.
pub async fn require_session(
    State(gate): State<Arc<RouteGate>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !gate.protects(&path) {
        return next.run(request).await;
    }

    let pair = cookie::pair_from_headers(request.headers());
    let outcome = resolver::resolve(&pair, gate.api.as_ref()).await;

    match outcome.status {
        SessionStatus::Authenticated => {
            debug!(path = path.as_str(), "Session confirmed");
            let mut response = next.run(request).await;
            append_mutations(&mut response, &outcome.mutations);
            response
        }
        SessionStatus::Unauthenticated => {
            debug!(path = path.as_str(), "No session, redirecting to sign-in");
            let mut response = Redirect::to(&gate.config.sign_in_path).into_response();
            append_mutations(&mut response, &outcome.mutations);
            response
        }
        SessionStatus::Error(kind) => {
            // Unconfirmed is not a pass: the caller is sent to a retry
            // target and keeps their credentials.
            warn!(
                path = path.as_str(),
                kind = kind.as_str(),
                "Session unconfirmed, redirecting to retry target"
            );
            let mut response = Redirect::to(&gate.config.unavailable_path).into_response();
            append_mutations(&mut response, &outcome.mutations);
            response
        }
    }
}

fn append_mutations(response: &mut Response, mutations: &[Mutation]) {
    match cookie::mutation_headers(mutations) {
        Ok(headers) => {
            for value in headers {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        Err(e) => {
            // A token the server minted that cannot ride in a cookie is not
            // persisted; the next request resolves again from stored state.
            warn!(error = %e, "Dropping unpersistable credential mutation");
        }
    }
}

/// Mutations that persist a token pair returned by login or signup.
pub fn establish_session(tokens: &TokenData) -> Vec<Mutation> {
    let mut mutations = vec![Mutation::SetAccess(tokens.access_token.clone())];
    if let Some(refresh) = tokens.refresh_token.as_ref().filter(|t| !t.is_empty()) {
        mutations.push(Mutation::SetRefresh(refresh.clone()));
    }
    mutations
}

/// Mutations that end the session: both entries cleared in one step.
pub fn terminate_session() -> Vec<Mutation> {
    vec![Mutation::ClearAll]
}
