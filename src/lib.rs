//! # session-gate
//!
//! Session authentication gate for applications that delegate credential
//! verification to a remote identity API.
//!
//! The core is the token lifecycle: for every incoming request, decide
//! whether the caller holds a valid session, transparently renew an
//! expired access token with the longer-lived refresh token (at most once
//! per resolution), and persist the renewed pair. Both tokens are opaque
//! bearer strings; the remote identity API is the only authority on them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use session_gate::{IdentityClient, RouteGate, require_session};
//!
//! # fn main() -> session_gate::Result<()> {
//! let api = Arc::new(IdentityClient::new("https://id.example.com")?);
//! let gate = Arc::new(RouteGate::new(api));
//!
//! let app: axum::Router = axum::Router::new()
//!     .route("/dashboard", axum::routing::get(|| async { "protected" }))
//!     .layer(axum::middleware::from_fn_with_state(gate, require_session));
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure policy
//!
//! Rejected credentials (`invalid_token`, `revoked_token`, a second
//! `expired_token` after renewal) clear the stored pair and redirect to
//! sign-in. Transient failures (unreachable API, timeouts, server errors)
//! never destroy stored credentials; the caller is redirected to a retry
//! target instead of being silently let through.

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod resolver;
pub mod storage;

// Re-exports for ergonomic usage
pub use client::{IdentityApi, IdentityClient};
pub use error::{Error, Result};
pub use gate::{establish_session, require_session, terminate_session, GateConfig, RouteGate};
pub use models::api::{ApiResult, ErrorKind, TokenData};
pub use models::credentials::{
    CredentialPair, Mutation, PairState, SessionOutcome, SessionStatus,
};
pub use resolver::resolve;
pub use storage::{CredentialStore, MemoryCredentialStore};
