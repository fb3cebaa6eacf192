//! Error types for session-gate.

use thiserror::Error;

/// Errors surfaced by configuration and credential storage.
///
/// Identity API failures never appear here: the remote client normalizes
/// every transport or server failure into an [`crate::models::api::ApiResult`]
/// at its boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (bad base URL, unusable paths).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage failure.
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// A token contains bytes that cannot be carried in a cookie header.
    #[error("Invalid cookie value for '{name}'")]
    InvalidCookieValue { name: &'static str },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
