//! Normalized identity API result types.
//!
//! Every call the remote client makes comes back as an [`ApiResult`],
//! regardless of how the failure happened on the wire. Downstream code
//! never branches on transport-specific shapes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Error kinds reported by the identity API, plus the local kinds the
/// client synthesizes for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required request fields are missing or invalid (field-level details).
    MissingFields,
    /// Email/password pair rejected at login.
    InvalidCredentials,
    /// Token is malformed or does not belong to any session.
    InvalidToken,
    /// Token was valid but its lifetime has ended.
    ExpiredToken,
    /// The session behind the token was revoked.
    RevokedToken,
    /// Signup email is already registered.
    AccountExists,
    /// The account behind the token no longer exists.
    UserNotFound,
    /// Network failure or timeout reaching the identity API.
    ApiUnreachable,
    /// The identity API reported an internal failure.
    InternalError,
    /// Anything the API returned that this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl ErrorKind {
    /// Stable snake_case name, matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::RevokedToken => "revoked_token",
            Self::AccountExists => "account_exists",
            Self::UserNotFound => "user_not_found",
            Self::ApiUnreachable => "api_unreachable",
            Self::InternalError => "internal_error",
            Self::Unknown => "unknown",
        }
    }

    /// True for failures that may succeed on a later retry. Stored
    /// credentials must never be cleared on these.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ApiUnreachable | Self::InternalError | Self::Unknown
        )
    }

    /// True when the kind proves the presented credential is permanently
    /// unusable for its current purpose.
    #[must_use]
    pub fn rejects_credential(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::ExpiredToken | Self::RevokedToken | Self::UserNotFound
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tokens returned by login, signup, and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    /// New access token.
    pub access_token: String,
    /// New refresh token, present only when the server rotates them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Normalized result of one identity API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Token payload on success, when the endpoint returns one.
    pub data: Option<TokenData>,
    /// Failure kind when `ok` is false.
    pub error: Option<ErrorKind>,
    /// Per-field validation messages, when the API supplied them.
    pub details: Option<HashMap<String, String>>,
}

impl ApiResult {
    /// Successful call with token payload.
    pub fn ok_with(data: TokenData) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    /// Successful call without a token payload (verify).
    pub fn ok_empty() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
            details: None,
        }
    }

    /// Failed call of the given kind.
    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(kind),
            details: None,
        }
    }

    /// Failed call carrying field-level validation messages.
    pub fn validation(details: HashMap<String, String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorKind::MissingFields),
            details: Some(details),
        }
    }

    /// The failure kind, defaulting to [`ErrorKind::Unknown`] when the API
    /// reported a failure without a recognizable kind.
    #[must_use]
    pub fn error_kind(&self) -> ErrorKind {
        self.error.unwrap_or(ErrorKind::Unknown)
    }
}

/// Error body shape the identity API emits: `{"error": kind, "details": {..}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub error: Option<ErrorKind>,
    #[serde(default)]
    pub details: Option<HashMap<String, String>>,
}
