//! Remote identity API client.
//!
//! Stateless call set against the identity API: verify, refresh, login,
//! signup. Every call returns a normalized [`ApiResult`] and never lets a
//! transport error escape its boundary; network failures and timeouts
//! become `ErrorKind::ApiUnreachable`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::config;
use crate::error::Result;
use crate::models::api::{ApiResult, ErrorKind, TokenData, WireError};

/// The identity API call surface the resolver and gate depend on.
///
/// Implemented by [`IdentityClient`] for real traffic; tests substitute
/// counting mocks.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Check whether an access token is currently valid.
    async fn verify(&self, access_token: &str) -> ApiResult;

    /// Exchange a refresh token for a new access token (and, when the
    /// server rotates them, a new refresh token).
    async fn refresh(&self, refresh_token: &str) -> ApiResult;

    /// Authenticate with email and password, returning a new token pair.
    async fn login(&self, email: &str, password: &str) -> ApiResult;

    /// Register a new account, returning a new token pair.
    async fn signup(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> ApiResult;
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: IdentityApi + ?Sized> IdentityApi for std::sync::Arc<T> {
    async fn verify(&self, access_token: &str) -> ApiResult {
        (**self).verify(access_token).await
    }
    async fn refresh(&self, refresh_token: &str) -> ApiResult {
        (**self).refresh(refresh_token).await
    }
    async fn login(&self, email: &str, password: &str) -> ApiResult {
        (**self).login(email, password).await
    }
    async fn signup(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> ApiResult {
        (**self)
            .signup(email, first_name, last_name, password, confirm_password)
            .await
    }
}

/// reqwest-backed identity API client.
///
/// Clone is cheap: `reqwest::Client` shares its connection pool internally.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a client against the given base URL.
    ///
    /// Redirect following is disabled so a response can never re-target
    /// the call to another host.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        config::validate_base_url(&base_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(config::CONNECT_TIMEOUT)
            .timeout(config::REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| crate::error::Error::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create with a custom reqwest client (testing, custom TLS config).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        config::validate_base_url(&base_url)?;
        Ok(Self { client, base_url })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        config::endpoint_url(&self.base_url, path)
    }

    /// POST a JSON body to an endpoint that returns a token pair on success.
    async fn token_call(&self, path: &str, body: serde_json::Value) -> ApiResult {
        let url = self.url(path);
        debug!(endpoint = path, "Identity API request");

        match self.client.post(&url).json(&body).send().await {
            Ok(response) => Self::normalize_token_response(response).await,
            Err(e) => Self::unreachable(path, e),
        }
    }

    fn unreachable(path: &str, e: reqwest::Error) -> ApiResult {
        if e.is_timeout() {
            warn!(endpoint = path, "Identity API request timed out");
        } else {
            warn!(endpoint = path, error = %e, "Identity API unreachable");
        }
        ApiResult::failure(ErrorKind::ApiUnreachable)
    }

    async fn normalize_token_response(response: reqwest::Response) -> ApiResult {
        if response.status().is_success() {
            return match response.json::<TokenData>().await {
                Ok(data) if !data.access_token.is_empty() => ApiResult::ok_with(data),
                Ok(_) => {
                    warn!("Identity API success response carried no access token");
                    ApiResult::failure(ErrorKind::Unknown)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse identity API token response");
                    ApiResult::failure(ErrorKind::Unknown)
                }
            };
        }
        Self::normalize_error_response(response).await
    }

    async fn normalize_error_response(response: reqwest::Response) -> ApiResult {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let wire: WireError = serde_json::from_str(&body).unwrap_or(WireError {
            error: None,
            details: None,
        });
        let kind = wire.error.unwrap_or(if status.is_server_error() {
            ErrorKind::InternalError
        } else {
            ErrorKind::Unknown
        });
        debug!(status = status.as_u16(), kind = kind.as_str(), "Identity API error response");
        ApiResult {
            ok: false,
            data: None,
            error: Some(kind),
            details: wire.details,
        }
    }
}

#[async_trait]
impl IdentityApi for IdentityClient {
    async fn verify(&self, access_token: &str) -> ApiResult {
        if access_token.is_empty() {
            return ApiResult::failure(ErrorKind::InvalidToken);
        }
        let url = self.url(config::PROFILE_PATH);
        debug!(endpoint = config::PROFILE_PATH, "Verifying access token");

        match self.client.get(&url).bearer_auth(access_token).send().await {
            Ok(response) if response.status().is_success() => ApiResult::ok_empty(),
            Ok(response) => Self::normalize_error_response(response).await,
            Err(e) => Self::unreachable(config::PROFILE_PATH, e),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> ApiResult {
        if refresh_token.is_empty() {
            return ApiResult::failure(ErrorKind::InvalidToken);
        }
        self.token_call(
            config::REFRESH_PATH,
            json!({ "refreshToken": refresh_token }),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult {
        if let Some(details) = validate_login(email, password) {
            return ApiResult::validation(details);
        }
        self.token_call(
            config::LOGIN_PATH,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn signup(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> ApiResult {
        if let Some(details) =
            validate_signup(email, first_name, last_name, password, confirm_password)
        {
            return ApiResult::validation(details);
        }
        self.token_call(
            config::SIGNUP_PATH,
            json!({
                "email": email,
                "firstName": first_name,
                "lastName": last_name,
                "password": password,
                "confirmPassword": confirm_password,
            }),
        )
        .await
    }
}

/// Local login field validation. Returns field errors, or `None` when the
/// request may go to the wire.
fn validate_login(email: &str, password: &str) -> Option<HashMap<String, String>> {
    let mut errors = HashMap::new();
    if email.trim().is_empty() {
        errors.insert("email".into(), "Email is required".into());
    }
    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    }
    (!errors.is_empty()).then_some(errors)
}

/// Local signup field validation. A failure here means no network call is
/// made at all.
fn validate_signup(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    confirm_password: &str,
) -> Option<HashMap<String, String>> {
    let mut errors = HashMap::new();

    let email = email.trim();
    if email.is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if email.len() > 250 {
        errors.insert("email".into(), "Email is too long".into());
    }

    let first_name = first_name.trim();
    if first_name.is_empty() {
        errors.insert("firstName".into(), "First name is required".into());
    } else if first_name.len() > 100 {
        errors.insert("firstName".into(), "First name is too long".into());
    }

    let last_name = last_name.trim();
    if last_name.is_empty() {
        errors.insert("lastName".into(), "Last name is required".into());
    } else if last_name.len() > 100 {
        errors.insert("lastName".into(), "Last name is too long".into());
    }

    if password.is_empty() {
        errors.insert("password".into(), "Password is required".into());
    } else if password.len() < 8 {
        errors.insert(
            "password".into(),
            "Password must be at least 8 characters long".into(),
        );
    } else if password.len() > 32 {
        errors.insert("password".into(), "Password is too long".into());
    }

    if confirm_password.is_empty() {
        errors.insert(
            "confirmPassword".into(),
            "Confirm password is required".into(),
        );
    } else if confirm_password != password {
        errors.insert("password".into(), "Passwords do not match".into());
        errors.insert("confirmPassword".into(), "Passwords do not match".into());
    }

    (!errors.is_empty()).then_some(errors)
}
