//! Configuration constants and URL helpers for the identity API.

use std::time::Duration;

use crate::error::Error;

/// Connect timeout for identity API requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout for identity API requests. A timed-out call is treated
/// the same as an unreachable API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Signup endpoint path.
pub const SIGNUP_PATH: &str = "/auth/signup";

/// Refresh endpoint path.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Profile endpoint path, used to verify an access token.
pub const PROFILE_PATH: &str = "/users/profile";

/// Cookie name for the short-lived access token.
pub const ACCESS_COOKIE: &str = "accessToken";

/// Cookie name for the longer-lived refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Access-token cookie lifetime in seconds. Matches the server-declared
/// access token TTL so the cookie never outlives the token.
pub const ACCESS_COOKIE_MAX_AGE_SECS: u64 = 3600;

/// Default prefix under which requests require a session.
pub const DEFAULT_PROTECTED_PREFIX: &str = "/dashboard";

/// Default sign-in redirect target for unauthenticated callers.
pub const DEFAULT_SIGN_IN_PATH: &str = "/login";

/// Default redirect target when the identity API cannot confirm the caller.
pub const DEFAULT_UNAVAILABLE_PATH: &str = "/service-unavailable";

/// Validate an identity API base URL.
///
/// Must be absolute http(s) with a host and carry no query or fragment.
pub fn validate_base_url(base: &str) -> Result<(), Error> {
    let url = reqwest::Url::parse(base)
        .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::Config(format!(
            "Base URL '{}' must use http or https",
            base
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::Config(format!("Base URL '{}' has no host", base)));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "Base URL '{}' must not carry a query or fragment",
            base
        )));
    }
    Ok(())
}

/// Join the base URL with an endpoint path.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url_ok() {
        assert!(validate_base_url("https://api.example.com").is_ok());
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("https://api.example.com/v1").is_ok());
    }

    #[test]
    fn test_validate_base_url_rejected() {
        assert!(validate_base_url("ftp://api.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("https://api.example.com/?x=1").is_err());
        assert!(validate_base_url("https://api.example.com/#frag").is_err());
    }

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        assert_eq!(
            endpoint_url("https://api.example.com", LOGIN_PATH),
            "https://api.example.com/auth/login"
        );
        assert_eq!(
            endpoint_url("https://api.example.com/", REFRESH_PATH),
            "https://api.example.com/auth/refresh"
        );
    }
}
