//! Cookie header persistence for the credential pair.
//!
//! Attributes are fixed configuration: `HttpOnly; Secure; SameSite=Strict;
//! Path=/`, with the access entry capped at the server-declared token TTL.
//! The refresh entry carries no Max-Age; its lifetime is owned by the
//! identity API policy.

use axum::http::{HeaderMap, HeaderValue};

use crate::config::{ACCESS_COOKIE, ACCESS_COOKIE_MAX_AGE_SECS, REFRESH_COOKIE};
use crate::error::{Error, Result};
use crate::models::credentials::{CredentialPair, Mutation};

/// Extract a cookie value from request headers.
fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// Read the credential pair carried by an incoming request.
pub fn pair_from_headers(headers: &HeaderMap) -> CredentialPair {
    CredentialPair {
        access_token: parse_cookie(headers, ACCESS_COOKIE).filter(|v| !v.is_empty()),
        refresh_token: parse_cookie(headers, REFRESH_COOKIE).filter(|v| !v.is_empty()),
    }
}

fn set_cookie(name: &'static str, value: &str, max_age: Option<u64>) -> Result<HeaderValue> {
    // Reject values a cookie header cannot carry instead of truncating them.
    if value.contains(';') || value.contains(',') || value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidCookieValue { name });
    }
    let attrs = match max_age {
        Some(secs) => format!(
            "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
            name, value, secs
        ),
        None => format!(
            "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/",
            name, value
        ),
    };
    HeaderValue::from_str(&attrs).map_err(|_| Error::InvalidCookieValue { name })
}

fn expire_cookie(name: &'static str) -> HeaderValue {
    // Static format, always a valid header value.
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; Secure; SameSite=Strict; Path=/",
        name
    ))
    .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build the `Set-Cookie` headers that persist a mutation sequence.
///
/// `ClearAll` expires both entries in one step so no failure path can
/// leave a lone token behind.
pub fn mutation_headers(mutations: &[Mutation]) -> Result<Vec<HeaderValue>> {
    let mut headers = Vec::with_capacity(mutations.len() + 1);
    for mutation in mutations {
        match mutation {
            Mutation::SetAccess(token) => {
                headers.push(set_cookie(
                    ACCESS_COOKIE,
                    token,
                    Some(ACCESS_COOKIE_MAX_AGE_SECS),
                )?);
            }
            Mutation::SetRefresh(token) => {
                headers.push(set_cookie(REFRESH_COOKIE, token, None)?);
            }
            Mutation::ClearAll => {
                headers.push(expire_cookie(ACCESS_COOKIE));
                headers.push(expire_cookie(REFRESH_COOKIE));
            }
        }
    }
    Ok(headers)
}
