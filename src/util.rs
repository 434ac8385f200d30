//! Shared helpers for request handling.

use std::future::Future;
use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

use crate::error::{AppError, Result};

/// Cookie carrying the managed-backend access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

/// Deadline for calls wrapped in [`with_timeout`].
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Access token from the Authorization header, falling back to the session cookie.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Race `fut` against `limit`; expiry surfaces as `AppError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} did not complete within {}s",
            what,
            limit.as_secs()
        ))),
    }
}

/// Check that every named field is present and non-blank.
///
/// Fields are checked in order; the first failure names the field.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<()> {
    for (name, value) in fields {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => return Err(AppError::missing_field(name)),
        }
    }
    Ok(())
}
