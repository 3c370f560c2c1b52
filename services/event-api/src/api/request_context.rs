//! Request-scoped context extracted from HTTP requests.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use evently_id::RequestId;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request correlation id and (unresolved) bearer credential.
///
/// Extraction never fails: a missing or malformed `Authorization` header
/// just leaves the context anonymous, and the auth gate decides what the
/// credential is worth.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub bearer_token: Option<String>,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = header_string(headers, AUTHORIZATION_HEADER)?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| RequestId::new().to_string());

        Ok(Self {
            request_id,
            bearer_token: bearer_token(&parts.headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(AUTHORIZATION_HEADER, HeaderValue::from_str(auth).unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers(Some("Bearer evy_at_abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("evy_at_abc"));
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        assert!(bearer_token(&headers(None)).is_none());
    }

    #[test]
    fn test_non_bearer_scheme_is_anonymous() {
        let headers = headers(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_empty_bearer_is_anonymous() {
        let headers = headers(Some("Bearer    "));
        assert!(bearer_token(&headers).is_none());
    }
}
