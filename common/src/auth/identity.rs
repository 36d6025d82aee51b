//! Request identity extraction.
//!
//! Turns the `Authorization: Bearer <token>` header of a request into the
//! authenticated subject, or a typed failure.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::token::{TokenCodec, TokenError};
use crate::errors::AppError;

/// Identifier of an authenticated principal (a user id).
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct SubjectId(i64);

impl SubjectId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubjectId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<SubjectId> for i64 {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl FromStr for SubjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Authentication failure.
///
/// Clients only ever learn which of the two variants occurred; the
/// `TokenError` inside `InvalidCredential` is kept for logging.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid credential")]
    InvalidCredential(#[source] TokenError),
}

impl AuthError {
    /// Short classification for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::InvalidCredential(TokenError::Malformed) => "malformed",
            AuthError::InvalidCredential(TokenError::SignatureInvalid) => "bad_signature",
            AuthError::InvalidCredential(TokenError::Expired) => "expired",
        }
    }
}

/// Extract bearer token from Authorization header.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the subject of a request from its headers at instant `now`.
pub fn extract_subject(
    headers: &HeaderMap,
    codec: &TokenCodec,
    now: DateTime<Utc>,
) -> Result<SubjectId, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    codec.verify(token, now).map_err(AuthError::InvalidCredential)
}

/// The authenticated subject of the current request.
///
/// The authentication gate stores this in the request extensions. As an
/// extractor it reads that value, or re-derives it from the header when the
/// route is not behind the gate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub SubjectId);

impl AuthenticatedSubject {
    pub fn id(&self) -> SubjectId {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthenticatedSubject
where
    S: Send + Sync,
    Arc<TokenCodec>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(subject) = parts.extensions.get::<AuthenticatedSubject>() {
            return Ok(*subject);
        }

        let codec = Arc::<TokenCodec>::from_ref(state);
        let subject = extract_subject(&parts.headers, &codec, Utc::now()).map_err(|e| {
            tracing::warn!(reason = e.reason(), "request authentication failed");
            AppError::Unauthenticated(e)
        })?;
        Ok(Self(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(b"identity-tests", Duration::from_secs(60))
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_missing_header_is_missing_credential() {
        let err = extract_subject(&HeaderMap::new(), &codec(), Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[test]
    fn test_non_bearer_scheme_is_missing_credential() {
        let err = extract_subject(&headers("Basic Zm9vOmJhcg=="), &codec(), Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let codec = codec();
        let now = Utc::now();
        let issued = codec.issue(SubjectId::new(42), now).unwrap();
        let subject = extract_subject(&headers(&format!("Bearer {}", issued.token)), &codec, now);
        assert_eq!(subject, Ok(SubjectId::new(42)));
    }

    #[test]
    fn test_token_failures_collapse_to_invalid_credential() {
        let codec = codec();
        let now = Utc::now();
        let issued = codec.issue(SubjectId::new(1), now).unwrap();
        let late = now + chrono::Duration::seconds(120);

        let expired = extract_subject(&headers(&format!("Bearer {}", issued.token)), &codec, late);
        let forged = extract_subject(&headers("Bearer x.y.z"), &codec, now);

        assert!(matches!(expired, Err(AuthError::InvalidCredential(_))));
        assert!(matches!(forged, Err(AuthError::InvalidCredential(_))));
        assert_eq!(expired.unwrap_err().to_string(), forged.unwrap_err().to_string());
    }

    #[test]
    fn test_reason_keeps_internal_distinction() {
        assert_eq!(AuthError::InvalidCredential(TokenError::Expired).reason(), "expired");
        assert_eq!(
            AuthError::InvalidCredential(TokenError::SignatureInvalid).reason(),
            "bad_signature"
        );
        assert_eq!(AuthError::MissingCredential.reason(), "missing");
    }

    #[test]
    fn test_subject_id_round_trips_through_text() {
        let id: SubjectId = "17".parse().unwrap();
        assert_eq!(id, SubjectId::new(17));
        assert_eq!(id.to_string(), "17");
        assert!("x".parse::<SubjectId>().is_err());
    }
}
