//! Bearer token codec.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256 under a process-wide
//! secret. The algorithm is fixed on both sides: `issue` always writes an
//! HS256 header and `verify` only accepts HS256, so a token claiming any
//! other algorithm (including `none`) is rejected before its payload is read.
//!
//! Expiry is checked against the caller-supplied `now` rather than the system
//! clock so the codec stays a pure function of token, secret and time.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity::SubjectId;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Why a presented token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,
}

/// Claims carried inside every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity, as a decimal string.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> Result<SubjectId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// A freshly issued token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens.
///
/// Holds only read-only key material, so one instance is shared behind an
/// `Arc` by every request.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec signing with `secret`; tokens live for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is evaluated against the supplied `now` in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp", "sub"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<_>>();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject`.
    ///
    /// `iat` is `now` truncated to whole seconds and `exp = iat + ttl`.
    pub fn issue(&self, subject: SubjectId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| TokenError::Malformed)?;
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        let expires_at = claims.expires_at().ok_or(TokenError::Malformed)?;

        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "token signing failed");
                TokenError::Malformed
            })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies `token` at instant `now` and returns its subject.
    ///
    /// The signature is checked before anything else, so a forged token is
    /// reported as `SignatureInvalid` even if its claims are also expired.
    /// A token is rejected once `now` is strictly past its expiry.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SubjectId, TokenError> {
        let claims = self.decode(token)?;
        let subject = claims.subject()?;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }
        if now.timestamp_millis() > claims.exp.saturating_mul(1000) {
            return Err(TokenError::Expired);
        }
        Ok(subject)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const SECRET: &[u8] = b"test-signing-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(3600))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(7), t0()).unwrap();
        assert_eq!(codec.verify(&issued.token, t0()), Ok(SubjectId::new(7)));
        assert_eq!(issued.expires_at, t0() + ChronoDuration::hours(1));
    }

    #[test]
    fn test_token_is_header_safe() {
        let issued = codec().issue(SubjectId::new(1), t0()).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
        assert!(issued
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn test_verify_just_before_expiry_succeeds() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(3), t0()).unwrap();
        assert!(codec.verify(&issued.token, issued.expires_at).is_ok());
    }

    #[test]
    fn test_one_millisecond_past_expiry_is_expired() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(3), t0()).unwrap();
        let late = issued.expires_at + ChronoDuration::milliseconds(1);
        assert_eq!(codec.verify(&issued.token, late), Err(TokenError::Expired));
    }

    #[test]
    fn test_sub_second_issue_time_is_truncated() {
        let codec = codec();
        let now = t0() + ChronoDuration::milliseconds(750);
        let issued = codec.issue(SubjectId::new(3), now).unwrap();
        assert_eq!(codec.verify(&issued.token, now), Ok(SubjectId::new(3)));
        assert_eq!(issued.expires_at, t0() + ChronoDuration::hours(1));
    }

    #[test]
    fn test_flipping_any_signature_char_is_detected() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(9), t0()).unwrap();
        let sig_start = issued.token.rfind('.').unwrap() + 1;

        for i in sig_start..issued.token.len() {
            let mut bytes = issued.token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                codec.verify(&tampered, t0()),
                Err(TokenError::SignatureInvalid),
                "byte {i} flipped"
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(1), t0()).unwrap();
        let forged_claims = Claims {
            sub: "2".to_string(),
            iat: t0().timestamp(),
            exp: t0().timestamp() + 3600,
        };
        let forged_payload = jsonwebtoken::encode(
            &Header::new(ALGORITHM),
            &forged_claims,
            &EncodingKey::from_secret(b"other"),
        )
        .unwrap();
        let payload = forged_payload.split('.').nth(1).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        parts[1] = payload;
        let spliced = parts.join(".");
        assert_eq!(codec.verify(&spliced, t0()), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let other = TokenCodec::new(b"another-secret", Duration::from_secs(3600));
        let issued = other.issue(SubjectId::new(5), t0()).unwrap();
        assert_eq!(
            codec().verify(&issued.token, t0()),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_other_algorithm_is_rejected_even_with_same_key() {
        let claims = Claims {
            sub: "5".to_string(),
            iat: t0().timestamp(),
            exp: t0().timestamp() + 60,
        };
        let hs512 = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(codec().verify(&hs512, t0()), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        // {"alg":"none","typ":"JWT"} . {"sub":"5","iat":1714564800,"exp":1714568400} .
        let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                        eyJzdWIiOiI1IiwiaWF0IjoxNzE0NTY0ODAwLCJleHAiOjE3MTQ1Njg0MDB9.";
        assert!(codec().verify(unsigned, t0()).is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        assert_eq!(codec.verify("", t0()), Err(TokenError::Malformed));
        assert_eq!(codec.verify("not.a.token", t0()), Err(TokenError::Malformed));
        assert_eq!(codec.verify("abc", t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_verification_is_repeatable() {
        let codec = codec();
        let issued = codec.issue(SubjectId::new(1), t0()).unwrap();
        let late = issued.expires_at + ChronoDuration::seconds(5);
        assert_eq!(codec.verify(&issued.token, late), codec.verify(&issued.token, late));
    }
}
