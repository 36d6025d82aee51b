//! Authentication middleware.
//!
//! The gate in front of every mutating route: a request without a valid
//! bearer token is answered with 401 before the handler (or its body
//! extraction) runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::auth::{extract_subject, AuthenticatedSubject, TokenCodec};
use crate::errors::AppError;

/// Authentication middleware handler.
///
/// On success the subject is stored in the request extensions as
/// [`AuthenticatedSubject`] and recorded on the current request span. The
/// middleware keeps no state between requests.
///
/// # Arguments
/// * `codec` - Shared token codec
/// * `req` - The incoming HTTP request
/// * `next` - The next middleware or handler in the chain
pub async fn auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let subject = extract_subject(req.headers(), &codec, Utc::now()).map_err(|e| {
        tracing::warn!(reason = e.reason(), "authentication rejected");
        AppError::Unauthenticated(e)
    })?;

    tracing::Span::current().record("subject", subject.get());
    req.extensions_mut().insert(AuthenticatedSubject(subject));

    Ok(next.run(req).await)
}
