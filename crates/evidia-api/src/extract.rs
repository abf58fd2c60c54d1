//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use evidia_core::AppError;

use crate::error::HttpAppError;

/// Bearer capability token from the `Authorization` header.
///
/// Only extraction happens here; verification against the attachment is the
/// coordinator's job, so the token failure taxonomy stays in one place.
#[derive(Debug, Clone)]
pub struct CapabilityToken(pub String);

impl<S> FromRequestParts<S> for CapabilityToken
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing Authorization header".to_string(),
                ))
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "Authorization header must use the Bearer scheme".to_string(),
            ))
        })?;

        if token.is_empty() {
            return Err(HttpAppError(AppError::Unauthorized(
                "Empty bearer token".to_string(),
            )));
        }

        Ok(CapabilityToken(token.to_string()))
    }
}
