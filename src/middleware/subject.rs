use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header set by the upstream auth layer once the caller is authenticated
pub const SUBJECT_HEADER: &str = "x-user-id";

/// The already-authenticated subject a request is made on behalf of.
///
/// Identity is not verified here; a missing or malformed header is an
/// input fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SubjectId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SUBJECT_HEADER)
            .ok_or_else(|| AppError::InvalidInput(format!("Missing {} header", SUBJECT_HEADER)))?;

        raw.to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(SubjectId)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid {} header", SUBJECT_HEADER)))
    }
}
