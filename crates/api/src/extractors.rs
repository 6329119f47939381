//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use sweater_common::AppError;
use sweater_core::Account;

/// Authenticated account extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Account);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<Account>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
