use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Requires a valid bearer token; rejects the request otherwise.
pub struct AuthUser(pub Uuid);

/// Resolves a bearer token when one is present; anything missing or invalid
/// yields an anonymous caller instead of a rejection.
pub struct MaybeAuthUser(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = bearer_token(parts)
            .ok_or(AppError::Authentication("Missing Authorization header."))?;
        let user_id = keys
            .resolve(token)
            .ok_or(AppError::Authentication("Invalid or expired token."))?;
        Ok(AuthUser(user_id))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let user_id = bearer_token(parts).and_then(|token| keys.resolve(token));
        Ok(MaybeAuthUser(user_id))
    }
}
