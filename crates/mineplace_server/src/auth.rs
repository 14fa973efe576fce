use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use mineplace_core::prelude::*;
use tracing::warn;

/// A wrapper struct indicating a request has been authenticated.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedUser(pub Caller);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S, A> FromRequestParts<AppState<S, A>> for AuthenticatedUser
where
    S: BlobStorage,
    A: AuthProvider,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, A>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::InvalidToken)?;

        match state.auth.verify(token).await {
            Ok(caller) => Ok(AuthenticatedUser(caller)),
            Err(e) => {
                warn!("Rejected token on {}: {e}", parts.uri.path());
                Err(e.into())
            }
        }
    }
}
