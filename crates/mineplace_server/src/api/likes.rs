use crate::api::ApiPath;
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mineplace_core::prelude::*;
use uuid::Uuid;

/// POST /addons/{id}/like
pub async fn like<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state.db.like_addon(caller.id, id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

/// DELETE /addons/{id}/like
pub async fn unlike<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.unlike_addon(caller.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /addons/{id}/likes/count
pub async fn count<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let likes_count = state.db.likes_count(id).await?;
    Ok(Json(serde_json::json!({ "likes_count": likes_count })))
}
