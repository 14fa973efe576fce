use crate::api::{ApiJson, ApiPath, ApiQuery, CatalogParams};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mineplace_core::prelude::*;
use uuid::Uuid;

/// GET /addons
pub async fn list_addons<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiQuery(params): ApiQuery<CatalogParams>,
) -> Result<Json<Page<AddOnListing>>, ApiError> {
    let query = params.into_query(SortField::Downloads)?;
    Ok(Json(state.db.list_addons(&query).await?))
}

/// GET /addons/{id}
pub async fn get_addon<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AddOnListing>, ApiError> {
    Ok(Json(state.db.get_addon_listing(id).await?))
}

/// POST /addons
pub async fn create_addon<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiJson(new): ApiJson<NewAddOn>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.db.create_addon(caller.id, &new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /addons/{id}
pub async fn update_addon<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<AddOnUpdate>,
) -> Result<Json<AddOnListing>, ApiError> {
    Ok(Json(state.db.update_addon(id, caller.id, &update).await?))
}

/// DELETE /addons/{id}
pub async fn delete_addon<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_addon(&state.storage, id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /addons/{id}/download
pub async fn register_download<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let downloads = state.db.increment_downloads(id).await?;
    Ok(Json(serde_json::json!({ "downloads": downloads })))
}
