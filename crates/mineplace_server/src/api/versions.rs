use crate::api::{ApiPath, ApiQuery, VersionListParams, pagination, parse_order};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use bytes::Bytes;
use mineplace_core::prelude::*;
use uuid::Uuid;

/// GET /addons/{id}/versions
pub async fn list_versions<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(addon): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<VersionListParams>,
) -> Result<Json<Page<Version>>, ApiError> {
    let pagination = pagination(params.page, params.per_page)?;
    let order = parse_order(params.sort_order.as_deref())?;
    Ok(Json(state.db.list_versions(addon, pagination, order).await?))
}

/// GET /addons/{id}/versions/latest
pub async fn latest_version<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(addon): ApiPath<Uuid>,
) -> Result<Json<Version>, ApiError> {
    Ok(Json(state.db.latest_version(addon).await?))
}

/// GET /addons/{id}/versions/{version_id}
pub async fn get_version<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath((addon, version)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Version>, ApiError> {
    if !state.db.addon_exists(addon).await? {
        return Err(MarketError::not_found("Addon not found.").into());
    }
    Ok(Json(state.db.get_version(addon, version).await?))
}

/// POST /addons/{id}/versions
///
/// Multipart form with `version`, `description` and `file` parts.
pub async fn upload_version<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(addon): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart?).await?;
    let version = state
        .db
        .publish_version(&state.storage, addon, caller.id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// DELETE /addons/{id}/versions/{version_id}
pub async fn delete_version<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath((addon, version)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .delete_version(&state.storage, addon, version, caller.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_upload(mut multipart: Multipart) -> Result<VersionUpload, ApiError> {
    let mut version = None;
    let mut description = None;
    let mut file: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("version") => version = Some(field.text().await?.trim().to_string()),
            Some("description") => description = Some(field.text().await?),
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                file = Some((name, field.bytes().await?));
            }
            _ => {}
        }
    }

    let missing = |part: &str| MarketError::invalid(format!("Field '{part}' is required"));
    let version = version.ok_or_else(|| missing("version"))?;
    let description = description.ok_or_else(|| missing("description"))?;
    let (file_name, data) = file.ok_or_else(|| missing("file"))?;

    Ok(VersionUpload {
        version,
        description,
        file_name,
        data,
    })
}
