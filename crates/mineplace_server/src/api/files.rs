use crate::api::ApiPath;
use crate::error::ApiError;
use crate::state::AppState;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use mineplace_core::prelude::*;

/// GET /files/{file_name}
pub async fn download_file<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(file_name): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.storage.read_blob(&file_name).await?;
    let disposition = format!("attachment; filename=\"{file_name}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}
