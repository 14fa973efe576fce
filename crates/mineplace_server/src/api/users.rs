use crate::api::{ApiJson, ApiPath, ApiQuery, CatalogParams};
use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mineplace_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Searches within one user's add-ons need at least this many characters.
const USER_ADDONS_SEARCH_MIN_LEN: usize = 2;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub message: String,
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// POST /registration
pub async fn register<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user = new_user.normalize()?;

    let password = new_user.password.clone();
    let password_hash = blocking(move || hash_password(&password)).await??;
    let user = state.db.create_user(&new_user, &password_hash).await?;

    let token = state.jwt_service.mint(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// POST /authorization
pub async fn login<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&request.email)?;
    let Some(user) = state.db.find_user_by_email(&email).await? else {
        warn!("Login attempt for unknown email {email}");
        return Err(AuthError::InvalidCredentials.into());
    };

    let hash = user.password_hash.clone();
    let password = request.password;
    if !blocking(move || verify_password(&password, &hash)).await? {
        warn!("Wrong password for {email}");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!("User logged in: {email}");
    let token = state.jwt_service.mint(user.id)?;
    Ok(Json(TokenResponse {
        token,
        message: "Successfully logged in".to_string(),
    }))
}

/// POST /logout
///
/// Tokens are stateless; the client drops its copy.
pub async fn logout(AuthenticatedUser(caller): AuthenticatedUser) -> impl IntoResponse {
    info!("User logged out: {}", caller.id);
    Json(serde_json::json!({ "message": "Successfully logged out" }))
}

/// GET /me
pub async fn me<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state.db.get_user(caller.id).await?;
    Ok(Json(user.into()))
}

/// GET /users/{id}/addons
pub async fn user_addons<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    ApiPath(user): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<CatalogParams>,
) -> Result<Json<Page<AddOnListing>>, ApiError> {
    if !state.db.user_exists(user).await? {
        return Err(MarketError::not_found("User not found").into());
    }
    let query = params
        .require_search_len(USER_ADDONS_SEARCH_MIN_LEN)?
        .into_query(SortField::Downloads)?
        .with_owner(Some(user));
    Ok(Json(state.db.list_addons(&query).await?))
}

/// GET /users/{id}/liked_addons
pub async fn liked_addons<S: BlobStorage, A: AuthProvider>(
    State(state): State<AppState<S, A>>,
    _caller: AuthenticatedUser,
    ApiPath(user): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<CatalogParams>,
) -> Result<Json<Page<AddOnListing>>, ApiError> {
    if !state.db.user_exists(user).await? {
        return Err(MarketError::not_found("User not found.").into());
    }
    let query = params
        .into_query(SortField::PublishDate)?
        .with_liked_by(Some(user));
    Ok(Json(state.db.list_addons(&query).await?))
}
