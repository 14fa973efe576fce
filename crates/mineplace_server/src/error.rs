use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mineplace_core::prelude::*;
use tracing::error;

/// Any handler failure. Converted into a status code and a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        if let Some(err) = self.0.downcast_ref::<MarketError>() {
            let status = match err {
                MarketError::NotFound(_) => StatusCode::NOT_FOUND,
                MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
                MarketError::Conflict(_) => StatusCode::CONFLICT,
                MarketError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                MarketError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
                MarketError::Storage(_) | MarketError::Database(_) => {
                    return internal(&self.0);
                }
            };
            return (status, err.to_string());
        }

        if let Some(err) = self.0.downcast_ref::<AuthError>() {
            return match err {
                AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password".to_string(),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    "Could not validate credentials".to_string(),
                ),
            };
        }

        if let Some(err) = self.0.downcast_ref::<StorageError>() {
            return match err {
                StorageError::NotFound(_) | StorageError::InvalidName(_) => {
                    (StatusCode::NOT_FOUND, "File not found".to_string())
                }
                _ => internal(&self.0),
            };
        }

        if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            return (StatusCode::BAD_REQUEST, rejection.body_text());
        }
        if let Some(rejection) = self.0.downcast_ref::<QueryRejection>() {
            return (StatusCode::BAD_REQUEST, rejection.body_text());
        }
        if let Some(rejection) = self.0.downcast_ref::<PathRejection>() {
            return (StatusCode::BAD_REQUEST, rejection.body_text());
        }
        if let Some(rejection) = self.0.downcast_ref::<MultipartRejection>() {
            return (StatusCode::BAD_REQUEST, rejection.body_text());
        }
        if let Some(err) = self.0.downcast_ref::<MultipartError>() {
            return (err.status(), err.body_text());
        }

        internal(&self.0)
    }
}

fn internal(err: &anyhow::Error) -> (StatusCode, String) {
    error!("Internal error: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<anyhow::Error>) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn market_errors_map_to_statuses() {
        assert_eq!(status(MarketError::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status(MarketError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status(MarketError::conflict("x")), StatusCode::CONFLICT);
        assert_eq!(status(MarketError::invalid("x")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(MarketError::Database("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        assert_eq!(status(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(StorageError::NotFound("a".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
