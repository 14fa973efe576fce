use crate::{api, prelude::*};
use axum::http::HeaderValue;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use mineplace_core::prelude::*;
use mineplace_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// The builder for the Mineplace Server.
#[derive(Clone, Debug, Default)]
pub struct MineplaceServer {
    config: MineplaceServerConfig,
}

impl MineplaceServer {
    pub fn new(config: MineplaceServerConfig) -> Self {
        Self { config }
    }
}

#[derive(Clone, Debug)]
pub struct MineplaceServerConfig {
    /// The secret used to sign access tokens.
    ///
    /// Defaults to `TOP_SECRET`.
    ///
    /// **NOTE:** This should be set to a secure value!
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    ///
    /// Defaults to `36000`.
    pub access_token_expires: u64,
    /// Allowed CORS origins. `*` allows any origin; empty disables cross-origin requests.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body. Leaves room for multipart framing around a maximal file.
    pub body_limit: usize,
}

const DEFAULT_SECRET: &str = "TOP_SECRET";

impl Default for MineplaceServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_SECRET.to_string(),
            access_token_expires: 36_000,
            cors_origins: Vec::new(),
            body_limit: MAX_FILE_SIZE_BYTES * 2,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

impl MineplaceServer {
    /// Builds the router with the server's own access tokens as the only credentials.
    pub fn build<S: BlobStorage>(self, db: Database, storage: S) -> Router {
        let auth = self.jwt_service();
        self.build_with_auth(db, storage, auth)
    }

    /// Builds the router, verifying bearer tokens with `auth`.
    ///
    /// Tokens returned by registration and login are always minted by the server's
    /// [`JwtService`], whichever provider verifies them.
    pub fn build_with_auth<S: BlobStorage, A: AuthProvider>(
        self,
        db: Database,
        storage: S,
        auth: A,
    ) -> Router {
        let jwt_service = self.jwt_service();
        let config = self.config;
        if config.jwt_secret == DEFAULT_SECRET {
            warn!("Default JWT secret used. Consider setting `jwt_secret` to a secure value!")
        }

        let cors = cors_layer(&config.cors_origins);
        let body_limit = config.body_limit;
        let state = AppState {
            db,
            storage,
            auth,
            jwt_service,
        };

        let api = Router::new()
            .route("/registration", post(api::users::register))
            .route("/authorization", post(api::users::login))
            .route("/logout", post(api::users::logout))
            .route("/me", get(api::users::me))
            .route(
                "/addons",
                get(api::addons::list_addons).post(api::addons::create_addon),
            )
            .route(
                "/addons/{id}",
                get(api::addons::get_addon)
                    .put(api::addons::update_addon)
                    .delete(api::addons::delete_addon),
            )
            .route("/addons/{id}/download", post(api::addons::register_download))
            .route(
                "/addons/{id}/like",
                post(api::likes::like).delete(api::likes::unlike),
            )
            .route("/addons/{id}/likes/count", get(api::likes::count))
            .route(
                "/addons/{id}/versions",
                get(api::versions::list_versions).post(api::versions::upload_version),
            )
            .route(
                "/addons/{id}/versions/latest",
                get(api::versions::latest_version),
            )
            .route(
                "/addons/{id}/versions/{version_id}",
                get(api::versions::get_version).delete(api::versions::delete_version),
            )
            .route("/users/{id}/addons", get(api::users::user_addons))
            .route("/users/{id}/liked_addons", get(api::users::liked_addons));

        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/files/{file_name}", get(api::files::download_file))
            .nest("/api/v1", api)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    fn jwt_service(&self) -> JwtService {
        JwtService::new(&self.config.jwt_secret, self.config.access_token_expires)
    }
}
