use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use mineplace_auth_mock::FixedIdentityAuth;
use mineplace_core::prelude::*;
use mineplace_db::Database;
use mineplace_fs::FileSystemStorage;
use mineplace_server::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "mineplace-test-boundary";

struct TestApp {
    app: Router,
    _files: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let files = tempfile::tempdir().unwrap();
        let db = Database::in_memory().await.unwrap();
        let storage = FileSystemStorage::new(files.path());
        let app = MineplaceServer::default().build(db, storage);
        Self { app, _files: files }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let (status, bytes) = self.send(request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/v1/registration",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "diamond42",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_addon(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/v1/addons",
                Some(token),
                Some(json!({
                    "name": name,
                    "type": "mod",
                    "short_description": "A fast renderer",
                    "description": "Modern rendering engine rewrite",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["uuid"].as_str().unwrap().to_string()
    }

    async fn upload(&self, token: &str, addon: &str, version: &str, data: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for (name, value) in [("version", version), ("description", "Release notes here")] {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"sodium.jar\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/addons/{addon}/versions"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn health() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new().await;
    app.register("steve").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/registration",
            None,
            Some(json!({ "username": "other", "email": "STEVE@example.com", "password": "diamond42" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Email already registered");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/authorization",
            None,
            Some(json!({ "email": "steve@example.com", "password": "wrong1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/authorization",
            None,
            Some(json!({ "email": " Steve@Example.com ", "password": "diamond42" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = app.json(Method::GET, "/api/v1/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "steve");
    assert!(me.get("password_hash").is_none());

    let (status, body) = app.json(Method::GET, "/api/v1/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/registration",
            None,
            Some(json!({ "username": "alex", "email": "alex@example.com", "password": "password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Password must contain at least one letter and one number");
}

#[tokio::test]
async fn upload_download_and_deduplicate() {
    let app = TestApp::new().await;
    let steve = app.register("steve").await;
    let alex = app.register("alex").await;
    let addon = app.create_addon(&steve, "Sodium").await;

    let (status, version) = app.upload(&steve, &addon, "1.0", b"jar bytes").await;
    assert_eq!(status, StatusCode::CREATED, "{version}");
    assert!(version.get("file_name").is_none());
    let url = version["download_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/files/") && url.ends_with(".jar"));

    let (status, bytes) = app
        .send(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"jar bytes");

    let (status, body) = app.upload(&steve, &addon, "2.0", b"jar bytes").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "A file with this hash has already been uploaded.");

    let (status, body) = app.upload(&steve, &addon, "1.0", b"other bytes").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Version '1.0' already exists for this addon.");

    let (status, _) = app.upload(&alex, &addon, "3.0", b"other bytes").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.upload(&steve, &addon, "3.0", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "The uploaded file is empty.");

    let (status, latest) = app
        .json(Method::GET, &format!("/api/v1/addons/{addon}/versions/latest"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["version"], "1.0");

    let (status, page) = app
        .json(Method::GET, &format!("/api/v1/addons/{addon}/versions"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_count"], 1);

    let (status, _) = app
        .json(Method::DELETE, &format!("/api/v1/addons/{addon}"), Some(&steve), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_search_and_likes() {
    let app = TestApp::new().await;
    let steve = app.register("steve").await;
    let sodium = app.create_addon(&steve, "Sodium").await;
    app.create_addon(&steve, "Lithium").await;

    let (status, body) = app
        .json(Method::GET, "/api/v1/addons?sort_by=relevance", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Sorting by relevance is only allowed with a search query.");

    let (status, body) = app
        .json(Method::GET, "/api/v1/addons?sort_by=rating", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("'rating'"));

    let (status, page) = app
        .json(
            Method::GET,
            "/api/v1/addons?search=sodium&sort_by=relevance",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["items"][0]["name"], "Sodium");
    assert_eq!(page["items"][0]["relevance_score"], 3);
    assert_eq!(page["items"][0]["username"], "steve");

    let like_uri = format!("/api/v1/addons/{sodium}/like");
    let (status, _) = app.json(Method::POST, &like_uri, Some(&steve), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.json(Method::POST, &like_uri, Some(&steve), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, count) = app
        .json(Method::GET, &format!("/api/v1/addons/{sodium}/likes/count"), None, None)
        .await;
    assert_eq!(count["likes_count"], 1);

    let (status, _) = app.json(Method::DELETE, &like_uri, Some(&steve), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.json(Method::DELETE, &like_uri, Some(&steve), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "You didn't give this addon a like.");

    let (status, body) = app
        .json(Method::GET, "/api/v1/addons/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn single_character_search_only_limited_for_user_listings() {
    let app = TestApp::new().await;
    let steve = app.register("steve").await;
    app.create_addon(&steve, "Sodium").await;

    let (status, page) = app.json(Method::GET, "/api/v1/addons?search=a", None, None).await;
    assert_eq!(status, StatusCode::OK, "{page}");
    assert_eq!(page["total_count"], 1);

    let (_, me) = app.json(Method::GET, "/api/v1/me", Some(&steve), None).await;
    let uri = format!("/api/v1/users/{}/addons?search=a", me["uuid"].as_str().unwrap());
    let (status, body) = app.json(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "search must be at least 2 characters long");
}

#[tokio::test]
async fn upload_without_multipart_body_is_bad_request() {
    let app = TestApp::new().await;
    let steve = app.register("steve").await;
    let addon = app.create_addon(&steve, "Sodium").await;

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/addons/{addon}/versions"),
            Some(&steve),
            Some(json!({ "version": "1.0" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn custom_auth_provider_identifies_callers() {
    let files = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    let user = db
        .create_user(
            &NewUser {
                username: "steve".into(),
                email: "steve@example.com".into(),
                password: "diamond42".into(),
            },
            "hash",
        )
        .await
        .unwrap();

    let app = MineplaceServer::default().build_with_auth(
        db,
        FileSystemStorage::new(files.path()),
        FixedIdentityAuth::new(user.id),
    );

    let request = Request::builder()
        .uri("/api/v1/me")
        .header(header::AUTHORIZATION, "Bearer anything")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let me: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(me["uuid"], user.id.to_string());
}
