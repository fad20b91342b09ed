use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;
use tower::ServiceExt;

use cairn_blob_memory::MemoryBlobStore;
use cairn_core::{CountingIdDeriver, HashingIdDeriver, IdDeriver};
use cairn_metadata_memory::MemoryMetadataStore;
use cairn_server::api::AppState;
use cairn_server::auth::{BasicCredentialChecker, CredentialChecker};
use cairn_server::config::UploadsConfig;
use cairn_uploads::UploadServiceBuilder;

const BOUNDARY: &str = "cairn-test-boundary";
const HELLO_ID: &str = "4IIogZ2k7g59PUVk_qadq1TmLTKQicxH";

// -- Helpers --------------------------------------------------------------

struct TestApp {
    deriver: Arc<dyn IdDeriver>,
    auth: bool,
    config: UploadsConfig,
}

impl TestApp {
    fn new() -> Self {
        Self {
            deriver: Arc::new(HashingIdDeriver::new(32)),
            auth: true,
            config: UploadsConfig::default(),
        }
    }

    fn without_auth(mut self) -> Self {
        self.auth = false;
        self
    }

    fn deriver(mut self, deriver: Arc<dyn IdDeriver>) -> Self {
        self.deriver = deriver;
        self
    }

    fn config(mut self, config: UploadsConfig) -> Self {
        self.config = config;
        self
    }

    fn build(self) -> axum::Router {
        let uploads = UploadServiceBuilder::new()
            .deriver(self.deriver)
            .metadata(Arc::new(MemoryMetadataStore::new()))
            .blobs(Arc::new(MemoryBlobStore::new()))
            .build()
            .expect("service should build");

        let auth = self.auth.then(|| {
            Arc::new(BasicCredentialChecker::with_password(
                "admin",
                SecretString::new("s3cret".to_owned()),
            )) as Arc<dyn CredentialChecker>
        });

        cairn_server::api::router(AppState {
            uploads: Arc::new(uploads),
            auth,
            config: Arc::new(self.config),
        })
    }
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn admin() -> String {
    basic("admin", "s3cret")
}

fn multipart_body(field: &str, content_type: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"file.bin\"\r\n")
            .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(content: &[u8], content_type: Option<&str>, auth: Option<String>) -> Request<Body> {
    upload_request_with_field("upload", content, content_type, auth)
}

fn upload_request_with_field(
    field: &str,
    content: &[u8],
    content_type: Option<&str>,
    auth: Option<String>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder
        .body(Body::from(multipart_body(field, content_type, content)))
        .unwrap()
}

fn get(uri: &str, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn upload(app: &axum::Router, content: &[u8]) -> String {
    let response = app
        .clone()
        .oneshot(upload_request(content, Some("image/png"), Some(admin())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json(response).await["upload_id"]
        .as_str()
        .unwrap()
        .to_owned()
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = TestApp::new().build();

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["metrics"]["created"], 0);
}

#[tokio::test]
async fn upload_creates_then_reports_duplicate() {
    let app = TestApp::new().build();

    let first = app
        .clone()
        .oneshot(upload_request(b"Hello, world!", Some("image/png"), Some(admin())))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(json(first).await["upload_id"], HELLO_ID);

    let second = app
        .clone()
        .oneshot(upload_request(b"Hello, world!", Some("image/png"), Some(admin())))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json(second).await["upload_id"], HELLO_ID);

    let health = json(app.oneshot(get("/health", None)).await.unwrap()).await;
    assert_eq!(health["metrics"]["created"], 1);
    assert_eq!(health["metrics"]["duplicates"], 1);
}

#[tokio::test]
async fn upload_with_non_image_type_is_400() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(upload_request(b"plain", Some("text/plain"), Some(admin())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Bad request - invalid file");
}

#[tokio::test]
async fn upload_without_part_content_type_is_400() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(upload_request(b"untyped", None, Some(admin())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_without_body_is_422() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/uploads")
                .header(header::AUTHORIZATION, admin())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(response).await["error"].is_string());
}

#[tokio::test]
async fn upload_without_upload_field_is_422() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(upload_request_with_field(
            "file",
            b"data",
            Some("image/png"),
            Some(admin()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_over_limit_is_413() {
    let app = TestApp::new()
        .config(UploadsConfig {
            max_upload_bytes: 64,
            ..UploadsConfig::default()
        })
        .build();

    let response = app
        .oneshot(upload_request(&[0u8; 1024], Some("image/png"), Some(admin())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_requires_credentials() {
    let app = TestApp::new().build();

    let missing = app
        .clone()
        .oneshot(upload_request(b"img", Some("image/png"), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"cairn\""
    );

    let wrong = app
        .oneshot(upload_request(
            b"img",
            Some("image/png"),
            Some(basic("admin", "guess")),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(wrong).await["error"], "invalid credentials");
}

#[tokio::test]
async fn disabled_auth_lets_requests_through() {
    let app = TestApp::new().without_auth().build();

    let response = app
        .oneshot(upload_request(b"open", Some("image/gif"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn get_returns_content_with_headers() {
    let app = TestApp::new().build();
    let id = upload(&app, b"Hello, world!").await;

    // Fetching is public.
    let response = app
        .oneshot(get(&format!("/uploads/{id}"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=3600"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Hello, world!");
}

#[tokio::test]
async fn cache_max_age_is_configurable() {
    let app = TestApp::new()
        .config(UploadsConfig {
            cache_max_age_seconds: 60,
            ..UploadsConfig::default()
        })
        .build();
    let id = upload(&app, b"cached").await;

    let response = app
        .oneshot(get(&format!("/uploads/{id}"), None))
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=60"
    );
}

#[tokio::test]
async fn get_unknown_is_404() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(get("/uploads/never-seen", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"], "not found");
}

#[tokio::test]
async fn get_malformed_id_is_400() {
    let app = TestApp::new().build();

    let too_long = "a".repeat(33);
    let response = app
        .clone()
        .oneshot(get(&format!("/uploads/{too_long}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/uploads/has.dot", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_returns_204_then_404() {
    let app = TestApp::new().build();
    let id = upload(&app, b"to delete").await;
    let uri = format!("/uploads/{id}");

    let unauthenticated = app.clone().oneshot(delete(&uri, None)).await.unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let deleted = app
        .clone()
        .oneshot(delete(&uri, Some(admin())))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let fetched = app.clone().oneshot(get(&uri, None)).await.unwrap();
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);

    let again = app.oneshot(delete(&uri, Some(admin()))).await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_newest_first_and_paginated() {
    let app = TestApp::new()
        .deriver(Arc::new(CountingIdDeriver::new()))
        .build();
    for n in 1..=5u8 {
        upload(&app, &[n]).await;
    }

    let all = json(
        app.clone()
            .oneshot(get("/uploads", Some(admin())))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(all["uploads"], serde_json::json!(["5", "4", "3", "2", "1"]));

    let response = app
        .oneshot(get("/uploads?offset=1&limit=2", Some(admin())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["uploads"], serde_json::json!(["4", "3"]));
}

#[tokio::test]
async fn list_requires_credentials_by_default() {
    let app = TestApp::new().build();

    let response = app.oneshot(get("/uploads", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_can_be_made_public() {
    let app = TestApp::new()
        .config(UploadsConfig {
            list_requires_auth: false,
            ..UploadsConfig::default()
        })
        .build();
    let id = upload(&app, b"listed").await;

    let response = app.oneshot(get("/uploads", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["uploads"], serde_json::json!([id]));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().build();

    let response = app
        .oneshot(get("/api-doc/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = json(response).await;
    assert!(doc["paths"]["/uploads"].is_object());
    assert!(doc["paths"]["/uploads/{upload_id}"].is_object());
}
