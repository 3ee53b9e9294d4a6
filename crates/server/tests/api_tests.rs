use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use snote_core::encode_key_hash;
use snote_server::api::{AppState, router};
use snote_service::NoteService;
use snote_store::{NewNote, NoteRepository, RepositoryError, StoredNote};
use snote_store_memory::MemoryNoteRepository;

// -- Helpers --------------------------------------------------------------

const MAX_BODY: usize = 64 * 1024;

fn build_test_state(repository: Arc<dyn NoteRepository>) -> AppState {
    let notes = NoteService::builder()
        .repository(repository)
        .build()
        .expect("service should build");
    AppState {
        notes: Arc::new(notes),
        max_body_bytes: MAX_BODY,
    }
}

fn memory_app() -> axum::Router {
    router(build_test_state(Arc::new(MemoryNoteRepository::new())))
}

fn key_hash() -> String {
    encode_key_hash(&[7; 32])
}

fn create_body(content: &[u8], expires_in: u64) -> Value {
    json!({
        "content": BASE64.encode(content),
        "expiresIn": expires_in,
        "keyHash": key_hash(),
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(http::Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn detail_fields(body: &Value) -> Vec<Option<String>> {
    body["details"]
        .as_array()
        .expect("details should be present")
        .iter()
        .map(|d| d["field"].as_str().map(str::to_owned))
        .collect()
}

// -- Failing repository ---------------------------------------------------

struct BrokenRepository;

#[async_trait]
impl NoteRepository for BrokenRepository {
    async fn create(&self, _note: &NewNote) -> Result<StoredNote, RepositoryError> {
        Err(RepositoryError::Connection("connection refused".into()))
    }

    async fn get(&self, _id: u64) -> Result<StoredNote, RepositoryError> {
        Err(RepositoryError::Connection("connection refused".into()))
    }
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = memory_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = memory_app();
    let (status, body) = send(&app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/notes"].is_object());
    assert!(body["paths"]["/v1/notes/{id}"].is_object());
}

// -- Create ---------------------------------------------------------------

#[tokio::test]
async fn create_returns_public_id() {
    let app = memory_app();
    let (status, body) = send(&app, post_json("/v1/notes", &create_body(b"secret", 3600))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "1111-1111-12");
    assert_eq!(body["expiresAtTimeZone"], "UTC");
    assert_eq!(body["keyHash"], key_hash());
    assert!(body.get("content").is_none(), "content is not echoed back");

    let created: DateTime<Utc> = body["createdAt"].as_str().unwrap().parse().unwrap();
    let expires: DateTime<Utc> = body["expiresAt"].as_str().unwrap().parse().unwrap();
    let lifetime = expires - created;
    assert!(lifetime >= TimeDelta::hours(1));
    assert!(lifetime < TimeDelta::hours(1) + TimeDelta::seconds(5));
}

#[tokio::test]
async fn create_with_absolute_expiration_keeps_zone() {
    let app = memory_app();
    let expires_at = (Utc::now() + TimeDelta::hours(2)).to_rfc3339();
    let body = json!({
        "content": BASE64.encode(b"secret"),
        "expiresAt": expires_at,
        "expiresAtTimeZone": "Europe/Berlin",
        "keyHash": key_hash(),
    });

    let (status, body) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["expiresAtTimeZone"], "Europe/Berlin");

    let rendered = DateTime::parse_from_rfc3339(body["expiresAt"].as_str().unwrap()).unwrap();
    let sent = DateTime::parse_from_rfc3339(&expires_at).unwrap();
    assert_eq!(rendered, sent);
    assert_ne!(rendered.offset().local_minus_utc(), 0);
}

#[tokio::test]
async fn create_rejects_short_lifetime() {
    let app = memory_app();
    let (status, body) = send(&app, post_json("/v1/notes", &create_body(b"secret", 60))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation failed");
    assert_eq!(detail_fields(&body), vec![Some("expiresIn".to_owned())]);
}

#[tokio::test]
async fn create_rejects_both_expiration_modes() {
    let app = memory_app();
    let body = json!({
        "content": BASE64.encode(b"secret"),
        "expiresIn": 3600,
        "expiresAt": (Utc::now() + TimeDelta::hours(2)).to_rfc3339(),
        "expiresAtTimeZone": "UTC",
        "keyHash": key_hash(),
    });

    let (status, body) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail_fields(&body).contains(&None));
}

#[tokio::test]
async fn create_reports_every_failure() {
    let app = memory_app();
    let body = json!({ "content": "", "expiresIn": 5 });

    let (status, body) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields = detail_fields(&body);
    assert!(fields.contains(&Some("content".to_owned())));
    assert!(fields.contains(&Some("keyHash".to_owned())));
    assert!(fields.contains(&Some("expiresIn".to_owned())));
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let app = memory_app();
    let (status, body) = send(&app, post_raw("/v1/notes", "{\"content\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn create_rejects_unknown_fields() {
    let app = memory_app();
    let mut body = create_body(b"secret", 3600);
    body["ttl"] = json!(3600);

    let (status, _) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_rejects_invalid_base64() {
    let app = memory_app();
    let mut body = create_body(b"secret", 3600);
    body["content"] = json!("not base64!");

    let (status, body) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
async fn create_rejects_oversized_body() {
    let app = memory_app();
    let body = create_body(&vec![0u8; MAX_BODY], 3600);

    let (status, _) = send(&app, post_json("/v1/notes", &body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let app = router(build_test_state(Arc::new(BrokenRepository)));
    let (status, body) = send(&app, post_json("/v1/notes", &create_body(b"secret", 3600))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal server error" }));
}

// -- Read -----------------------------------------------------------------

#[tokio::test]
async fn note_can_be_read_once() {
    let app = memory_app();
    let (_, created) = send(&app, post_json("/v1/notes", &create_body(b"secret", 3600))).await;
    let uri = format!(
        "/v1/notes/{}?key_hash={}",
        created["id"].as_str().unwrap(),
        key_hash()
    );

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["keyHash"], key_hash());
    assert_eq!(body["expiresAt"], created["expiresAt"]);
    let content = BASE64.decode(body["content"].as_str().unwrap()).unwrap();
    assert_eq!(content, b"secret");

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "note does not exist" }));
}

#[tokio::test]
async fn wrong_key_hash_is_not_found_and_consumes() {
    let app = memory_app();
    let (_, created) = send(&app, post_json("/v1/notes", &create_body(b"secret", 3600))).await;
    let id = created["id"].as_str().unwrap().to_owned();

    let wrong = encode_key_hash(&[8; 32]);
    let (status, body) = send(&app, get(&format!("/v1/notes/{id}?key_hash={wrong}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "note does not exist");

    let (status, _) = send(&app, get(&format!("/v1/notes/{id}?key_hash={}", key_hash()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_note_is_not_found() {
    let app = memory_app();
    let (status, body) =
        send(&app, get(&format!("/v1/notes/1111-1111-12?key_hash={}", key_hash()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "note does not exist");
}

#[tokio::test]
async fn malformed_lookup_is_unprocessable() {
    let app = memory_app();
    let (status, body) = send(&app, get("/v1/notes/abc?key_hash=short")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = detail_fields(&body);
    assert!(fields.contains(&Some("id".to_owned())));
    assert!(fields.contains(&Some("keyHash".to_owned())));
}

#[tokio::test]
async fn missing_key_hash_is_unprocessable() {
    let app = memory_app();
    let (status, body) = send(&app, get("/v1/notes/1111-1111-12")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec![Some("keyHash".to_owned())]);
}
