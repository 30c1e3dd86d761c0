// In-process stand-in for the admin backend, one per test.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use institute_admin::api::ApiClient;
use institute_admin::config::AppConfig;
use institute_admin::session::SessionContext;

pub const GOOD_TOKEN: &str = "good-token";
pub const ADMIN_PASSWORD: &str = "secret";

#[derive(Clone, Default)]
pub struct BackendState {
    /// Whether `/api/auth/me` is served; when off it answers 404
    pub primary_me: bool,
    /// Paths hit, in order
    pub hits: Arc<Mutex<Vec<String>>>,
}

impl BackendState {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn record(&self, uri: &Uri) {
        if let Ok(mut hits) = self.hits.lock() {
            hits.push(uri.path().to_string());
        }
    }
}

pub struct TestBackend {
    pub base_url: String,
    pub state: BackendState,
}

impl TestBackend {
    /// Base URL the client should be configured with
    pub fn api_url(&self) -> String {
        format!("{}/api", self.base_url)
    }

    pub fn config(&self) -> AppConfig {
        AppConfig::for_base_url(self.api_url())
    }

    pub fn client(&self, session: SessionContext) -> ApiClient {
        ApiClient::new(&self.config(), session).expect("client should build")
    }
}

pub async fn spawn_backend() -> Result<TestBackend> {
    spawn_backend_with(BackendState::default()).await
}

pub async fn spawn_backend_with(state: BackendState) -> Result<TestBackend> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test backend")?;
    let addr = listener.local_addr()?;

    let app = router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestBackend {
        base_url: format!("http://{}", addr),
        state,
    })
}

/// A base URL nothing is listening on
pub async fn closed_base_url() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/api", addr))
}

fn router(state: BackendState) -> Router {
    Router::new()
        .route("/api/echo-auth", get(echo_auth))
        .route("/api/students", get(list_students).post(create_student))
        .route("/api/courses", get(|| async { Json(json!([1, 2, 3])) }))
        .route("/api/subjects", get(|| async { Json(json!({"success": true, "data": []})) }))
        .route(
            "/api/courses/1",
            get(|| async { Json(json!({"id": 1})) }).delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route("/api/envelope", get(|| async { Json(json!({"data": {"id": 1}})) }))
        .route("/api/bad", get(|| async {
            (StatusCode::BAD_REQUEST, Json(json!({"message": "A", "error": "B"})))
        }))
        .route("/api/error-only", get(|| async {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"error": "B"})))
        }))
        .route("/api/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/api/malformed", get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                "{\"message\": \"trunc",
            )
        }))
        .route("/api/slow", get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"data": "late"}))
        }))
        .route("/api/expired", get(|| async {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "jwt expired"})))
        }))
        .route("/api/uploads", post(upload))
        .route("/api/auth/admin-login", post(admin_login))
        .route("/api/auth/me", get(me_primary))
        .route("/api/admin/me", get(me_legacy))
        .with_state(state)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn authorized(headers: &HeaderMap) -> bool {
    bearer(headers) == Some(format!("Bearer {}", GOOD_TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Token expired"}))).into_response()
}

async fn echo_auth(State(state): State<BackendState>, uri: Uri, headers: HeaderMap) -> Json<Value> {
    state.record(&uri);
    Json(json!({ "authorization": bearer(&headers) }))
}

async fn list_students(State(state): State<BackendState>, uri: Uri, headers: HeaderMap) -> Response {
    state.record(&uri);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"data": [
        {"_id": "s1", "name": "Asha", "course": "DCA"},
        {"_id": "s2", "name": "Ravi", "course": "ADCA"}
    ]}))
    .into_response()
}

async fn create_student(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut record = body;
    record["_id"] = json!("s3");
    (StatusCode::CREATED, Json(json!({"success": true, "data": record}))).into_response()
}

async fn upload(headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let text = String::from_utf8_lossy(&body).to_string();
    Json(json!({"data": {
        "content_type": content_type,
        "size": body.len(),
        "has_file_field": text.contains("name=\"file\""),
        "has_contents": text.contains("hello upload"),
    }}))
    .into_response()
}

async fn admin_login(Json(body): Json<Value>) -> Response {
    if body["password"] == json!(ADMIN_PASSWORD) {
        Json(json!({"data": {
            "token": GOOD_TOKEN,
            "user": {"id": "a1", "email": body["email"]}
        }}))
        .into_response()
    } else if body["password"] == json!("no-token") {
        Json(json!({"message": "ok"})).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"message": "Invalid credentials"}))).into_response()
    }
}

async fn me_primary(State(state): State<BackendState>, uri: Uri, headers: HeaderMap) -> Response {
    state.record(&uri);
    if !state.primary_me {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Route not found"}))).into_response();
    }
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"data": {"id": "a1", "source": "primary"}})).into_response()
}

async fn me_legacy(State(state): State<BackendState>, uri: Uri, headers: HeaderMap) -> Response {
    state.record(&uri);
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"id": "a1", "source": "legacy"})).into_response()
}
