//! Shared helpers for burialdb-web integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use burialdb_common::db::init::init_database;
use burialdb_web::storage::MediaStorage;
use burialdb_web::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

pub const BOUNDARY: &str = "burialdb-test-boundary";

/// App on a fresh database in a temporary root folder
pub struct TestApp {
    pub app: Router,
    pub db: SqlitePool,
    pub storage: MediaStorage,
    _dir: TempDir,
}

impl TestApp {
    /// Auth disabled (shared secret 0)
    pub async fn new() -> Self {
        Self::with_secret(0).await
    }

    pub async fn with_secret(shared_secret: i64) -> Self {
        Self::build(shared_secret, burialdb_common::config::DEFAULT_MAX_UPLOAD_BYTES).await
    }

    pub async fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(0, max_upload_bytes).await
    }

    async fn build(shared_secret: i64, max_upload_bytes: usize) -> Self {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let db = init_database(&dir.path().join("burialdb.db"))
            .await
            .expect("Should initialize database");
        let storage = MediaStorage::new(dir.path().join("media"));

        let state = AppState::new(db.clone(), shared_secret, storage.clone())
            .with_max_upload_bytes(max_upload_bytes);
        Self {
            app: build_router(state),
            db,
            storage,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(empty_request("GET", uri)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(empty_request("DELETE", uri)).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PUT", uri, body)).await
    }

    /// Upload a file through `POST /api/imports`
    pub async fn upload(
        &self,
        filename: &str,
        content: &[u8],
        fields: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/imports")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(filename, content, fields)))
            .unwrap();
        self.send(request).await
    }
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn multipart_body(filename: &str, content: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    body
}
