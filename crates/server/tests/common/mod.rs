//! Common test utilities.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rangedrop_auth::TokenIssuer;
use rangedrop_server::{AppState, ServerConfig, create_router};
use rangedrop_transfer::{FILES_DIR, JsonFileStore, SESSIONS_DIR, SessionManager};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "rangedrop-test-boundary";

/// A router over a temporary upload directory.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = Arc::new(JsonFileStore::new(temp_dir.path().join(SESSIONS_DIR)));
        let manager = Arc::new(SessionManager::new(
            store,
            &temp_dir.path().join(FILES_DIR),
        ));
        let issuer = Arc::new(TokenIssuer::new(
            "admin",
            "admin",
            "test-secret",
            Duration::from_secs(30 * 60),
        ));

        let state = AppState::new(manager, issuer, config);
        let router = create_router(state.clone()).expect("Failed to build router");

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Issues a token directly, bypassing `/login`.
    pub fn token(&self) -> String {
        self.state
            .issuer
            .login("admin", "admin")
            .expect("Failed to issue token")
            .access_token
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and decodes the JSON body (Null when empty).
    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        let bytes = body_bytes(response).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn init(&self, token: &str, file_id: &str, total: u64) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/init_upload?file_id={file_id}&total_size={total}"))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send_json(request).await
    }

    pub async fn upload(
        &self,
        token: &str,
        file_id: &str,
        content_range: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        self.send_json(chunk_request(token, file_id, content_range, data))
            .await
    }
}

#[allow(dead_code)]
pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Builds a multipart body holding a single `chunk` field.
#[allow(dead_code)]
pub fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"blob\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[allow(dead_code)]
pub fn chunk_request(
    token: &str,
    file_id: &str,
    content_range: &str,
    data: &[u8],
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/upload_chunk?file_id={file_id}"))
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Range", content_range)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("chunk", data)))
        .unwrap()
}
