//! Test helpers: mock extraction backend and multipart request builder

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use slipscan_common::config::RelayConfig;
use slipscan_relay::{build_router, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

/// One multipart field as the backend received it
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Canned reply for one backend endpoint
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Held back this long before answering
    pub delay: Option<Duration>,
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::to_vec(&body).unwrap(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    pub fn binary(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body: body.to_vec(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct MockState {
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Vec<ReceivedField>)>>,
    replies: Mutex<HashMap<String, MockReply>>,
}

/// Extraction backend stand-in bound to an ephemeral local port
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<MockState>,
    addr: SocketAddr,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/:endpoint", post(mock_endpoint))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the reply for `endpoint` (e.g. "extract", "extract_multi", "export")
    pub fn reply(&self, endpoint: &str, reply: MockReply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Endpoint and fields of the most recent request
    pub fn last_request(&self) -> Option<(String, Vec<ReceivedField>)> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

async fn mock_endpoint(
    State(state): State<Arc<MockState>>,
    Path(endpoint): Path<String>,
    mut multipart: Multipart,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        fields.push(ReceivedField {
            name,
            filename,
            content_type,
            bytes,
        });
    }
    state
        .requests
        .lock()
        .unwrap()
        .push((endpoint.clone(), fields));

    let reply = state.replies.lock().unwrap().get(&endpoint).cloned();
    if let Some(delay) = reply.as_ref().and_then(|r| r.delay) {
        tokio::time::sleep(delay).await;
    }
    match reply {
        Some(reply) => (
            StatusCode::from_u16(reply.status).unwrap(),
            [(header::CONTENT_TYPE, reply.content_type)],
            reply.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no reply configured").into_response(),
    }
}

/// Router wired to the given backend URL (or unconfigured)
pub fn relay_app(backend_url: Option<String>) -> Router {
    relay_app_with(RelayConfig {
        backend_url,
        ..Default::default()
    })
}

pub fn relay_app_with(config: RelayConfig) -> Router {
    build_router(AppState::new(config).unwrap())
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: &'static str,
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "slipscan-test-boundary-7MA4YWxkTrZu0gW",
            buf: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.buf))
            .unwrap()
    }
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
