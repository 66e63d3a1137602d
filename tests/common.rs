#![allow(dead_code)]

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// What the mock service saw in one `/compress` request.
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub k: Option<String>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Arc<Vec<u8>>,
    received: Arc<Mutex<Vec<ReceivedUpload>>>,
}

/// A local stand-in for the PCA compression service.
pub struct MockService {
    pub base_url: String,
    received: Arc<Mutex<Vec<ReceivedUpload>>>,
}

impl MockService {
    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.received.lock().unwrap().clone()
    }
}

async fn compress_handler(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> (StatusCode, Vec<u8>) {
    let mut upload = ReceivedUpload::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            "k" => upload.k = field.text().await.ok(),
            _ => {}
        }
    }

    state.received.lock().unwrap().push(upload);
    (state.status, state.reply.as_ref().clone())
}

async fn health_handler() -> &'static str {
    "I'm Alive"
}

/// Start a mock service on an ephemeral port that answers every
/// `/compress` request with `status` and `reply`.
pub async fn spawn_mock_service(status: StatusCode, reply: Vec<u8>) -> MockService {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply: Arc::new(reply),
        received: received.clone(),
    };

    let app = Router::new()
        .route("/compress", post(compress_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService {
        base_url: format!("http://{}", addr),
        received,
    }
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a fake image of `len` bytes into `dir`.
pub fn create_test_image_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0x5A; len]).unwrap();
    path
}
