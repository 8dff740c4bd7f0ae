//! In-process stand-in for the generation backend, used by tests

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// How the mock answers `POST /generate`
#[derive(Clone)]
pub enum Behaviour {
    Sentence(String),
    Status(u16),
    /// 200 with a body that is not JSON
    Garbage,
    /// Wait until `release` is notified, then answer with the sentence
    Held { release: Arc<Notify>, sentence: String },
}

impl Behaviour {
    pub fn sentence(s: &str) -> Self {
        Behaviour::Sentence(s.to_string())
    }
}

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub struct MockBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockBackend {
    /// Bind to an ephemeral loopback port and serve until the runtime stops
    pub async fn start(behaviour: Behaviour) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            behaviour,
            requests: requests.clone(),
        };

        let router = Router::new()
            .route("/", get(health))
            .route("/generate", post(generate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    /// Every `start_word` received so far, in arrival order
    pub fn start_words(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|body| body["start_word"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// An address nothing is listening on
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Shakespeare API is running" }))
}

// The Json extractor rejects bodies without an application/json content type
async fn generate(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);

    match state.behaviour {
        Behaviour::Sentence(sentence) => Json(json!({ "sentence": sentence })).into_response(),
        Behaviour::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, "Internal Server Error").into_response()
        }
        Behaviour::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
        Behaviour::Held { release, sentence } => {
            release.notified().await;
            Json(json!({ "sentence": sentence })).into_response()
        }
    }
}
