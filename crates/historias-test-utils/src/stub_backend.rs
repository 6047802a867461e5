//! Minimal stand-in for the historias backend, served on an ephemeral local port.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned reply for one backend path.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Value,
    pub delay: Duration,
}

impl StubResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body, delay: Duration::ZERO }
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self { status, body, delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

struct StubState {
    responses: HashMap<&'static str, StubResponse>,
    received: Mutex<Vec<Received>>,
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubBackend {
    pub fn builder() -> StubBackendBuilder {
        StubBackendBuilder::default()
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn received_on(&self, path: &str) -> Vec<Received> {
        self.received().into_iter().filter(|r| r.path == path).collect()
    }
}

pub struct StubBackendBuilder {
    responses: HashMap<&'static str, StubResponse>,
}

impl Default for StubBackendBuilder {
    fn default() -> Self {
        let mut responses = HashMap::new();
        responses.insert("/historiales", StubResponse::ok(json!({ "data": [] })));
        responses.insert("/metrics", StubResponse::ok(json!([])));
        responses.insert("/pacientes", StubResponse::ok(json!({ "message": "ok" })));
        responses.insert("/feedback", StubResponse::ok(json!({ "status": "ok" })));
        Self { responses }
    }
}

impl StubBackendBuilder {
    pub fn historiales(mut self, response: StubResponse) -> Self {
        self.responses.insert("/historiales", response);
        self
    }

    pub fn metrics(mut self, response: StubResponse) -> Self {
        self.responses.insert("/metrics", response);
        self
    }

    pub fn pacientes(mut self, response: StubResponse) -> Self {
        self.responses.insert("/pacientes", response);
        self
    }

    pub fn feedback(mut self, response: StubResponse) -> Self {
        self.responses.insert("/feedback", response);
        self
    }

    pub async fn spawn(self) -> anyhow::Result<StubBackend> {
        let state = Arc::new(StubState {
            responses: self.responses,
            received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/historiales", get(respond))
            .route("/metrics", get(respond))
            .route("/pacientes", post(respond))
            .route("/feedback", post(respond))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(StubBackend { base_url: format!("http://{}", addr), state })
    }
}

async fn respond(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let received = Received {
        path: path.clone(),
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    if let Ok(mut log) = state.received.lock() {
        log.push(received);
    }

    let Some(reply) = state.responses.get(path.as_str()).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}
