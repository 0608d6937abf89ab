//! Scripted local stand-in for the ARM REST endpoint

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use azure_core::auth::AccessToken;
use netapp_deleter::auth::AzureAuthProvider;
use netapp_deleter::Result;

pub const TEST_TOKEN: &str = "test-token";

/// Hands out a fixed bearer token
pub struct StaticTokenProvider;

#[async_trait]
impl AzureAuthProvider for StaticTokenProvider {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
        Ok(AccessToken::new(
            TEST_TOKEN.to_string(),
            time::OffsetDateTime::now_utc() + time::Duration::hours(1),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct Scripted {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Scripted {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Default)]
struct ServerState {
    /// (method, path) to queued responses; the last one repeats
    routes: Mutex<HashMap<(String, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct ArmServer {
    base_url: String,
    state: Arc<ServerState>,
}

impl ArmServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Queue responses for `method path`, served in order
    pub fn respond(&self, method: &str, path: &str, responses: Vec<Scripted>) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

async fn handle(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        authorization: header("authorization"),
        request_id: header("x-ms-client-request-id"),
    });

    let scripted = {
        let mut routes = state.routes.lock().unwrap();
        match routes.get_mut(&(method.to_string(), uri.path().to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
    };

    let Some(scripted) = scripted else {
        return (
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":"ResourceNotFound","message":"not scripted"}}"#,
        )
            .into_response();
    };

    let mut response_headers = HeaderMap::new();
    for (name, value) in &scripted.headers {
        response_headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    (
        StatusCode::from_u16(scripted.status).unwrap(),
        response_headers,
        scripted.body,
    )
        .into_response()
}
