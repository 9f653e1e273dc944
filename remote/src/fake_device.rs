//! In-process stand-in for the controller, recording every request it gets.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    Router,
};
use sprinkler_common::{ClientConfig, DeviceConfig};
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct DeviceState {
    reply: Arc<Mutex<(StatusCode, String)>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct FakeDevice {
    addr: SocketAddr,
    state: DeviceState,
    server: JoinHandle<()>,
}

/// Status envelope whose fields sit at the controller's offsets.
pub fn status_body(year: &str, on_off: &str, word: &str) -> String {
    let status = format!("{year:<4}-08-13T14:05:09Z {on_off:0>3}  {word:0>3}");
    serde_json::json!({ "status": status }).to_string()
}

impl FakeDevice {
    pub async fn start(body: impl Into<String>) -> Self {
        let state = DeviceState {
            reply: Arc::new(Mutex::new((StatusCode::OK, body.into()))),
            requests: Arc::default(),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .fallback(handle_request)
            .with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            device: DeviceConfig {
                host: self.addr.ip().to_string(),
                port: self.addr.port(),
            },
            request_timeout_ms: 5_000,
            ..ClientConfig::default()
        }
    }

    pub async fn set_response(&self, status: StatusCode, body: impl Into<String>) {
        *self.state.reply.lock().await = (status, body.into());
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.requests()
            .await
            .into_iter()
            .map(|request| request.path)
            .collect()
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle_request(
    State(state): State<DeviceState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.requests.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        content_type,
        body,
    });

    state.reply.lock().await.clone()
}
