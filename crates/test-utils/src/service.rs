//! A stand-in attestation service on a random loopback port.
//!
//! Every request gets the same canned response and is recorded for later
//! inspection. The server runs on its own tokio runtime so blocking clients,
//! and child processes, can talk to it from plain `#[test]` functions.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use serde_json::Value;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;

/// A request as received by [`StubService`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    /// Header value as text. Panics if it is not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(|value| value.to_str().expect("header value is not visible ASCII"))
    }

    pub fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn capture(
    State(canned): State<Canned>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    canned.requests.lock().unwrap().push(CapturedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (canned.status, canned.body.clone())
}

/// Attestation service stand-in. Shut down on drop.
#[derive(Debug)]
pub struct StubService {
    port: u16,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    _runtime: Runtime,
}

impl StubService {
    /// Answers every request with `status` and `body`.
    pub fn respond_with(status: u16, body: impl Into<String>) -> Self {
        let runtime = Runtime::new().expect("Failed to start tokio runtime");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let canned = Canned {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            body: body.into(),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(capture).with_state(canned);

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind to a port");
        let port = listener.local_addr().unwrap().port();
        runtime.spawn(async move { axum::serve(listener, app).await });

        Self {
            port,
            requests,
            _runtime: runtime,
        }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The only request received. Panics on zero or several.
    pub fn single_request(&self) -> CapturedRequest {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }

    /// Panics if any request has reached the service.
    pub fn assert_untouched(&self) {
        let requests = self.requests();
        assert!(requests.is_empty(), "unexpected requests: {requests:?}");
    }
}

/// A port that was free a moment ago. Nothing listens on it.
pub fn get_random_port() -> u16 {
    TcpListener::bind("127.0.0.1:0") // 0 means OS assigns a free port
        .expect("Failed to bind to a port")
        .local_addr()
        .unwrap()
        .port()
}
