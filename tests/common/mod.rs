//! Shared helpers: a recording upstream and a running dev server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use apiproxy::state::{AppState, build_client};
use apiproxy::upstream::{ProxyTarget, UpstreamError};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
};
use tokio::net::TcpListener;

/// What the upstream saw.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Canned upstream answer.
#[derive(Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Bytes,
}

impl Reply {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type", "application/json")],
            body: Bytes::from_static(body.as_bytes()),
        }
    }
}

#[derive(Clone)]
struct Backend {
    seen: Arc<Mutex<Vec<Captured>>>,
    reply: Reply,
}

pub struct Upstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl Upstream {
    pub fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }

    pub fn single(&self) -> Captured {
        let seen = self.requests();
        assert_eq!(seen.len(), 1, "expected exactly one upstream request");
        seen.into_iter().next().unwrap()
    }
}

async fn record(State(backend): State<Backend>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    backend.seen.lock().unwrap().push(Captured {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    });

    let reply = backend.reply;
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    for (name, value) in reply.headers {
        response
            .headers_mut()
            .append(name, value.parse().unwrap());
    }
    response
}

/// Starts an upstream on an ephemeral port that records every request.
pub async fn start_upstream(reply: Reply) -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record).with_state(Backend {
        seen: seen.clone(),
        reply,
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Upstream { addr, seen }
}

/// Starts the dev server with the given upstream value and static root.
pub async fn start_proxy(api_url: Option<&str>, serve_dir: &Path) -> SocketAddr {
    let upstream: Result<ProxyTarget, UpstreamError> = ProxyTarget::from_config(api_url);
    let state = AppState::new(build_client().unwrap(), upstream, serve_dir);
    let app = apiproxy::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
