//! Fixture HTTP server for exercising the client's redirect and cache paths.
//!
//! Redirects carry absolute `Location` URIs built from the address the
//! server was bound to, so a chain can be followed without any relative
//! resolution on the client side.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

pub const RESOURCE_BODY: &str = "hello from the fixture server";
pub const CHAIN_END_BODY: &str = "end of redirect chain";

#[derive(Clone)]
pub struct AppState {
    base_url: Arc<str>,
    hits: Arc<AtomicUsize>,
}

pub fn app(base_url: &str) -> Router {
    let state = AppState {
        base_url: Arc::from(base_url.trim_end_matches('/')),
        hits: Arc::new(AtomicUsize::new(0)),
    };
    Router::new()
        .route("/resource", get(resource))
        .route("/counter", get(counter))
        .route("/redirect/{n}", get(redirect_chain))
        .route("/malformed-redirect", get(malformed_redirect))
        .route("/relative-redirect", get(relative_redirect))
        .route("/headers", get(echo_headers))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    axum::serve(listener, app(&format!("http://{addr}"))).await
}

async fn resource() -> &'static str {
    RESOURCE_BODY
}

/// Body is the number of times this route has been served, starting at 1.
async fn counter(State(state): State<AppState>) -> String {
    let hits = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    hits.to_string()
}

/// `/redirect/{n}` points at `/redirect/{n-1}`; `/redirect/0` ends the chain.
async fn redirect_chain(State(state): State<AppState>, Path(n): Path<u32>) -> Response {
    if n == 0 {
        return (StatusCode::OK, CHAIN_END_BODY).into_response();
    }
    found(format!("{}/redirect/{}", state.base_url, n - 1))
}

async fn malformed_redirect() -> Response {
    found("not a uri".to_string())
}

async fn relative_redirect() -> Response {
    found("/resource".to_string())
}

/// One `name: value` line per received header, names lowercased.
async fn echo_headers(headers: HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            format!("{}: {}\n", name, value.to_str().unwrap_or("<non-ascii>"))
        })
        .collect()
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
