//! Echo server used to drive the transport end to end.
//!
//! `/echo` reflects the request back as JSON, `/status/{code}` answers with
//! an arbitrary status, and `/duplicate-headers` sends one header name twice.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub uri: String,
    /// Every header line received, values in arrival order.
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/duplicate-headers", get(duplicate_headers))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        seen.entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    tracing::debug!(%method, %uri, body_len = body.len(), "echo");
    Json(Echo {
        method: method.to_string(),
        uri: uri.to_string(),
        headers: seen,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn duplicate_headers() -> impl IntoResponse {
    (
        AppendHeaders([("x-dup", "first"), ("x-dup", "second")]),
        "duplicates",
    )
}
