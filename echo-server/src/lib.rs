use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

pub type Args = BTreeMap<String, String>;

/// What the echo endpoints report back about the request they received.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub url: String,
    pub args: Args,
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub json: Value,
}

pub fn app() -> Router {
    Router::new()
        .route("/get", get(echo))
        .route("/post", post(echo))
        .route("/put", put(echo))
        .route("/patch", patch(echo))
        .route("/delete", delete(echo))
        .route("/echo", post(raw_echo))
        .route("/headers", get(request_headers))
        .route("/response-headers", get(response_headers))
        .route("/status/{code}", any(status))
        .route("/stream/{count}", get(stream))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(args): Query<Args>,
    data: String,
) -> Json<Echo> {
    let json = if is_json(&headers) {
        serde_json::from_str(&data).unwrap_or(Value::Null)
    } else {
        Value::Null
    };
    Json(Echo {
        method: method.to_string(),
        url: uri.to_string(),
        args,
        headers: header_map(&headers),
        data,
        json,
    })
}

/// Send the request body straight back with the request's content type.
async fn raw_echo(headers: HeaderMap, data: String) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("text/plain"));
    ([(header::CONTENT_TYPE, content_type)], data)
}

async fn request_headers(headers: HeaderMap) -> Json<Value> {
    Json(serde_json::json!({ "headers": header_map(&headers) }))
}

/// Every query pair becomes a response header; invalid pairs are skipped.
async fn response_headers(Query(args): Query<Args>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in &args {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    (headers, Json(args))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(serde_json::json!({ "status": code })))
}

/// Stream `count` small JSON objects, one per chunk, with no content length.
async fn stream(Path(count): Path<usize>) -> impl IntoResponse {
    let chunks = (0..count).map(|id| Ok::<_, std::io::Error>(format!("{{\"id\":{id}}}")));
    (
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(futures::stream::iter(chunks)),
    )
}
