//! Fixture HTTP server for exercising the client over a real socket.
//!
//! Every route returns a fixed shape: HTML with a repeated header, JSON,
//! malformed JSON, a JSON 404, a plain 500, binary payloads, and an echo
//! route that reports the method, path and body it received.

use axum::{
    extract::Path,
    http::{
        header::{CONTENT_TYPE, SERVER},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{Html, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const HTML_BODY: &str = r#"<html lang="en"><p>Hello, World!</p></html>"#;
pub const BROKEN_JSON: &str = r#"{"foo":"#;
pub const REQUEST_ID: &str = "x-request-id";
/// PNG signature prefix followed by bytes that are not valid UTF-8.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00];

/// What `/echo/...` saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/html", get(html))
        .route("/json", get(json))
        .route("/broken", get(broken))
        .route("/missing", get(missing))
        .route("/fail", get(fail))
        .route("/png", get(png))
        .route("/bytes/{len}", get(filler))
        .route("/echo/{*rest}", any(echo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn html() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.append(SERVER, HeaderValue::from_static("Apache"));
    headers.append(SERVER, HeaderValue::from_static("The Coders Zone"));
    (headers, Html(HTML_BODY))
}

async fn json() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "foo": "bar", "items": [1, 2, 3] }))
}

async fn broken() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], BROKEN_JSON)
}

async fn missing() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}

async fn fail() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn png() -> impl IntoResponse {
    ([(CONTENT_TYPE, "image/png")], PNG_BYTES)
}

/// `len` bytes of filler, for body size limits.
async fn filler(Path(len): Path<usize>) -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/octet-stream")], vec![b'x'; len])
}

async fn echo(
    method: Method,
    uri: Uri,
    Path(rest): Path<String>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    tracing::debug!(%method, path = %uri.path(), rest, "echo");
    let echo = Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    };
    let request_id = Uuid::new_v4().to_string();
    ([(REQUEST_ID, request_id)], Json(echo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "PATCH".to_string(),
            path: "/echo/items/1".to_string(),
            query: None,
            content_type: Some("application/json".to_string()),
            body: "{}".to_string(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "PATCH");
        assert_eq!(json["path"], "/echo/items/1");
        assert!(json["query"].is_null());
    }

    #[test]
    fn png_fixture_is_not_utf8() {
        assert!(std::str::from_utf8(PNG_BYTES).is_err());
    }

    #[test]
    fn broken_fixture_is_not_json() {
        assert!(serde_json::from_str::<serde_json::Value>(BROKEN_JSON).is_err());
    }
}
