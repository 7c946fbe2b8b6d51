//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives a `Client` on the
//! real `UreqEngine` over HTTP. Validates that header handling, content
//! negotiation and status recovery behave the same over the wire as they do
//! against the in-memory engine.

use std::net::SocketAddr;
use std::sync::OnceLock;

use fluent_http::{Client, ClientConfig, Error, HeaderValue, RequestOptions};
use mock_server::{Echo, BROKEN_JSON, HTML_BODY, PNG_BYTES, REQUEST_ID};
use serde_json::json;

/// Start the mock server once for the whole test binary.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });

        addr
    })
}

fn client() -> Client {
    Client::builder()
        .base_url(format!("http://{}", server()))
        .build()
}

#[test]
fn html_is_a_plain_response() {
    let parsed = client().get("/html", RequestOptions::new()).unwrap();

    let response = parsed.as_plain().expect("expected a plain response");
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.protocol_version(), 1.1);
    assert!(response.header_line("Content-Type").starts_with("text/html"));
    assert_eq!(response.header("SERVER"), ["Apache", "The Coders Zone"]);
    assert_eq!(response.header_line("server"), "Apache, The Coders Zone");
    assert_eq!(response.body(), HTML_BODY);
}

#[test]
fn json_is_decoded() {
    let parsed = client().get("/json", RequestOptions::new()).unwrap();

    assert!(parsed.is_json());
    assert_eq!(parsed.get("foo"), Some(&json!("bar")));
    assert_eq!(parsed.get("items"), Some(&json!([1, 2, 3])));
    assert_eq!(parsed.get("absent"), None);
}

#[test]
fn not_found_is_recovered_as_a_response() {
    let parsed = client().get("/missing", RequestOptions::new()).unwrap();

    assert_eq!(parsed.status_code(), 404);
    assert!(!parsed.is_successful());
    assert_eq!(parsed.get("error"), Some(&json!("not found")));
}

#[test]
fn internal_error_propagates() {
    let err = client().get("/fail", RequestOptions::new()).unwrap_err();
    assert!(
        matches!(&err, Error::ServerStatus { status: 500, body, .. } if body == "boom"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn internal_error_is_a_response_when_http_errors_is_off() {
    let client = Client::builder()
        .config(ClientConfig {
            base_url: Some(format!("http://{}", server())),
            http_errors: false,
            ..ClientConfig::default()
        })
        .build();

    let parsed = client.get("/fail", RequestOptions::new()).unwrap();
    assert_eq!(parsed.status_code(), 500);
    assert_eq!(parsed.raw_bytes(), "boom");
}

#[test]
fn png_arrives_byte_for_byte() {
    let parsed = client().get("/png", RequestOptions::new()).unwrap();

    assert_eq!(parsed.header_line("Content-Type"), "image/png");
    assert_eq!(parsed.raw_bytes(), PNG_BYTES);
    assert_eq!(parsed.as_plain().unwrap().body(), PNG_BYTES);
}

#[test]
fn bodies_over_ten_mebibytes_are_read_in_full() {
    let len = 11 * 1024 * 1024;
    let parsed = client()
        .get(&format!("/bytes/{len}"), RequestOptions::new())
        .unwrap();

    assert_eq!(parsed.status_code(), 200);
    assert_eq!(parsed.raw_bytes().len(), len);
}

#[test]
fn body_limit_is_a_transport_error() {
    let client = Client::from_config(ClientConfig {
        base_url: Some(format!("http://{}", server())),
        body_limit: Some(1024),
        ..ClientConfig::default()
    });

    let err = client.get("/bytes/4096", RequestOptions::new()).unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert!(client.get("/bytes/512", RequestOptions::new()).is_ok());
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = client().get("/broken", RequestOptions::new()).unwrap_err();
    assert!(err.is_json(), "unexpected error: {err:?}");
    assert!(!BROKEN_JSON.is_empty());
}

#[test]
fn verb_helpers_reach_the_server() {
    let client = client();
    let cases = [
        ("PUT", client.put("/echo/put", RequestOptions::new())),
        ("POST", client.post("/echo/post", RequestOptions::new())),
        ("PATCH", client.patch("/echo/patch", RequestOptions::new())),
        ("DELETE", client.delete("/echo/delete", RequestOptions::new())),
        ("GET", client.get("/echo/get", RequestOptions::new())),
    ];

    for (method, result) in cases {
        let response = result.unwrap().into_json().expect("echo answers JSON");
        let echo: Echo = response.json().unwrap();
        assert_eq!(echo.method, method);
        assert_eq!(echo.path, format!("/echo/{}", method.to_lowercase()));
        assert!(response.has_header(REQUEST_ID));
    }
}

#[test]
fn head_returns_headers_without_body() {
    let parsed = client().head("/html", RequestOptions::new()).unwrap();

    assert_eq!(parsed.status_code(), 200);
    assert!(parsed.has_header("content-type"));
    assert!(parsed.raw_bytes().is_empty());
}

#[test]
fn json_option_sends_body_and_content_type() {
    let options = RequestOptions::new()
        .with_header("X-Trace", "abc")
        .with_json(json!({"name": "widget"}));
    let parsed = client().post("/echo/widgets?dry=1", options).unwrap();

    let echo: Echo = parsed.as_json().unwrap().json().unwrap();
    assert_eq!(echo.path, "/echo/widgets");
    assert_eq!(echo.query.as_deref(), Some("dry=1"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"name":"widget"}"#);
}

#[test]
fn configured_headers_are_sent() {
    let mut config = ClientConfig {
        base_url: Some(format!("http://{}", server())),
        ..ClientConfig::default()
    };
    config.headers.insert("Content-Type".to_string(), "text/plain".to_string());
    let client = Client::from_config(config);

    let parsed = client
        .put("/echo/doc", RequestOptions::new().with_body("hello"))
        .unwrap();
    let echo: Echo = parsed.into_json().unwrap().json().unwrap();
    assert_eq!(echo.content_type.as_deref(), Some("text/plain"));
    assert_eq!(echo.body, "hello");
}

#[test]
fn callback_sees_each_response() {
    let (tx, rx) = std::sync::mpsc::channel();
    let client = Client::builder()
        .base_url(format!("http://{}", server()))
        .callback(move |response| {
            tx.send(response.status_code()).unwrap();
        })
        .build();

    client.get("/json", RequestOptions::new()).unwrap();
    client.get("/missing", RequestOptions::new()).unwrap();

    let statuses: Vec<u16> = rx.try_iter().collect();
    assert_eq!(statuses, [200, 404]);
}

#[test]
fn request_id_header_is_single_valued() {
    let parsed = client().get("/echo/id", RequestOptions::new()).unwrap();
    assert!(matches!(
        parsed.header_value("X-Request-Id"),
        Some(HeaderValue::Single(id)) if id.len() == 36
    ));
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::builder().base_url(format!("http://{addr}")).build();
    let err = client.get("/", RequestOptions::new()).unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}
