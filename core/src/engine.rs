//! The delegated HTTP engine and the raw data it exchanges with the façade.
//!
//! # Design
//! The façade never speaks HTTP itself. An [`Engine`] takes a method, a fully
//! resolved URL and passthrough [`RequestOptions`], and returns a
//! [`RawResponse`] as plain data. Swapping the engine is how tests intercept
//! requests (see `mock::MockEngine`); [`UreqEngine`] is the one that touches
//! the network.
//!
//! Status classification lives in [`classify`] so every engine reports 4xx
//! and 5xx the same way: with `http_errors` on, a 4xx becomes
//! `EngineError::ClientStatus` and a 5xx `EngineError::ServerStatus`, both
//! still carrying the complete response.

use std::fmt;
use std::io::{Cursor, Read};
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use ureq::http::{self, StatusCode, Version};

use crate::error::BoxError;
use crate::method::Method;

/// A response body that has not been read yet. It is drained exactly once.
pub struct RawBody(Box<dyn Read + Send + Sync>);

impl RawBody {
    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        RawBody(Box::new(reader))
    }

    pub fn empty() -> Self {
        RawBody::from(Vec::new())
    }

    /// Drain the stream. The bytes are returned untouched.
    pub fn into_bytes(mut self) -> std::io::Result<Bytes> {
        let mut bytes = Vec::new();
        self.0.read_to_end(&mut bytes)?;
        Ok(Bytes::from(bytes))
    }
}

impl Default for RawBody {
    fn default() -> Self {
        RawBody::empty()
    }
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawBody(..)")
    }
}

impl From<Vec<u8>> for RawBody {
    fn from(bytes: Vec<u8>) -> Self {
        RawBody::from_reader(Cursor::new(bytes))
    }
}

impl From<Bytes> for RawBody {
    fn from(bytes: Bytes) -> Self {
        RawBody::from_reader(Cursor::new(bytes))
    }
}

impl From<&[u8]> for RawBody {
    fn from(bytes: &[u8]) -> Self {
        RawBody::from(bytes.to_vec())
    }
}

impl From<String> for RawBody {
    fn from(text: String) -> Self {
        RawBody::from(text.into_bytes())
    }
}

impl From<&str> for RawBody {
    fn from(text: &str) -> Self {
        RawBody::from(text.to_string())
    }
}

/// An HTTP response as the engine received it.
#[derive(Debug)]
pub struct RawResponse {
    pub version: f32,
    pub status: u16,
    pub reason: Option<String>,
    /// Header names in arrival order, each with its ordered values.
    pub headers: Vec<(String, Vec<String>)>,
    pub body: RawBody,
}

impl RawResponse {
    /// An HTTP/1.1 response with the canonical reason for `status` and no
    /// headers or body.
    pub fn new(status: u16) -> Self {
        Self {
            version: 1.1,
            status,
            reason: canonical_reason(status),
            headers: Vec::new(),
            body: RawBody::empty(),
        }
    }

    /// Add a header value. Repeating a name, in any casing, appends to the
    /// first entry's value list.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.headers.push((name, vec![value])),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<RawBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_version(mut self, version: f32) -> Self {
        self.version = version;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

fn canonical_reason(status: u16) -> Option<String> {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
}

/// Options forwarded verbatim to the engine for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Serialized as the body with `Content-Type: application/json`, unless
    /// the caller supplied a content type. Takes precedence over `body`.
    pub json: Option<serde_json::Value>,
    /// Report 4xx/5xx through `EngineError`. `None` defers to the engine.
    pub http_errors: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(mut self, json: serde_json::Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn with_http_errors(mut self, enabled: bool) -> Self {
        self.http_errors = Some(enabled);
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }

    /// The bytes to send, and whether they came from `json`.
    pub fn payload(&self) -> Result<Option<(Vec<u8>, bool)>, EngineError> {
        if let Some(json) = &self.json {
            let bytes = serde_json::to_vec(json)
                .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
            return Ok(Some((bytes, true)));
        }
        Ok(self.body.clone().map(|bytes| (bytes, false)))
    }
}

/// Failures an engine reports instead of a response.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A 4xx response raised as an error; the response is intact.
    #[error("client error {}", .0.status)]
    ClientStatus(Box<RawResponse>),

    /// A 5xx response raised as an error; the response is intact.
    #[error("server error {}", .0.status)]
    ServerStatus(Box<RawResponse>),

    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        EngineError::Transport(err.into())
    }
}

/// Route a completed response through the `http_errors` policy.
pub fn classify(response: RawResponse, http_errors: bool) -> Result<RawResponse, EngineError> {
    if !http_errors {
        return Ok(response);
    }
    match response.status {
        400..=499 => Err(EngineError::ClientStatus(Box::new(response))),
        500..=599 => Err(EngineError::ServerStatus(Box::new(response))),
        _ => Ok(response),
    }
}

/// Something that can perform an HTTP exchange.
pub trait Engine: Send + Sync {
    fn request(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RawResponse, EngineError>;
}

/// Settings fixed when an engine is built.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sent with every request unless the request sets the same header.
    pub default_headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub http_errors: bool,
    /// Body size, in bytes, at which draining fails with a transport error.
    /// `None` means unlimited.
    pub body_limit: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_headers: Vec::new(),
            timeout: None,
            http_errors: true,
            body_limit: None,
        }
    }
}

/// Blocking engine backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqEngine {
    agent: ureq::Agent,
    config: EngineConfig,
}

impl UreqEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        // Statuses come back as data; `classify` decides what is an error.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self { agent, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl fmt::Debug for UreqEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for UreqEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for UreqEngine {
    fn request(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RawResponse, EngineError> {
        let mut builder = http::Request::builder().method(method.as_str()).uri(url);
        for (name, value) in &self.config.default_headers {
            if !options.has_header(name) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let invalid = |e: http::Error| EngineError::InvalidRequest(e.to_string());
        let result = match options.payload()? {
            Some((bytes, is_json)) => {
                if is_json && !options.has_header("content-type") {
                    builder = builder.header("content-type", "application/json");
                }
                self.agent.run(builder.body(bytes).map_err(invalid)?)
            }
            None => self.agent.run(builder.body(()).map_err(invalid)?),
        };

        let response = result.map_err(EngineError::transport)?;
        let raw = into_raw(response, self.config.body_limit)?;
        classify(raw, options.http_errors.unwrap_or(self.config.http_errors))
    }
}

fn into_raw(
    response: http::Response<ureq::Body>,
    body_limit: Option<u64>,
) -> Result<RawResponse, EngineError> {
    let version = match response.version() {
        Version::HTTP_09 => 0.9,
        Version::HTTP_10 => 1.0,
        Version::HTTP_2 => 2.0,
        Version::HTTP_3 => 3.0,
        _ => 1.1,
    };
    let status = response.status();
    let reason = status.canonical_reason().map(str::to_string);

    // Header names arrive lowercased from `http::HeaderMap`; the server's
    // casing is not recoverable here.
    let mut headers = Vec::new();
    for name in response.headers().keys() {
        let values = response
            .headers()
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        headers.push((name.as_str().to_string(), values));
    }

    let (_, mut body) = response.into_parts();
    let bytes = body
        .with_config()
        .limit(body_limit.unwrap_or(u64::MAX))
        .read_to_vec()
        .map_err(EngineError::transport)?;

    Ok(RawResponse {
        version,
        status: status.as_u16(),
        reason,
        headers,
        body: RawBody::from(bytes),
    })
}
