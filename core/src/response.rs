//! Typed wrappers around a completed HTTP exchange.
//!
//! # Design
//! One generic `Response<B>` covers both the plain and the JSON flavour. The
//! body type decides how the drained bytes are parsed and how keyed field
//! access behaves through the [`Body`] trait: `Bytes` keeps the payload
//! untouched and has no fields, `serde_json::Value` decodes and looks keys up
//! in the decoded object. Only the JSON path and the text accessors decode;
//! the raw bytes are always kept as received.
//!
//! Setters mutate in place and hand back `&mut Self` so calls chain. Nothing
//! here is immutable; a `set_*` call changes the response every holder sees.

use std::borrow::Cow;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::engine::RawResponse;
use crate::error::{Error, Result};
use crate::headers::{HeaderBag, HeaderValue};

/// How a response body is parsed and queried.
pub trait Body: Sized {
    /// Parse the drained body.
    fn parse(raw: &Bytes) -> Result<Self>;

    /// Look up a field by key. Absent keys are `None`.
    fn field(&self, key: &str) -> Option<&Value>;
}

impl Body for Bytes {
    fn parse(raw: &Bytes) -> Result<Self> {
        Ok(raw.clone())
    }

    fn field(&self, _key: &str) -> Option<&Value> {
        None
    }
}

impl Body for Value {
    fn parse(raw: &Bytes) -> Result<Self> {
        serde_json::from_slice(raw).map_err(|e| {
            tracing::warn!(error = %e, "response body is not valid JSON");
            Error::Json(e)
        })
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// A completed HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<B: Body = Bytes> {
    version: f32,
    status: u16,
    reason: Option<String>,
    headers: HeaderBag,
    body: B,
    raw_body: Bytes,
}

/// A response whose body was decoded as JSON.
pub type JsonResponse = Response<Value>;

impl<B: Body> Response<B> {
    /// Capture the engine's response, draining its body once and parsing it
    /// as `B`.
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let headers: HeaderBag = raw.headers.into_iter().collect();
        let raw_body = raw.body.into_bytes()?;
        let body = B::parse(&raw_body)?;

        Ok(Self {
            version: raw.version,
            status: raw.status,
            reason: raw.reason,
            headers,
            body,
            raw_body,
        })
    }

    pub fn protocol_version(&self) -> f32 {
        self.version
    }

    pub fn set_protocol_version(&mut self, version: f32) -> &mut Self {
        self.version = version;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn reason_phrase(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Replace both the status code and the reason phrase.
    pub fn set_status(&mut self, code: u16, reason: Option<&str>) -> &mut Self {
        self.status = code;
        self.reason = reason.map(str::to_string);
        self
    }

    /// True for any status below 400, informational and redirects included.
    pub fn is_successful(&self) -> bool {
        self.status < 400
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn header_value(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.value(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.headers.line(name)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> &mut Self {
        self.headers.append(name, value);
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        self
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    /// Replace the parsed body. The raw bytes are left as received.
    pub fn set_body(&mut self, body: impl Into<B>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// The body exactly as drained from the engine.
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw_body
    }

    /// The drained body as text. Invalid UTF-8 is replaced, the stored bytes
    /// are not.
    pub fn raw_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }

    /// Keyed access into the body. Always `None` for plain responses.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.field(key)
    }
}

impl Response {
    /// The current body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl JsonResponse {
    /// Deserialize the decoded body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.body).map_err(Error::Json)
    }
}

impl<B: Body> TryFrom<RawResponse> for Response<B> {
    type Error = Error;

    fn try_from(raw: RawResponse) -> Result<Self> {
        Response::from_raw(raw)
    }
}
