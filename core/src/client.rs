//! Synchronous HTTP client façade.
//!
//! # Design
//! `Client` holds a base URL, an optional callback and an engine, all fixed
//! at `build()`; it carries no mutable state between calls. A request is
//! resolved to `base_url + endpoint` with no path normalization, handed to
//! the engine with the caller's options untouched, and the raw response is
//! wrapped as a `Response` or, when its `Content-Type` mentions
//! `application/json`, a `JsonResponse`.
//!
//! A 4xx is an ordinary, inspectable result: when the engine raises it as an
//! error, the response it carries is recovered and parsed like any other.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::engine::{Engine, EngineError, RawResponse, RequestOptions, UreqEngine};
use crate::error::{Error, Result};
use crate::headers::{HeaderBag, HeaderValue};
use crate::method::Method;
use crate::response::{JsonResponse, Response};

/// Invoked with every parsed response before `request` returns it.
pub type Callback = Arc<dyn Fn(&ParsedResponse) + Send + Sync>;

/// A response as chosen by content negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Plain(Response),
    Json(JsonResponse),
}

macro_rules! either {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            ParsedResponse::Plain($inner) => $body,
            ParsedResponse::Json($inner) => $body,
        }
    };
}

impl ParsedResponse {
    /// Wrap `raw` as JSON when its first `Content-Type` value contains
    /// `application/json`, as plain text otherwise.
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let is_json = raw
            .header("content-type")
            .is_some_and(|content_type| content_type.contains("application/json"));
        tracing::trace!(status = raw.status, is_json, "parsing response");

        if is_json {
            Ok(ParsedResponse::Json(JsonResponse::from_raw(raw)?))
        } else {
            Ok(ParsedResponse::Plain(Response::from_raw(raw)?))
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ParsedResponse::Json(_))
    }

    pub fn as_plain(&self) -> Option<&Response> {
        match self {
            ParsedResponse::Plain(response) => Some(response),
            ParsedResponse::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonResponse> {
        match self {
            ParsedResponse::Json(response) => Some(response),
            ParsedResponse::Plain(_) => None,
        }
    }

    pub fn as_plain_mut(&mut self) -> Option<&mut Response> {
        match self {
            ParsedResponse::Plain(response) => Some(response),
            ParsedResponse::Json(_) => None,
        }
    }

    pub fn as_json_mut(&mut self) -> Option<&mut JsonResponse> {
        match self {
            ParsedResponse::Json(response) => Some(response),
            ParsedResponse::Plain(_) => None,
        }
    }

    pub fn into_plain(self) -> Option<Response> {
        match self {
            ParsedResponse::Plain(response) => Some(response),
            ParsedResponse::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<JsonResponse> {
        match self {
            ParsedResponse::Json(response) => Some(response),
            ParsedResponse::Plain(_) => None,
        }
    }

    pub fn protocol_version(&self) -> f32 {
        either!(self, r => r.protocol_version())
    }

    pub fn status_code(&self) -> u16 {
        either!(self, r => r.status_code())
    }

    pub fn reason_phrase(&self) -> Option<&str> {
        either!(self, r => r.reason_phrase())
    }

    pub fn is_successful(&self) -> bool {
        either!(self, r => r.is_successful())
    }

    pub fn headers(&self) -> &HeaderBag {
        either!(self, r => r.headers())
    }

    pub fn header(&self, name: &str) -> &[String] {
        either!(self, r => r.header(name))
    }

    pub fn header_value(&self, name: &str) -> Option<&HeaderValue> {
        either!(self, r => r.header_value(name))
    }

    pub fn header_line(&self, name: &str) -> String {
        either!(self, r => r.header_line(name))
    }

    pub fn has_header(&self, name: &str) -> bool {
        either!(self, r => r.has_header(name))
    }

    pub fn raw_bytes(&self) -> &Bytes {
        either!(self, r => r.raw_bytes())
    }

    pub fn raw_text(&self) -> Cow<'_, str> {
        either!(self, r => r.raw_text())
    }

    /// Keyed body access; `None` for plain responses and absent keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        either!(self, r => r.get(key))
    }
}

/// HTTP client that wraps every completed exchange in a typed response.
#[derive(Clone)]
pub struct Client {
    base_url: Option<String>,
    callback: Option<Callback>,
    engine: Arc<dyn Engine>,
}

impl Client {
    /// A client on the network engine with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// `base_url + endpoint`, concatenated as-is.
    pub fn url(&self, endpoint: &str) -> String {
        match &self.base_url {
            Some(base_url) => format!("{base_url}{endpoint}"),
            None => endpoint.to_string(),
        }
    }

    /// Perform a request and parse the response.
    ///
    /// 4xx responses come back as `Ok`. Transport failures, 5xx responses
    /// the engine raised, and undecodable JSON bodies are errors.
    pub fn request(
        &self,
        method: impl Into<Method>,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ParsedResponse> {
        let method = method.into();
        let url = self.url(endpoint);
        tracing::debug!(%method, %url, "sending request");

        let raw = match self.engine.request(&method, &url, &options) {
            Ok(raw) => raw,
            Err(EngineError::ClientStatus(raw)) => {
                tracing::debug!(status = raw.status, %url, "recovered client error response");
                *raw
            }
            Err(EngineError::ServerStatus(raw)) => return Err(server_error(*raw)),
            Err(EngineError::Transport(source)) => return Err(Error::Transport(source)),
            Err(EngineError::InvalidRequest(message)) => return Err(Error::InvalidRequest(message)),
        };

        let response = ParsedResponse::from_raw(raw)?;
        if let Some(callback) = &self.callback {
            callback(&response);
        }
        Ok(response)
    }

    pub fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Get, endpoint, options)
    }

    pub fn head(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Head, endpoint, options)
    }

    pub fn put(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Put, endpoint, options)
    }

    pub fn post(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Post, endpoint, options)
    }

    pub fn patch(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Patch, endpoint, options)
    }

    pub fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
        self.request(Method::Delete, endpoint, options)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

fn server_error(raw: RawResponse) -> Error {
    let body = match raw.body.into_bytes() {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!(error = %err, "could not read server error body");
            Bytes::new()
        }
    };
    Error::ServerStatus {
        status: raw.status,
        reason: raw.reason,
        body,
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    callback: Option<Callback>,
    engine: Option<Arc<dyn Engine>>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn callback(mut self, callback: impl Fn(&ParsedResponse) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Replace the network engine, e.g. with a `MockEngine`.
    pub fn engine(mut self, engine: impl Engine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Apply a configuration. An explicit `base_url` or `engine` on the
    /// builder wins over what the configuration implies.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Client {
        let base_url = self.base_url.or_else(|| self.config.base_url.clone());
        let engine = match self.engine {
            Some(engine) => engine,
            None => Arc::new(UreqEngine::with_config(self.config.engine_config())),
        };
        Client {
            base_url,
            callback: self.callback,
            engine,
        }
    }
}
