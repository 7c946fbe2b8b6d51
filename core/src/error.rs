//! Error types for the HTTP façade.
//!
//! # Design
//! A 4xx response is never an error here: the client recovers it and hands
//! it back as a normal response. What remains are failures the caller cannot
//! inspect as a response: the transport gave up, the server answered 5xx
//! while `http_errors` was on, or a body that claims to be JSON is not.

use bytes::Bytes;
use thiserror::Error;

/// Boxed source error from a delegated engine.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for façade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `Client::request` and response construction.
#[derive(Debug, Error)]
pub enum Error {
    /// Network, DNS or timeout failure reported by the engine.
    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),

    /// The engine reported a 5xx as an error (`http_errors` enabled).
    #[error("server error {status}: {}", String::from_utf8_lossy(.body))]
    ServerStatus {
        status: u16,
        reason: Option<String>,
        body: Bytes,
    },

    /// The body carried a JSON content type but did not decode.
    #[error("unable to decode JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The raw body stream could not be drained.
    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    /// The engine refused to build the request (bad URL, bad header, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// True for the JSON decode kind.
    pub fn is_json(&self) -> bool {
        matches!(self, Error::Json(_))
    }

    /// True when the engine could not complete the exchange at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
