//! Thin typed façade over a blocking HTTP engine.
//!
//! # Overview
//! `Client` issues a request through a delegated `Engine` and wraps whatever
//! comes back in a `Response` with case-insensitive header access, or in a
//! `JsonResponse` when the `Content-Type` says the body is JSON. Connection
//! handling, TLS, redirects and timeouts all belong to the engine.
//!
//! # Design
//! - `Client` is stateless apart from configuration fixed at `build()`.
//! - The engine is a trait object, so tests swap in `mock::MockEngine` to
//!   play back canned responses and inspect the requests that were sent.
//! - 4xx responses are results, not errors. Only transport failures, engine
//!   reported 5xx responses and undecodable JSON bodies surface as `Error`.
//! - Response setters mutate in place and return `&mut Self` for chaining.

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod method;
pub mod mock;
pub mod response;

pub use bytes::Bytes;
pub use client::{Callback, Client, ClientBuilder, ParsedResponse};
pub use config::ClientConfig;
pub use engine::{Engine, EngineConfig, EngineError, RawBody, RawResponse, RequestOptions, UreqEngine};
pub use error::{Error, Result};
pub use headers::{HeaderBag, HeaderValue};
pub use method::Method;
pub use mock::{MockEngine, RecordedRequest};
pub use response::{Body, JsonResponse, Response};
