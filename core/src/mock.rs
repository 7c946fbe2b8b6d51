//! In-memory engine for tests: canned responses out, request history in.
//!
//! # Design
//! `MockEngine` plays back a queue of results in order and records every
//! request it sees. Clones share the queue and the history, so a test can
//! keep one handle, move another into a `Client`, and still assert on what
//! was sent. Responses go through the same `http_errors` classification as
//! the network engine, so a queued 404 surfaces as `ClientStatus` exactly as
//! it would over the wire.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use url::Url;

use crate::engine::{classify, Engine, EngineError, RawResponse, RequestOptions};
use crate::method::Method;

/// One request as the engine received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
}

impl RecordedRequest {
    /// The URL path, without scheme, authority, query or fragment. A
    /// relative URL is resolved against a placeholder origin first; a URL that
    /// does not parse at all is returned as recorded.
    pub fn path(&self) -> String {
        let parsed = match Url::parse(&self.url) {
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://localhost/").and_then(|base| base.join(&self.url))
            }
            other => other,
        };
        match parsed {
            Ok(url) => url.path().to_string(),
            Err(_) => self.url.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Result<RawResponse, EngineError>>,
    history: VecDeque<RecordedRequest>,
}

/// Engine that answers from a queue and keeps a request history.
#[derive(Debug, Clone)]
pub struct MockEngine {
    state: Arc<Mutex<State>>,
    http_errors: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            http_errors: true,
        }
    }

    /// Default `http_errors` when a request does not set it.
    pub fn with_http_errors(mut self, enabled: bool) -> Self {
        self.http_errors = enabled;
        self
    }

    /// Queue a response to play back.
    pub fn push(&self, response: RawResponse) -> &Self {
        self.lock().queue.push_back(Ok(response));
        self
    }

    /// Queue an engine failure to play back.
    pub fn push_error(&self, error: EngineError) -> &Self {
        self.lock().queue.push_back(Err(error));
        self
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Pop the oldest recorded request.
    pub fn take_request(&self) -> Option<RecordedRequest> {
        self.lock().history.pop_front()
    }

    pub fn history(&self) -> Vec<RecordedRequest> {
        self.lock().history.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the history from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MockEngine {
    fn request(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<RawResponse, EngineError> {
        let mut state = self.lock();
        state.history.push_back(RecordedRequest {
            method: method.clone(),
            url: url.to_string(),
            options: options.clone(),
        });

        let next = state
            .queue
            .pop_front()
            .ok_or_else(|| EngineError::transport("mock queue is empty"))?;
        classify(next?, options.http_errors.unwrap_or(self.http_errors))
    }
}
