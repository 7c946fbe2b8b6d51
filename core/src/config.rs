//! Client configuration.
//!
//! `ClientConfig` is plain serde data so a host application can embed it in
//! its own configuration file, or build it from the environment.

use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::engine::EngineConfig;

/// Environment variable holding the base URL.
pub const ENV_BASE_URL: &str = "FLUENT_HTTP_BASE_URL";
/// Environment variable holding the timeout in seconds.
pub const ENV_TIMEOUT: &str = "FLUENT_HTTP_TIMEOUT";

/// Settings for a client backed by the network engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefixed verbatim to every endpoint.
    pub base_url: Option<String>,
    /// Overall per-request timeout enforced by the engine.
    pub timeout_secs: Option<u64>,
    /// Sent with every request unless the request overrides them.
    pub headers: IndexMap<String, String>,
    /// Report 4xx/5xx through the engine's error channel.
    pub http_errors: bool,
    /// Response bodies reaching this many bytes fail as transport errors.
    /// Unlimited when unset.
    pub body_limit: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            headers: IndexMap::new(),
            http_errors: true,
            body_limit: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `FLUENT_HTTP_BASE_URL` for the base URL
    /// - `FLUENT_HTTP_TIMEOUT` for the timeout (in seconds); unparsable
    ///   values are ignored
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            config.base_url = Some(base_url);
        }

        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            match timeout.parse::<u64>() {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %timeout, "ignoring unparsable {ENV_TIMEOUT}"),
            }
        }

        config
    }

    /// The engine half of this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_headers: self
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            http_errors: self.http_errors,
            body_limit: self.body_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://example.com/api"}"#).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://example.com/api"));
        assert_eq!(config.timeout_secs, None);
        assert!(config.headers.is_empty());
        assert!(config.http_errors);
        assert_eq!(config.body_limit, None);
        assert_eq!(config.engine_config().body_limit, None);
    }

    #[test]
    fn body_limit_reaches_the_engine() {
        let config: ClientConfig = serde_json::from_str(r#"{"body_limit":1024}"#).unwrap();
        assert_eq!(config.engine_config().body_limit, Some(1024));
    }

    #[test]
    fn engine_config_keeps_header_order() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"timeout_secs":5,"http_errors":false,"headers":{"X-B":"2","X-A":"1"}}"#,
        )
        .unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.timeout, Some(Duration::from_secs(5)));
        assert!(!engine.http_errors);
        assert_eq!(
            engine.default_headers,
            [
                ("X-B".to_string(), "2".to_string()),
                ("X-A".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn reads_environment() {
        temp_env::with_vars(
            [
                (ENV_BASE_URL, Some("http://localhost:8080")),
                (ENV_TIMEOUT, Some("30")),
            ],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
                assert_eq!(config.timeout_secs, Some(30));
            },
        );
    }

    #[test]
    fn bad_timeout_is_ignored() {
        temp_env::with_vars(
            [(ENV_BASE_URL, None), (ENV_TIMEOUT, Some("soon"))],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config, ClientConfig::default());
            },
        );
    }
}
