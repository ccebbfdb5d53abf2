//! Synchronous HTTP transport over an internal async client.
//!
//! [`HttpTransport`] implements the synchronous [`Transport`] trait by
//! blocking on asynchronous `reqwest` calls internally. It owns a Tokio
//! runtime that is reused across calls, avoiding the overhead of creating a
//! new runtime per request.
//!
//! # Runtime behaviour
//!
//! When called from outside any Tokio runtime, the transport uses its own
//! stored runtime. When called from within an existing multi-threaded Tokio
//! runtime (detected via [`Handle::try_current()`] and
//! [`RuntimeFlavor::MultiThread`]), it uses that runtime's handle with
//! [`tokio::task::block_in_place`] to avoid nested runtime panics.
//!
//! When called from within a `current_thread` Tokio runtime, the transport
//! falls back to its own internal runtime. This avoids the panic that
//! `block_in_place` would cause, but may deadlock if the caller's runtime is
//! driving IO or timers this request depends on.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{ApiRequest, RequestMethod, Transport, TransportError};

/// Error type for [`HttpTransport`] construction failures.
#[derive(Debug)]
pub enum TransportBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
}

impl std::fmt::Display for TransportBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for TransportBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// Default user agent for outbound requests.
pub const DEFAULT_USER_AGENT: &str = "waypost/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Production [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, TransportBuildError> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(TransportBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Dispatch the request asynchronously.
    async fn execute_async(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let url = request.url.as_str();
        log::debug!("dispatching {} {url}", request.method);

        let builder = match request.method {
            RequestMethod::Get => self.client.get(request.url.clone()),
            RequestMethod::Post => {
                let post = self.client.post(request.url.clone());
                match &request.body {
                    Some(body) => post.json(body),
                    None => post,
                }
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        response.json().await.map_err(|err| TransportError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
    }

    /// Convert a reqwest error to a [`TransportError`].
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return TransportError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        TransportError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    /// Execute the request, bridging to the async client.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime must
    /// be multi-threaded (`flavor = "multi_thread"`). From a
    /// `current_thread` runtime, the method falls back to its own internal
    /// runtime, which may block the caller's runtime.
    fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        // block_in_place requires a multi-threaded runtime; for
        // current_thread runtimes we fall back to our own stored runtime.
        let future = self.execute_async(request);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own.
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpTransportConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[rstest]
    fn default_config_uses_the_crate_user_agent() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[rstest]
    fn transport_builds_with_defaults() {
        let transport = HttpTransport::new().expect("transport should build");
        let rendered = format!("{transport:?}");
        assert!(rendered.contains("HttpTransport"));
    }
}
