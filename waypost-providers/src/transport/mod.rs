//! The dispatch seam between provider clients and the network.
//!
//! Provider clients assemble an [`ApiRequest`] describing the exact outbound
//! call, then hand it to a [`Transport`]. The trait is synchronous to keep
//! the clients embeddable in synchronous contexts; any async machinery is an
//! implementation detail of the transport. [`HttpTransport`] is the
//! production implementation, while [`test_support::RecordingTransport`]
//! lets tests assert on the wire shape of every call without a socket.

use serde_json::Value;
use thiserror::Error;
use url::Url;

mod http;
#[doc(hidden)]
pub mod test_support;

pub use http::{DEFAULT_USER_AGENT, HttpTransport, HttpTransportConfig, TransportBuildError};

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel in a JSON body, with the query reserved for
    /// authentication.
    Post,
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A fully-formed outbound request.
///
/// Construction happens entirely in the provider clients; transports only
/// dispatch. The URL and body stay inspectable so tests can compare them
/// byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Method to dispatch with.
    pub method: RequestMethod,
    /// Absolute request URL, query parameters included.
    pub url: Url,
    /// JSON body for POST requests.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Build a GET request.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: RequestMethod::Get,
            url,
            body: None,
        }
    }

    /// Build a POST request carrying a JSON body.
    #[must_use]
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: RequestMethod::Post,
            url,
            body: Some(body),
        }
    }
}

/// Errors surfaced while dispatching a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code received.
        status: u16,
        /// Detail accompanying the failure.
        message: String,
    },
    /// The request never reached the service.
    #[error("network error for {url}: {message}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// Description of the connection failure.
        message: String,
    },
    /// The request ran past the configured deadline.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The URL that was requested.
        url: String,
        /// The configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The response body was not valid JSON.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// Description of the decode failure.
        message: String,
    },
}

/// Dispatch requests on behalf of a provider client.
///
/// Implementations must not reinterpret the request: the URL and body are
/// final, and responses are returned as parsed JSON without further
/// processing. Status and connectivity failures map onto [`TransportError`]
/// and propagate to the caller unchanged; retrying is out of scope.
pub trait Transport {
    /// Execute the request and return the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the request times out, cannot reach
    /// the service, answers with a non-success status, or produces a body
    /// that is not JSON.
    fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}
