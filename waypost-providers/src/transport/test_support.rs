//! Test utilities for transports.
//!
//! This module provides [`RecordingTransport`], a deterministic test double
//! for [`Transport`] that returns a pre-configured outcome and records every
//! request it receives, so tests can verify the exact wire shape of a call
//! without a running service.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{ApiRequest, Transport, TransportError};

/// Recording `Transport` for testing.
///
/// Every call returns a clone of the configured outcome and appends the
/// request to an inspectable log. Clones share the log, so a test can hand
/// one handle to a client and keep another for assertions. Zero-network
/// assertions check that the log stayed empty.
///
/// # Example
///
/// ```
/// use url::Url;
/// use serde_json::json;
/// use waypost_providers::transport::test_support::RecordingTransport;
/// use waypost_providers::{ApiRequest, Transport};
///
/// let transport = RecordingTransport::with_response(json!({"paths": []}));
/// let url = Url::parse("https://graphhopper.com/api/1/isochrone?key=abc").expect("static URL");
///
/// let body = transport.execute(&ApiRequest::get(url.clone())).expect("canned success");
/// assert_eq!(body, json!({"paths": []}));
/// assert_eq!(transport.single_call().url, url);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    outcome: CannedOutcome,
    calls: Arc<Mutex<Vec<ApiRequest>>>,
}

#[derive(Debug, Clone)]
enum CannedOutcome {
    Success(Value),
    Failure(TransportError),
}

impl RecordingTransport {
    /// Create a transport that answers every request with `response`.
    #[must_use]
    pub fn with_response(response: Value) -> Self {
        Self {
            outcome: CannedOutcome::Success(response),
            calls: Arc::default(),
        }
    }

    /// Create a transport that fails every request with `error`.
    #[must_use]
    pub fn with_error(error: TransportError) -> Self {
        Self {
            outcome: CannedOutcome::Failure(error),
            calls: Arc::default(),
        }
    }

    /// Snapshot of the requests executed so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if a previous test panicked while holding the call log.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// The single request this transport has executed.
    ///
    /// # Panics
    ///
    /// Panics if the transport executed zero or multiple requests, or if a
    /// previous test panicked while holding the call log.
    #[must_use]
    pub fn single_call(&self) -> ApiRequest {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one dispatched request");
        calls.into_iter().next().expect("one recorded request")
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(request.clone());
        match &self.outcome {
            CannedOutcome::Success(response) => Ok(response.clone()),
            CannedOutcome::Failure(error) => Err(error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use url::Url;

    fn request() -> ApiRequest {
        ApiRequest::get(Url::parse("http://localhost:8989/matrix").expect("static URL"))
    }

    #[rstest]
    fn returns_the_configured_response_and_records_the_call() {
        let transport = RecordingTransport::with_response(json!({"times": [[0]]}));

        let body = transport.execute(&request()).expect("canned success");

        assert_eq!(body, json!({"times": [[0]]}));
        assert_eq!(transport.single_call(), request());
    }

    #[rstest]
    fn returns_the_configured_error() {
        let transport = RecordingTransport::with_error(TransportError::Network {
            url: "http://localhost:8989/matrix".to_string(),
            message: "connection refused".to_string(),
        });

        let err = transport.execute(&request()).expect_err("canned failure");

        assert!(matches!(err, TransportError::Network { .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[rstest]
    fn unused_transport_records_nothing() {
        let transport = RecordingTransport::with_response(json!({}));
        assert!(transport.calls().is_empty());
    }

    #[rstest]
    fn clones_share_the_call_log() {
        let transport = RecordingTransport::with_response(json!({}));
        let handle = transport.clone();

        transport.execute(&request()).expect("canned success");

        assert_eq!(handle.calls().len(), 1);
    }
}
