//! Error taxonomy shared by the provider clients.
//!
//! Caller mistakes (an index past the point list) surface before any
//! request is dispatched; transport and decoding failures surface after,
//! wrapping the lower-level error unchanged.

use thiserror::Error;
use waypost_core::{PolylineError, SelectionError};

use crate::transport::TransportError;

/// Errors emitted by provider operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// A matrix selection referenced a point that does not exist.
    ///
    /// Raised while building the request, before any network traffic.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// The transport could not complete the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Encoded geometry in the response failed to decode.
    #[error("failed to decode response geometry: {0}")]
    Polyline(#[from] PolylineError),
    /// The configured base URL could not be combined into a request URL.
    ///
    /// Raised while building the request, before any network traffic.
    #[error("invalid request URL {url:?}: {message}")]
    InvalidUrl {
        /// The URL text that failed to parse.
        url: String,
        /// The parser's description of the failure.
        message: String,
    },
    /// The response body did not match the provider's documented shape.
    #[error("unexpected response shape: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },
    /// The response geometry contradicted the encoding the request asked
    /// for.
    #[error("response geometry did not match the requested {expected} encoding")]
    UnexpectedGeometry {
        /// The encoding the request asked the provider to emit.
        expected: &'static str,
    },
    /// A directions response carried no routes.
    #[error("response contained no {expected}")]
    EmptyResponse {
        /// What the operation expected at least one of.
        expected: &'static str,
    },
    /// The service reported an in-band error code.
    #[error("service error {code}: {message}")]
    Service {
        /// The provider's machine-readable error code.
        code: String,
        /// The provider's human-readable detail, when present.
        message: String,
    },
}
