//! Error types emitted by the Waypost CLI.

use std::sync::Arc;

use thiserror::Error;
use waypost_providers::ProviderError;
use waypost_providers::transport::TransportBuildError;

/// Errors emitted by the Waypost CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A point argument could not be parsed as a coordinate pair.
    #[error("invalid point {text:?}: expected \"lat,lng\"")]
    InvalidPoint { text: String },
    /// An operation received fewer points than it works on.
    #[error("{command} needs at least {needed} points, got {got}")]
    TooFewPoints {
        command: &'static str,
        needed: usize,
        got: usize,
    },
    /// An isochrone request asked for both a time and a distance limit.
    #[error("set --time-limit or --distance-limit, not both")]
    ConflictingLimits,
    /// Constructing the HTTP transport failed.
    #[error("failed to build HTTP transport for {base_url:?}: {source}")]
    BuildTransport {
        base_url: String,
        #[source]
        source: TransportBuildError,
    },
    /// The provider rejected or failed the request.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Serialising the raw response failed.
    #[error("failed to serialise response: {0}")]
    SerialiseResponse(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
