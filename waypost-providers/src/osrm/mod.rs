//! Client for the OSRM route and table APIs.
//!
//! OSRM carries coordinates in the URL path as semicolon-separated
//! `lng,lat` pairs and reports failures in-band through a `code` member,
//! so every response is checked for `"Ok"` before mapping. Geometry
//! encoding is negotiated up front through the `geometries` parameter.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/>
//!
//! ```no_run
//! use geo::Coord;
//! use waypost_providers::osrm::{DirectionsOptions, Osrm};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Osrm::new()?;
//! let route = client.directions(
//!     &[
//!         Coord { x: 8.680916, y: 49.415776 },
//!         Coord { x: 8.688641, y: 49.420577 },
//!     ],
//!     "car",
//!     &DirectionsOptions::default(),
//! )?;
//! println!("{} m in {} s", route.distance(), route.duration().as_secs());
//! # Ok(())
//! # }
//! ```

use geo::Coord;
use serde_json::{Map, Value};
use url::Url;
use waypost_core::params::resolve_matrix_selection;
use waypost_core::{Matrix, MatrixSelection, QueryPairs, Route, Routes, SelectedPoint};

use crate::error::ProviderError;
use crate::geometry::GeometryEncoding;
use crate::transport::{ApiRequest, HttpTransport, Transport, TransportBuildError};

mod response;

/// Public demo OSRM endpoint.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Configuration for [`Osrm`].
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM deployment, without a trailing service path.
    pub base_url: String,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OsrmConfig {
    /// Replace the base URL, for self-hosted deployments.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Geometry encodings the route service can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Geometries {
    /// Polyline encoded with five decimal digits.
    #[default]
    Polyline,
    /// Polyline encoded with six decimal digits.
    Polyline6,
    /// GeoJSON `LineString` coordinates.
    GeoJson,
}

impl Geometries {
    /// Wire name of the encoding.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polyline => "polyline",
            Self::Polyline6 => "polyline6",
            Self::GeoJson => "geojson",
        }
    }

    /// The decoder configuration this encoding implies.
    pub(crate) const fn encoding(self) -> GeometryEncoding {
        match self {
            Self::Polyline => GeometryEncoding::Polyline {
                precision: 5,
                elevation: false,
            },
            Self::Polyline6 => GeometryEncoding::Polyline {
                precision: 6,
                elevation: false,
            },
            Self::GeoJson => GeometryEncoding::GeoJson,
        }
    }
}

/// Overview geometry detail for the route service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overview {
    /// Geometry simplified to the zoom level of the full route.
    Simplified,
    /// Full-detail geometry.
    Full,
    /// No overview geometry at all.
    False,
}

impl Overview {
    /// Wire name of the detail level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simplified => "simplified",
            Self::Full => "full",
            Self::False => "false",
        }
    }
}

/// Options for [`Osrm::directions`] beyond the points and profile.
#[derive(Debug, Clone, Default)]
pub struct DirectionsOptions {
    /// Ask the engine to search for alternative routes.
    pub alternatives: Option<bool>,
    /// Include turn-by-turn steps in the response.
    pub steps: Option<bool>,
    /// Geometry encoding to negotiate. Sent on every request; the
    /// decoder keys off the same value.
    pub geometries: Geometries,
    /// Overview geometry detail.
    pub overview: Option<Overview>,
    /// Extra query parameters passed through verbatim.
    pub extras: Map<String, Value>,
}

/// Result annotations the table service can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAnnotation {
    /// Travel times in seconds.
    Duration,
    /// Travel distances in metres.
    Distance,
}

impl TableAnnotation {
    /// Wire name of the annotation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Distance => "distance",
        }
    }
}

/// Options for [`Osrm::matrix`] beyond the points and profile.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    /// Indices into the point list acting as row origins. `None` keeps
    /// every point as an origin.
    pub sources: Option<Vec<usize>>,
    /// Indices into the point list acting as column destinations. `None`
    /// keeps every point as a destination.
    pub destinations: Option<Vec<usize>>,
    /// Which annotations the engine should compute. The engine defaults
    /// to durations when empty.
    pub annotations: Vec<TableAnnotation>,
    /// Extra query parameters passed through verbatim.
    pub extras: Map<String, Value>,
}

/// Client for an OSRM deployment.
///
/// Generic over the [`Transport`] so tests can substitute a recording
/// double; production code uses the [`HttpTransport`] default.
#[derive(Debug)]
pub struct Osrm<T = HttpTransport> {
    config: OsrmConfig,
    transport: T,
}

impl Osrm<HttpTransport> {
    /// Build a client for the public demo server.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client or its runtime cannot be
    /// constructed.
    pub fn new() -> Result<Self, TransportBuildError> {
        Self::with_config(OsrmConfig::default())
    }

    /// Build a client for `config` using the default HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client or its runtime cannot be
    /// constructed.
    pub fn with_config(config: OsrmConfig) -> Result<Self, TransportBuildError> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> Osrm<T> {
    /// Build a client that dispatches through `transport`.
    pub fn with_transport(config: OsrmConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Request the best route through `points` and map it into a
    /// [`Route`].
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be built, the transport fails, the
    /// service reports a non-`Ok` code, or the response cannot be mapped.
    pub fn directions(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &DirectionsOptions,
    ) -> Result<Route, ProviderError> {
        let request = self.directions_request(points, profile, options)?;
        let body = self.transport.execute(&request)?;
        response::single_route(&body, options.geometries.encoding())
    }

    /// Request a route set through `points`, including any alternatives
    /// the engine found.
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be built, the transport fails, the
    /// service reports a non-`Ok` code, or the response cannot be mapped.
    pub fn directions_alternatives(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &DirectionsOptions,
    ) -> Result<Routes, ProviderError> {
        let request = self.directions_request(points, profile, options)?;
        let body = self.transport.execute(&request)?;
        response::routes(&body, options.geometries.encoding())
    }

    /// Request a travel time and distance matrix over `points` from the
    /// table service.
    ///
    /// # Errors
    ///
    /// Fails when a selection index is out of range, the transport fails,
    /// the service reports a non-`Ok` code, or the response cannot be
    /// mapped.
    pub fn matrix(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &MatrixOptions,
    ) -> Result<Matrix, ProviderError> {
        let request = self.matrix_request(points, profile, options)?;
        let body = self.transport.execute(&request)?;
        response::matrix(&body)
    }

    fn directions_request(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &DirectionsOptions,
    ) -> Result<ApiRequest, ProviderError> {
        let mut pairs = QueryPairs::new();
        if let Some(alternatives) = options.alternatives {
            pairs.push_bool("alternatives", alternatives);
        }
        if let Some(steps) = options.steps {
            pairs.push_bool("steps", steps);
        }
        pairs.push("geometries", options.geometries.as_str());
        if let Some(overview) = options.overview {
            pairs.push("overview", overview.as_str());
        }
        pairs.extend_extras(&options.extras);
        let url = self.service_url("route", profile, points, &pairs)?;
        Ok(ApiRequest::get(url))
    }

    fn matrix_request(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &MatrixOptions,
    ) -> Result<ApiRequest, ProviderError> {
        let selection = resolve_matrix_selection(
            points,
            options.sources.as_deref(),
            options.destinations.as_deref(),
        )?;
        let mut pairs = QueryPairs::new();
        if let MatrixSelection::Restricted {
            sources,
            destinations,
        } = &selection
        {
            // A side the caller left unset falls back to every coordinate
            // engine-side, so it carries no index list.
            if options.sources.is_some() {
                pairs.push("sources", index_list(sources));
            }
            if options.destinations.is_some() {
                pairs.push("destinations", index_list(destinations));
            }
        }
        if !options.annotations.is_empty() {
            let annotations: Vec<&str> = options
                .annotations
                .iter()
                .map(|annotation| annotation.as_str())
                .collect();
            pairs.push("annotations", annotations.join(","));
        }
        pairs.extend_extras(&options.extras);
        let url = self.service_url("table", profile, points, &pairs)?;
        Ok(ApiRequest::get(url))
    }

    fn service_url(
        &self,
        service: &str,
        profile: &str,
        points: &[Coord<f64>],
        pairs: &QueryPairs,
    ) -> Result<Url, ProviderError> {
        let text = format!(
            "{}/{service}/v1/{profile}/{}",
            self.config.base_url.trim_end_matches('/'),
            path_segment(points),
        );
        let mut url = match Url::parse(&text) {
            Ok(url) => url,
            Err(err) => {
                return Err(ProviderError::InvalidUrl {
                    url: text,
                    message: err.to_string(),
                });
            }
        };
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs.iter());
        }
        Ok(url)
    }
}

/// Coordinates rendered into the URL path, longitude first.
fn path_segment(points: &[Coord<f64>]) -> String {
    points
        .iter()
        .map(|point| format!("{},{}", point.x, point.y))
        .collect::<Vec<_>>()
        .join(";")
}

/// Selection indices rendered as a semicolon-separated list.
fn index_list(selected: &[SelectedPoint]) -> String {
    selected
        .iter()
        .map(|point| point.index().to_string())
        .collect::<Vec<_>>()
        .join(";")
}
