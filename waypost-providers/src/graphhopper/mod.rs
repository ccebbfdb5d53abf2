//! Client for the GraphHopper directions, isochrone, and matrix APIs.
//!
//! Directions are requested with a JSON `POST` to `/route`; isochrones and
//! matrices with `GET` requests carrying flat, repeated query parameters.
//! Responses are mapped into the typed entities from `waypost-core` with
//! the untouched body attached as [`Route::raw`](waypost_core::Route::raw)
//! and friends.
//!
//! ```no_run
//! use geo::Coord;
//! use waypost_providers::graphhopper::{DirectionsOptions, GraphHopper};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphHopper::new("my-api-key")?;
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
use waypost_core::params::{format_lat_lon, lon_lat_array, resolve_matrix_selection};
use waypost_core::{
    IsochroneLimit, Isochrones, Matrix, MatrixSelection, QueryPairs, Route, Routes,
};

use crate::error::ProviderError;
use crate::geometry::GeometryEncoding;
use crate::transport::{ApiRequest, HttpTransport, Transport, TransportBuildError};

mod response;

/// Hosted GraphHopper endpoint.
const DEFAULT_BASE_URL: &str = "https://graphhopper.com/api/1";

/// Geometry precision the route endpoint encodes polylines with.
const POLYLINE_PRECISION: u32 = 5;

/// Configuration for [`GraphHopper`].
#[derive(Debug, Clone)]
pub struct GraphHopperConfig {
    /// Base URL of the GraphHopper deployment, without a trailing service
    /// path.
    pub base_url: String,
    /// API key appended to every request. Self-hosted deployments usually
    /// run without one.
    pub api_key: Option<String>,
}

impl Default for GraphHopperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl GraphHopperConfig {
    /// Replace the base URL, for self-hosted deployments.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Routing algorithm selection for directions requests.
///
/// Rendered into the request body as an `algorithm` member plus the
/// dotted parameters the engine expects for that algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    /// Ask for alternatives alongside the best route.
    AlternativeRoute {
        /// Upper bound on the number of paths returned.
        max_paths: Option<u32>,
        /// Worst acceptable weight relative to the best path.
        max_weight_factor: Option<f64>,
        /// Largest share a returned path may have in common with the best
        /// path.
        max_share_factor: Option<f64>,
    },
    /// Ask for a loop that starts and ends at the first point.
    RoundTrip {
        /// Target length of the loop in metres.
        distance: Option<u64>,
        /// Seed for the engine's loop generation.
        seed: Option<u64>,
    },
}

/// Options for [`GraphHopper::directions`] beyond the points and profile.
#[derive(Debug, Clone)]
pub struct DirectionsOptions {
    /// Let the engine reorder intermediate points into a shorter route.
    pub optimize: Option<bool>,
    /// Include turn-by-turn instructions in the response.
    pub instructions: Option<bool>,
    /// Locale for instruction text.
    pub locale: Option<String>,
    /// Route with elevation data and interleave it into the geometry.
    pub elevation: Option<bool>,
    /// Whether response geometry arrives polyline-encoded. Sent on every
    /// request; the decoder keys off the same flag.
    pub points_encoded: bool,
    /// Whether the response should carry geometry at all.
    pub calc_points: Option<bool>,
    /// Ask the engine to echo debugging detail.
    pub debug: Option<bool>,
    /// Algorithm selection for alternatives or round trips.
    pub algorithm: Option<Algorithm>,
    /// Extra body members passed through verbatim.
    pub extras: Map<String, Value>,
}

impl Default for DirectionsOptions {
    fn default() -> Self {
        Self {
            optimize: None,
            instructions: None,
            locale: None,
            elevation: None,
            points_encoded: true,
            calc_points: None,
            debug: None,
            algorithm: None,
            extras: Map::new(),
        }
    }
}

impl DirectionsOptions {
    /// The geometry encoding this request negotiates with the engine.
    fn encoding(&self) -> GeometryEncoding {
        if self.points_encoded {
            GeometryEncoding::Polyline {
                precision: POLYLINE_PRECISION,
                elevation: self.elevation.unwrap_or(false),
            }
        } else {
            GeometryEncoding::GeoJson
        }
    }
}

/// Options for [`GraphHopper::isochrones`] beyond the centre, profile, and
/// limit.
#[derive(Debug, Clone, Default)]
pub struct IsochronesOptions {
    /// Number of nested isochrones to slice the limit into.
    pub buckets: Option<u32>,
    /// Compute the area the centre is reachable from instead of the area
    /// reachable from the centre.
    pub reverse_flow: Option<bool>,
    /// Ask the engine to echo debugging detail.
    pub debug: Option<bool>,
    /// Extra query parameters passed through verbatim.
    pub extras: Map<String, Value>,
}

/// Result arrays a matrix request can ask the engine to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutArray {
    /// Travel times in seconds.
    Times,
    /// Travel distances in metres.
    Distances,
    /// Internal routing weights.
    Weights,
}

impl OutArray {
    /// Wire name of the array.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Times => "times",
            Self::Distances => "distances",
            Self::Weights => "weights",
        }
    }
}

/// Options for [`GraphHopper::matrix`] beyond the points and profile.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    /// Indices into the point list acting as row origins. `None` keeps
    /// every point as an origin.
    pub sources: Option<Vec<usize>>,
    /// Indices into the point list acting as column destinations. `None`
    /// keeps every point as a destination.
    pub destinations: Option<Vec<usize>>,
    /// Which result arrays the engine should compute.
    pub out_arrays: Vec<OutArray>,
    /// Ask the engine to echo debugging detail.
    pub debug: Option<bool>,
    /// Extra query parameters passed through verbatim.
    pub extras: Map<String, Value>,
}

/// Client for a GraphHopper deployment.
///
/// Generic over the [`Transport`] so tests can substitute a recording
/// double; production code uses the [`HttpTransport`] default.
#[derive(Debug)]
pub struct GraphHopper<T = HttpTransport> {
    config: GraphHopperConfig,
    transport: T,
}

impl GraphHopper<HttpTransport> {
    /// Build a client for the hosted API.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client or its runtime cannot be
    /// constructed.
    pub fn new(api_key: impl Into<String>) -> Result<Self, TransportBuildError> {
        Self::with_config(GraphHopperConfig::default().with_api_key(api_key))
    }

    /// Build a client for `config` using the default HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client or its runtime cannot be
    /// constructed.
    pub fn with_config(config: GraphHopperConfig) -> Result<Self, TransportBuildError> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> GraphHopper<T> {
    /// Build a client that dispatches through `transport`.
    pub fn with_transport(config: GraphHopperConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Request the best route through `points` and map it into a
    /// [`Route`].
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be built, the transport fails, or
    /// the response cannot be mapped.
    pub fn directions(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &DirectionsOptions,
    ) -> Result<Route, ProviderError> {
        let request = self.directions_request(points, profile, options)?;
        let body = self.transport.execute(&request)?;
        response::single_route(&body, options.encoding())
    }

    /// Request a route set through `points`, including any alternatives
    /// the algorithm produced.
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be built, the transport fails, or
    /// the response cannot be mapped.
    pub fn directions_alternatives(
        &self,
        points: &[Coord<f64>],
        profile: &str,
        options: &DirectionsOptions,
    ) -> Result<Routes, ProviderError> {
        let request = self.directions_request(points, profile, options)?;
        let body = self.transport.execute(&request)?;
        response::routes(&body, options.encoding())
    }

    /// Request isochrones around `center` and map them into
    /// [`Isochrones`].
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be built, the transport fails, or
    /// the response cannot be mapped.
    pub fn isochrones(
        &self,
        center: Coord<f64>,
        profile: &str,
        limit: IsochroneLimit,
        options: &IsochronesOptions,
    ) -> Result<Isochrones, ProviderError> {
        let request = self.isochrones_request(center, profile, limit, options)?;
        let body = self.transport.execute(&request)?;
        response::isochrones(&body, limit, options.buckets.unwrap_or(1), center)
    }

    /// Request a travel time and distance matrix over `points`.
    ///
    /// # Errors
    ///
    /// Fails when a selection index is out of range, the transport fails,
    /// or the response cannot be mapped.
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
        self.push_key(&mut pairs);
        let url = self.service_url("route", &pairs)?;
        Ok(ApiRequest::post(url, directions_body(points, profile, options)))
    }

    fn isochrones_request(
        &self,
        center: Coord<f64>,
        profile: &str,
        limit: IsochroneLimit,
        options: &IsochronesOptions,
    ) -> Result<ApiRequest, ProviderError> {
        let mut pairs = QueryPairs::new();
        pairs.push("point", format_lat_lon(center));
        pairs.push("profile", profile);
        match limit {
            IsochroneLimit::Time(duration) => {
                pairs.push("time_limit", duration.as_secs().to_string());
            }
            IsochroneLimit::Distance(metres) => {
                pairs.push("distance_limit", metres.to_string());
            }
        }
        if let Some(buckets) = options.buckets {
            pairs.push("buckets", buckets.to_string());
        }
        if let Some(reverse_flow) = options.reverse_flow {
            pairs.push_bool("reverse_flow", reverse_flow);
        }
        if let Some(debug) = options.debug {
            pairs.push_bool("debug", debug);
        }
        pairs.push("type", "json");
        pairs.extend_extras(&options.extras);
        self.push_key(&mut pairs);
        Ok(ApiRequest::get(self.service_url("isochrone", &pairs)?))
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
        match &selection {
            MatrixSelection::Full => {
                for point in points {
                    pairs.push("point", format_lat_lon(*point));
                }
            }
            MatrixSelection::Restricted {
                sources,
                destinations,
            } => {
                for source in sources {
                    pairs.push("from_point", format_lat_lon(source.coord()));
                }
                for destination in destinations {
                    pairs.push("to_point", format_lat_lon(destination.coord()));
                }
            }
        }
        pairs.push("profile", profile);
        pairs.push_repeated(
            "out_array",
            options.out_arrays.iter().map(|out_array| out_array.as_str()),
        );
        if let Some(debug) = options.debug {
            pairs.push_bool("debug", debug);
        }
        pairs.extend_extras(&options.extras);
        self.push_key(&mut pairs);
        Ok(ApiRequest::get(self.service_url("matrix", &pairs)?))
    }

    fn push_key(&self, pairs: &mut QueryPairs) {
        if let Some(api_key) = &self.config.api_key {
            pairs.push("key", api_key.as_str());
        }
    }

    fn service_url(&self, service: &str, pairs: &QueryPairs) -> Result<Url, ProviderError> {
        let text = format!("{}/{service}", self.config.base_url.trim_end_matches('/'));
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

fn directions_body(points: &[Coord<f64>], profile: &str, options: &DirectionsOptions) -> Value {
    let mut body = Map::new();
    body.insert(
        "points".to_string(),
        Value::Array(points.iter().map(|point| lon_lat_array(*point)).collect()),
    );
    body.insert("profile".to_string(), Value::from(profile));
    body.insert(
        "points_encoded".to_string(),
        Value::from(options.points_encoded),
    );
    if let Some(optimize) = options.optimize {
        // The route endpoint wants optimize as a string, not a boolean.
        body.insert(
            "optimize".to_string(),
            Value::from(if optimize { "true" } else { "false" }),
        );
    }
    if let Some(instructions) = options.instructions {
        body.insert("instructions".to_string(), Value::from(instructions));
    }
    if let Some(locale) = &options.locale {
        body.insert("locale".to_string(), Value::from(locale.as_str()));
    }
    if let Some(elevation) = options.elevation {
        body.insert("elevation".to_string(), Value::from(elevation));
    }
    if let Some(calc_points) = options.calc_points {
        body.insert("calc_points".to_string(), Value::from(calc_points));
    }
    if let Some(debug) = options.debug {
        body.insert("debug".to_string(), Value::from(debug));
    }
    if let Some(algorithm) = &options.algorithm {
        apply_algorithm(&mut body, algorithm);
    }
    for (key, value) in &options.extras {
        body.insert(key.clone(), value.clone());
    }
    Value::Object(body)
}

fn apply_algorithm(body: &mut Map<String, Value>, algorithm: &Algorithm) {
    match algorithm {
        Algorithm::AlternativeRoute {
            max_paths,
            max_weight_factor,
            max_share_factor,
        } => {
            body.insert("algorithm".to_string(), Value::from("alternative_route"));
            if let Some(max_paths) = max_paths {
                body.insert(
                    "alternative_route.max_paths".to_string(),
                    Value::from(*max_paths),
                );
            }
            if let Some(max_weight_factor) = max_weight_factor {
                body.insert(
                    "alternative_route.max_weight_factor".to_string(),
                    Value::from(*max_weight_factor),
                );
            }
            if let Some(max_share_factor) = max_share_factor {
                body.insert(
                    "alternative_route.max_share_factor".to_string(),
                    Value::from(*max_share_factor),
                );
            }
        }
        Algorithm::RoundTrip { distance, seed } => {
            body.insert("algorithm".to_string(), Value::from("round_trip"));
            if let Some(distance) = distance {
                body.insert("round_trip.distance".to_string(), Value::from(*distance));
            }
            if let Some(seed) = seed {
                body.insert("round_trip.seed".to_string(), Value::from(*seed));
            }
        }
    }
}
