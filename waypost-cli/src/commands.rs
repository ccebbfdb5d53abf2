//! Provider-backed subcommand implementations.
//!
//! Each subcommand resolves its arguments through configuration merging,
//! dispatches one request against a GraphHopper deployment, and renders
//! either a human summary or the raw response JSON.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use waypost_core::{IntervalType, IsochroneLimit, Matrix, Route};
use waypost_providers::graphhopper::{
    Algorithm, DirectionsOptions, GraphHopper, GraphHopperConfig, IsochronesOptions, MatrixOptions,
    OutArray,
};
use waypost_providers::transport::Transport;

use crate::{
    ARG_API_KEY, ARG_BASE_URL, ARG_CENTER, ARG_PROFILE, CliError, ENV_DIRECTIONS_API_KEY,
    ENV_ISOCHRONES_API_KEY, ENV_ISOCHRONES_CENTER, ENV_MATRIX_API_KEY,
};

/// Profile used when none is configured.
const DEFAULT_PROFILE: &str = "car";

/// Reach used when neither limit flag is given.
const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(600);

/// CLI arguments for the `directions` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Request a route through the given points. Points are \
                 lat,lng pairs; the API key and base URL can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Route through the given points"
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct DirectionsArgs {
    /// Points to route through, as lat,lng pairs.
    #[arg(value_name = "point", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) points: Vec<String>,
    /// API key sent with every request.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Base URL of the deployment, for self-hosted engines.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Routing profile, e.g. "car" or "bike".
    #[arg(long = ARG_PROFILE, value_name = "name")]
    #[serde(default)]
    pub(crate) profile: Option<String>,
    /// Ask for alternative routes and list them all.
    #[arg(long)]
    #[serde(default)]
    pub(crate) alternatives: bool,
    /// Print the raw provider response instead of a summary.
    #[arg(long)]
    #[serde(default)]
    pub(crate) json: bool,
}

impl DirectionsArgs {
    pub(crate) fn into_config(self) -> Result<DirectionsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DirectionsConfig::try_from(merged)
    }
}

/// Resolved `directions` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct DirectionsConfig {
    pub(crate) points: Vec<Coord<f64>>,
    pub(crate) profile: String,
    pub(crate) provider: GraphHopperConfig,
    pub(crate) alternatives: bool,
    pub(crate) json: bool,
}

impl TryFrom<DirectionsArgs> for DirectionsConfig {
    type Error = CliError;

    fn try_from(args: DirectionsArgs) -> Result<Self, Self::Error> {
        let api_key = args.api_key.ok_or(CliError::MissingArgument {
            field: ARG_API_KEY,
            env: ENV_DIRECTIONS_API_KEY,
        })?;
        let points = parse_points(&args.points, "directions", 2)?;
        Ok(Self {
            points,
            profile: profile_or_default(args.profile),
            provider: provider_config(api_key, args.base_url),
            alternatives: args.alternatives,
            json: args.json,
        })
    }
}

/// CLI arguments for the `isochrones` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Request reachability polygons around a centre point. The \
                 reach is a time limit in seconds or a distance limit in \
                 metres; ten minutes of travel time when neither is given.",
    about = "Compute reachability polygons around a centre"
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct IsochronesArgs {
    /// Centre to compute reachability from, as a lat,lng pair.
    #[arg(value_name = "point", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) center: Option<String>,
    /// API key sent with every request.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Base URL of the deployment, for self-hosted engines.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Routing profile, e.g. "car" or "bike".
    #[arg(long = ARG_PROFILE, value_name = "name")]
    #[serde(default)]
    pub(crate) profile: Option<String>,
    /// Travel time limit in seconds.
    #[arg(long, value_name = "seconds")]
    #[serde(default)]
    pub(crate) time_limit: Option<u64>,
    /// Travel distance limit in metres.
    #[arg(long, value_name = "metres")]
    #[serde(default)]
    pub(crate) distance_limit: Option<u64>,
    /// Number of nested polygons to slice the limit into.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) buckets: Option<u32>,
    /// Compute the area the centre is reachable from instead.
    #[arg(long)]
    #[serde(default)]
    pub(crate) reverse_flow: bool,
    /// Print the raw provider response instead of a summary.
    #[arg(long)]
    #[serde(default)]
    pub(crate) json: bool,
}

impl IsochronesArgs {
    pub(crate) fn into_config(self) -> Result<IsochronesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IsochronesConfig::try_from(merged)
    }
}

/// Resolved `isochrones` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct IsochronesConfig {
    pub(crate) center: Coord<f64>,
    pub(crate) profile: String,
    pub(crate) provider: GraphHopperConfig,
    pub(crate) limit: IsochroneLimit,
    pub(crate) buckets: Option<u32>,
    pub(crate) reverse_flow: bool,
    pub(crate) json: bool,
}

impl TryFrom<IsochronesArgs> for IsochronesConfig {
    type Error = CliError;

    fn try_from(args: IsochronesArgs) -> Result<Self, Self::Error> {
        let api_key = args.api_key.ok_or(CliError::MissingArgument {
            field: ARG_API_KEY,
            env: ENV_ISOCHRONES_API_KEY,
        })?;
        let center = args.center.ok_or(CliError::MissingArgument {
            field: ARG_CENTER,
            env: ENV_ISOCHRONES_CENTER,
        })?;
        Ok(Self {
            center: parse_lat_lon(&center)?,
            profile: profile_or_default(args.profile),
            provider: provider_config(api_key, args.base_url),
            limit: resolve_limit(args.time_limit, args.distance_limit)?,
            buckets: args.buckets,
            reverse_flow: args.reverse_flow,
            json: args.json,
        })
    }
}

/// CLI arguments for the `matrix` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Request travel times and distances between the given \
                 points. Every point is both an origin and a destination \
                 unless --sources or --destinations restricts it.",
    about = "Compute travel time and distance matrices"
)]
#[ortho_config(prefix = "WAYPOST")]
pub(crate) struct MatrixArgs {
    /// Points to measure between, as lat,lng pairs.
    #[arg(value_name = "point", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) points: Vec<String>,
    /// API key sent with every request.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Base URL of the deployment, for self-hosted engines.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Routing profile, e.g. "car" or "bike".
    #[arg(long = ARG_PROFILE, value_name = "name")]
    #[serde(default)]
    pub(crate) profile: Option<String>,
    /// Restrict row origins to these point indices.
    #[arg(long, value_name = "indices", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) sources: Option<Vec<usize>>,
    /// Restrict column destinations to these point indices.
    #[arg(long, value_name = "indices", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) destinations: Option<Vec<usize>>,
    /// Request travel times only.
    #[arg(long)]
    #[serde(default)]
    pub(crate) times: bool,
    /// Request travel distances only.
    #[arg(long)]
    #[serde(default)]
    pub(crate) distances: bool,
    /// Print the raw provider response instead of a summary.
    #[arg(long)]
    #[serde(default)]
    pub(crate) json: bool,
}

impl MatrixArgs {
    pub(crate) fn into_config(self) -> Result<MatrixConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        MatrixConfig::try_from(merged)
    }
}

/// Resolved `matrix` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct MatrixConfig {
    pub(crate) points: Vec<Coord<f64>>,
    pub(crate) profile: String,
    pub(crate) provider: GraphHopperConfig,
    pub(crate) sources: Option<Vec<usize>>,
    pub(crate) destinations: Option<Vec<usize>>,
    pub(crate) out_arrays: Vec<OutArray>,
    pub(crate) json: bool,
}

impl TryFrom<MatrixArgs> for MatrixConfig {
    type Error = CliError;

    fn try_from(args: MatrixArgs) -> Result<Self, Self::Error> {
        let api_key = args.api_key.ok_or(CliError::MissingArgument {
            field: ARG_API_KEY,
            env: ENV_MATRIX_API_KEY,
        })?;
        let points = parse_points(&args.points, "matrix", 2)?;
        Ok(Self {
            points,
            profile: profile_or_default(args.profile),
            provider: provider_config(api_key, args.base_url),
            sources: args.sources,
            destinations: args.destinations,
            out_arrays: resolve_out_arrays(args.times, args.distances),
            json: args.json,
        })
    }
}

pub(super) fn run_directions(args: DirectionsArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let client = build_client(&config.provider)?;
    let mut stdout = std::io::stdout().lock();
    execute_directions(&client, &config, &mut stdout)
}

pub(super) fn run_isochrones(args: IsochronesArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let client = build_client(&config.provider)?;
    let mut stdout = std::io::stdout().lock();
    execute_isochrones(&client, &config, &mut stdout)
}

pub(super) fn run_matrix(args: MatrixArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let client = build_client(&config.provider)?;
    let mut stdout = std::io::stdout().lock();
    execute_matrix(&client, &config, &mut stdout)
}

fn build_client(provider: &GraphHopperConfig) -> Result<GraphHopper, CliError> {
    GraphHopper::with_config(provider.clone()).map_err(|source| CliError::BuildTransport {
        base_url: provider.base_url.clone(),
        source,
    })
}

pub(super) fn execute_directions<T: Transport>(
    client: &GraphHopper<T>,
    config: &DirectionsConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let options = directions_options(config);
    if config.json {
        let routes = client.directions_alternatives(&config.points, &config.profile, &options)?;
        return write_json(writer, routes.raw());
    }
    if config.alternatives {
        let routes = client.directions_alternatives(&config.points, &config.profile, &options)?;
        for (position, route) in routes.routes().iter().enumerate() {
            writeln!(writer, "{}", route_line(Some(position), route))
                .map_err(CliError::WriteOutput)?;
        }
        Ok(())
    } else {
        let route = client.directions(&config.points, &config.profile, &options)?;
        writeln!(writer, "{}", route_line(None, &route)).map_err(CliError::WriteOutput)
    }
}

pub(super) fn execute_isochrones<T: Transport>(
    client: &GraphHopper<T>,
    config: &IsochronesConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let options = IsochronesOptions {
        buckets: config.buckets,
        reverse_flow: config.reverse_flow.then_some(true),
        ..IsochronesOptions::default()
    };
    let isochrones = client.isochrones(config.center, &config.profile, config.limit, &options)?;
    if config.json {
        return write_json(writer, isochrones.raw());
    }
    for (position, isochrone) in isochrones.isochrones().iter().enumerate() {
        writeln!(
            writer,
            "isochrone {}: within {} {} ({} ring points)",
            position + 1,
            isochrone.interval(),
            interval_unit(isochrone.interval_type()),
            isochrone.geometry().len()
        )
        .map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

pub(super) fn execute_matrix<T: Transport>(
    client: &GraphHopper<T>,
    config: &MatrixConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let options = MatrixOptions {
        sources: config.sources.clone(),
        destinations: config.destinations.clone(),
        out_arrays: config.out_arrays.clone(),
        ..MatrixOptions::default()
    };
    let matrix = client.matrix(&config.points, &config.profile, &options)?;
    if config.json {
        return write_json(writer, matrix.raw());
    }
    write_matrix_summary(writer, &matrix)
}

fn directions_options(config: &DirectionsConfig) -> DirectionsOptions {
    DirectionsOptions {
        algorithm: config.alternatives.then(|| Algorithm::AlternativeRoute {
            max_paths: None,
            max_weight_factor: None,
            max_share_factor: None,
        }),
        ..DirectionsOptions::default()
    }
}

fn provider_config(api_key: String, base_url: Option<String>) -> GraphHopperConfig {
    let config = GraphHopperConfig::default().with_api_key(api_key);
    match base_url {
        Some(url) => config.with_base_url(url),
        None => config,
    }
}

fn profile_or_default(profile: Option<String>) -> String {
    profile.unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

fn resolve_limit(
    time_limit: Option<u64>,
    distance_limit: Option<u64>,
) -> Result<IsochroneLimit, CliError> {
    match (time_limit, distance_limit) {
        (Some(_), Some(_)) => Err(CliError::ConflictingLimits),
        (Some(seconds), None) => Ok(IsochroneLimit::Time(Duration::from_secs(seconds))),
        (None, Some(metres)) => Ok(IsochroneLimit::Distance(metres)),
        (None, None) => Ok(IsochroneLimit::Time(DEFAULT_TIME_LIMIT)),
    }
}

fn resolve_out_arrays(times: bool, distances: bool) -> Vec<OutArray> {
    match (times, distances) {
        // Both arrays unless a flag narrows the request.
        (false, false) | (true, true) => vec![OutArray::Times, OutArray::Distances],
        (true, false) => vec![OutArray::Times],
        (false, true) => vec![OutArray::Distances],
    }
}

/// Parse a `lat,lng` argument into a coordinate.
pub(crate) fn parse_lat_lon(text: &str) -> Result<Coord<f64>, CliError> {
    let invalid = || CliError::InvalidPoint {
        text: text.to_string(),
    };
    let (lat, lng) = text.split_once(',').ok_or_else(invalid)?;
    let y: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let x: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Ok(Coord { x, y })
}

fn parse_points(
    texts: &[String],
    command: &'static str,
    needed: usize,
) -> Result<Vec<Coord<f64>>, CliError> {
    if texts.len() < needed {
        return Err(CliError::TooFewPoints {
            command,
            needed,
            got: texts.len(),
        });
    }
    texts.iter().map(|text| parse_lat_lon(text)).collect()
}

fn route_line(position: Option<usize>, route: &Route) -> String {
    let label = match position {
        Some(index) => format!("route {}", index + 1),
        None => "route".to_string(),
    };
    format!(
        "{label}: {} m in {} s ({} points)",
        route.distance(),
        route.duration().as_secs(),
        route.geometry().len()
    )
}

const fn interval_unit(interval_type: IntervalType) -> &'static str {
    match interval_type {
        IntervalType::Time => "s",
        IntervalType::Distance => "m",
    }
}

fn write_matrix_summary(writer: &mut dyn Write, matrix: &Matrix) -> Result<(), CliError> {
    write_matrix_rows(writer, "durations (s)", matrix.durations(), |duration| {
        duration.as_secs().to_string()
    })?;
    write_matrix_rows(writer, "distances (m)", matrix.distances(), |metres| {
        metres.to_string()
    })
}

fn write_matrix_rows<T: Copy>(
    writer: &mut dyn Write,
    heading: &str,
    rows: &[Vec<Option<T>>],
    render: impl Fn(T) -> String,
) -> Result<(), CliError> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(writer, "{heading}:").map_err(CliError::WriteOutput)?;
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.map_or_else(|| "-".to_string(), &render))
            .collect();
        writeln!(writer, "  {}", cells.join(" ")).map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

fn write_json(writer: &mut dyn Write, raw: &Value) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(raw).map_err(CliError::SerialiseResponse)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn directions_config_from_layers(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<DirectionsConfig, CliError> {
    let merged = DirectionsArgs::merge_from_layers(layers).map_err(CliError::from)?;
    DirectionsConfig::try_from(merged)
}
