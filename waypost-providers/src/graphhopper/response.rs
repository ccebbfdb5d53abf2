//! Mapping from GraphHopper response bodies into core entities.
//!
//! Bodies are kept as [`Value`] so the untouched JSON can ride along as
//! the `raw` view; typed payload structs are deserialized from clones of
//! the fragments the typed view needs.

use std::time::Duration;

use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use waypost_core::{Isochrone, IsochroneLimit, Isochrones, Matrix, Route, Routes};

use crate::cells::{distance_rows, duration_rows};
use crate::error::ProviderError;
use crate::geometry::{GeometryEncoding, GeometryPayload, decode_geometry, position_coord};

/// One entry of the `paths` array.
#[derive(Debug, Deserialize)]
struct PathPayload {
    /// Absent when the request set `calc_points` to false.
    points: Option<GeometryPayload>,
    /// Travel time in milliseconds.
    time: f64,
    /// Travel distance in metres.
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct IsochroneResponse {
    polygons: Vec<PolygonPayload>,
}

#[derive(Debug, Deserialize)]
struct PolygonPayload {
    geometry: PolygonGeometry,
}

#[derive(Debug, Deserialize)]
struct PolygonGeometry {
    /// Rings of `[lng, lat(, ele)]` positions, outer ring first.
    coordinates: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    times: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

/// Map a directions body into its best route.
pub(super) fn single_route(
    body: &Value,
    encoding: GeometryEncoding,
) -> Result<Route, ProviderError> {
    routes(body, encoding)?
        .into_inner()
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse { expected: "paths" })
}

/// Map a directions body into the full route set.
pub(super) fn routes(body: &Value, encoding: GeometryEncoding) -> Result<Routes, ProviderError> {
    let paths = body
        .get("paths")
        .and_then(Value::as_array)
        .ok_or_else(|| decode_error("response missing a paths array"))?;
    if paths.is_empty() {
        return Err(ProviderError::EmptyResponse { expected: "paths" });
    }
    let mapped = paths
        .iter()
        .map(|fragment| route(fragment, encoding))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Routes::new(mapped, body.clone()))
}

fn route(fragment: &Value, encoding: GeometryEncoding) -> Result<Route, ProviderError> {
    let payload: PathPayload = serde_json::from_value(fragment.clone())
        .map_err(|err| decode_error(format!("malformed path entry: {err}")))?;
    let geometry = match &payload.points {
        Some(points) => decode_geometry(points, encoding)?,
        None => Vec::new(),
    };
    Ok(Route::new(
        geometry,
        seconds_from_millis(payload.time),
        whole_metres(payload.distance),
        fragment.clone(),
    ))
}

/// Map an isochrone body, deriving each bucket's interval share.
pub(super) fn isochrones(
    body: &Value,
    limit: IsochroneLimit,
    buckets: u32,
    center: Coord<f64>,
) -> Result<Isochrones, ProviderError> {
    let payload: IsochroneResponse = serde_json::from_value(body.clone())
        .map_err(|err| decode_error(format!("malformed isochrone response: {err}")))?;
    let mapped = payload
        .polygons
        .into_iter()
        .enumerate()
        .map(|(index, polygon)| {
            let outer = polygon
                .geometry
                .coordinates
                .into_iter()
                .next()
                .ok_or_else(|| decode_error("isochrone polygon carries no rings"))?;
            let geometry = outer
                .iter()
                .map(|position| position_coord(position))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Isochrone::new(
                geometry,
                bucket_interval(limit.magnitude(), index, buckets),
                limit.interval_type(),
                center,
            ))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;
    Ok(Isochrones::new(mapped, body.clone()))
}

/// Map a matrix body, preserving unroutable cells as `None`.
pub(super) fn matrix(body: &Value) -> Result<Matrix, ProviderError> {
    let payload: MatrixResponse = serde_json::from_value(body.clone())
        .map_err(|err| decode_error(format!("malformed matrix response: {err}")))?;
    let durations = payload.times.map(duration_rows).unwrap_or_default();
    let distances = payload.distances.map(distance_rows).unwrap_or_default();
    Ok(Matrix::new(durations, distances, body.clone()))
}

fn decode_error(message: impl Into<String>) -> ProviderError {
    ProviderError::Decode {
        message: message.into(),
    }
}

/// Truncate a millisecond reading to a whole-second duration.
fn seconds_from_millis(millis: f64) -> Duration {
    Duration::from_secs((millis / 1_000.0) as u64)
}

/// Truncate a metre reading to whole metres.
fn whole_metres(metres: f64) -> u64 {
    metres as u64
}

/// Share of the limit covered by the bucket at `index`.
fn bucket_interval(magnitude: u64, index: usize, buckets: u32) -> u64 {
    let step = index as u64 + 1;
    magnitude.saturating_mul(step) / u64::from(buckets.max(1))
}
